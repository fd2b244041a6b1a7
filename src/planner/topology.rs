//! A plain, size-and-children view of a DAG — the only shape the packing
//! algorithm actually needs. Decoupling it from [`crate::graph::Graph`] lets
//! the algorithm be exercised directly against the literal synthetic trees
//! spec.md §8 describes (S1, S2), independent of buffer formats or SIMD
//! alignment.

use crate::graph::{Graph, NodeId};

pub struct Topology {
    pub root: NodeId,
    children: Vec<Vec<NodeId>>,
    sizes: Vec<usize>,
}

impl Topology {
    pub fn from_graph(graph: &Graph) -> Self {
        Self {
            root: graph.root,
            children: graph.ids().map(|id| graph.node(id).children.clone()).collect(),
            sizes: graph.ids().map(|id| graph.node(id).size()).collect(),
        }
    }

    /// Builds a topology directly from a parent list and a size list, for
    /// tests that reproduce spec.md's literal synthetic trees. `parents[i]`
    /// is `i`'s parent index, or `None` for the root.
    #[cfg(test)]
    pub fn from_parents(parents: &[Option<NodeId>], sizes: &[usize]) -> Self {
        let mut children = vec![Vec::new(); parents.len()];
        let mut root = 0;
        for (id, parent) in parents.iter().enumerate() {
            match parent {
                Some(p) => children[*p].push(id),
                None => root = id,
            }
        }
        Self {
            root,
            children,
            sizes: sizes.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.children[id]
    }

    pub fn size(&self, id: NodeId) -> usize {
        self.sizes[id]
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.children[id].is_empty()
    }

    pub fn ids(&self) -> std::ops::Range<NodeId> {
        0..self.sizes.len()
    }
}
