//! DAG arena (spec.md §4.4, §9 "Shared-but-cyclic-looking ownership").
//!
//! The allocation tree is an arena of nodes indexed by integer ID rather than
//! raw/weak pointers, so parent, child, and (later) `next`-execution links
//! are all plain `NodeId -> NodeId` relationships with no ownership cycles.

use crate::error::{CoreError, Result};
use crate::format::BufferFormat;
use crate::parser::ParsedFeature;
use crate::registry::Registry;
use crate::transform::TransformInstance;

pub type NodeId = usize;

pub enum NodeKind {
    /// The synthetic root: matches the raw PCM buffer format handed to
    /// `compile` (spec.md §4.4 step 1). Has no transform of its own.
    Root { format: Option<BufferFormat> },
    Transform(TransformInstance),
}

pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
    /// Feature names for which this node is the tagged leaf (spec.md §4.4:
    /// "the same node may be the leaf of multiple features").
    pub feature_tags: Vec<String>,
}

impl Node {
    pub fn name(&self) -> &str {
        match &self.kind {
            NodeKind::Root { .. } => "<root>",
            NodeKind::Transform(instance) => &instance.name,
        }
    }

    pub fn output_format(&self) -> Option<&BufferFormat> {
        match &self.kind {
            NodeKind::Root { format } => format.as_ref(),
            NodeKind::Transform(instance) => instance.output_format.as_ref(),
        }
    }

    /// Byte size of this node's arena slot: its resolved output format,
    /// rounded up to the SIMD alignment (spec.md §3).
    pub fn size(&self) -> usize {
        self.output_format()
            .expect("node size queried before format resolution")
            .aligned_byte_size()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// An arena of [`Node`]s forming the compiled pipeline's DAG.
pub struct Graph {
    nodes: Vec<Node>,
    pub root: NodeId,
}

impl Graph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn ids(&self) -> std::ops::Range<NodeId> {
        0..self.nodes.len()
    }

    /// Inserts `converter`'s node between `parent_id` and `child_id`,
    /// preserving `child_id`'s position among `parent_id`'s children
    /// (spec.md §4.4 step 2: automatic format-converter insertion).
    pub(crate) fn splice_converter(&mut self, parent_id: NodeId, child_id: NodeId, converter: TransformInstance) -> NodeId {
        let converter_id = self.nodes.len();
        self.nodes.push(Node {
            parent: Some(parent_id),
            children: vec![child_id],
            kind: NodeKind::Transform(converter),
            feature_tags: Vec::new(),
        });

        let siblings = &mut self.nodes[parent_id].children;
        let slot = siblings
            .iter()
            .position(|&id| id == child_id)
            .expect("child_id must be a child of parent_id");
        siblings[slot] = converter_id;

        self.nodes[child_id].parent = Some(converter_id);
        converter_id
    }
}

/// Builds a [`Graph`] from a batch of parsed feature specs via the
/// prefix-sharing merge rule (spec.md §4.4).
pub struct GraphBuilder<'a> {
    registry: &'a Registry,
    graph: Graph,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            kind: NodeKind::Root { format: None },
            feature_tags: Vec::new(),
        };
        Self {
            registry,
            graph: Graph {
                nodes: vec![root],
                root: 0,
            },
        }
    }

    /// Merges one parsed feature chain into the DAG, sharing the longest
    /// common prefix with chains already merged.
    pub fn add_feature(&mut self, feature: &ParsedFeature) -> Result<()> {
        if feature.chain.is_empty() {
            return Err(CoreError::CorruptedTree {
                reason: format!("feature `{}` has an empty transform chain", feature.name),
            });
        }

        let mut current = self.graph.root;
        for step in &feature.chain {
            let normalized = self.registry.normalize_params(&step.name, &step.params)?;

            let existing = self.graph.nodes[current].children.iter().copied().find(|&child_id| {
                match &self.graph.nodes[child_id].kind {
                    NodeKind::Transform(instance) => instance.identity() == (step.name.as_str(), &normalized),
                    NodeKind::Root { .. } => false,
                }
            });

            current = match existing {
                Some(id) => id,
                None => {
                    let instance = self.registry.instantiate(&step.name, &step.params)?;
                    let id = self.graph.nodes.len();
                    self.graph.nodes.push(Node {
                        parent: Some(current),
                        children: Vec::new(),
                        kind: NodeKind::Transform(instance),
                        feature_tags: Vec::new(),
                    });
                    self.graph.nodes[current].children.push(id);
                    id
                }
            };
        }

        self.graph.nodes[current].feature_tags.push(feature.name.clone());
        Ok(())
    }

    pub fn build(self) -> Graph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    #[test]
    fn single_feature_builds_a_chain() {
        let registry = Registry::new();
        let feature = parser::parse("A[Window(length=32), RDFT]", &registry).unwrap();
        let mut builder = GraphBuilder::new(&registry);
        builder.add_feature(&feature).unwrap();
        let graph = builder.build();

        assert_eq!(graph.len(), 3); // root, Window, RDFT
        assert_eq!(graph.node(graph.root).children.len(), 1);
    }

    #[test]
    fn identical_prefixes_share_nodes() {
        let registry = Registry::new();
        let a = parser::parse("A[Window(length=32), RDFT, Energy]", &registry).unwrap();
        let b = parser::parse("B[Window(length=32), RDFT, Square]", &registry).unwrap();
        let mut builder = GraphBuilder::new(&registry);
        builder.add_feature(&a).unwrap();
        builder.add_feature(&b).unwrap();
        let graph = builder.build();

        // root -> Window -> RDFT -> {Energy, Square}
        assert_eq!(graph.len(), 5);
        let window_id = graph.node(graph.root).children[0];
        assert_eq!(graph.node(window_id).children.len(), 1);
        let rdft_id = graph.node(window_id).children[0];
        assert_eq!(graph.node(rdft_id).children.len(), 2);
    }

    #[test]
    fn differing_params_do_not_share() {
        let registry = Registry::new();
        let a = parser::parse("A[Window(length=25)]", &registry).unwrap();
        let b = parser::parse("B[Window(length=50)]", &registry).unwrap();
        let mut builder = GraphBuilder::new(&registry);
        builder.add_feature(&a).unwrap();
        builder.add_feature(&b).unwrap();
        let graph = builder.build();

        assert_eq!(graph.node(graph.root).children.len(), 2);
    }
}
