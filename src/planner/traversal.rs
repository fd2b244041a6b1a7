//! Traversal enumeration (spec.md §4.5 steps 1-3: Simplify, Leaf-merge,
//! Enumerate traversals).
//!
//! A traversal is one depth-first linearization of every node in the DAG.
//! At a branching node, permuting the visit order of its children produces a
//! different traversal; we explore a budget-capped set of these and let the
//! packer (spec.md §4.5 step 5) score each one.

use crate::graph::NodeId;
use crate::planner::topology::Topology;

/// Debug-build traversal cap named in spec.md §9's open question. The
/// original source applies this cap only in debug builds and leaves release
/// builds unbounded; we apply it unconditionally since an unbounded
/// combinatorial search has no place in a library that must return in
/// bounded time regardless of build profile.
pub const DEFAULT_TRAVERSAL_CAP: usize = 50_000;

/// Follows a maximal run of single-child nodes starting at `start`
/// (spec.md §4.5 step 1: "Simplify"). Returns the chain (in order, `start`
/// included) and the node at which the chain ends — either a leaf or a node
/// with two or more children.
fn expand_chain(topology: &Topology, start: NodeId) -> (Vec<NodeId>, NodeId) {
    let mut chain = vec![start];
    let mut current = start;
    loop {
        let children = topology.children(current);
        if children.len() == 1 {
            current = children[0];
            chain.push(current);
        } else {
            break;
        }
    }
    (chain, current)
}

/// Every permutation of `items`, smallest index moving fastest.
fn permutations(items: &[NodeId]) -> Vec<Vec<NodeId>> {
    if items.is_empty() {
        return vec![Vec::new()];
    }
    let mut result = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let picked = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, picked);
            result.push(tail);
        }
    }
    result
}

/// Returns every traversal of the subtree rooted at `node_id`, subject to
/// `budget` (decremented once per complete traversal produced; enumeration
/// stops early once it hits zero).
fn subtree_orderings(topology: &Topology, node_id: NodeId, budget: &mut usize) -> Vec<Vec<NodeId>> {
    let (chain, end) = expand_chain(topology, node_id);
    if *budget == 0 {
        return vec![chain];
    }

    let children = topology.children(end).to_vec();
    if children.is_empty() {
        return vec![chain];
    }

    // Leaf-merge (spec.md §4.5 step 2): a group of children that are all
    // leaves contributes one fixed ordering, not k! of them.
    let all_leaves = children.iter().all(|&c| topology.is_leaf(c));
    let child_orders: Vec<Vec<NodeId>> = if all_leaves {
        vec![children.clone()]
    } else {
        permutations(&children)
    };

    let child_variants: Vec<Vec<Vec<NodeId>>> = children
        .iter()
        .map(|&c| subtree_orderings(topology, c, budget))
        .collect();

    let mut results = Vec::new();
    for order in &child_orders {
        if *budget == 0 {
            break;
        }
        let indices: Vec<usize> = order
            .iter()
            .map(|&child_id| children.iter().position(|&c| c == child_id).unwrap())
            .collect();
        combine(&child_variants, &indices, &chain, &mut results, budget);
    }

    if results.is_empty() {
        // Budget exhausted before any combination completed; fall back to
        // the first available variant per child so callers always get at
        // least one valid (if unexplored) traversal.
        let mut full = chain.clone();
        for variants in &child_variants {
            full.extend(variants[0].iter().copied());
        }
        results.push(full);
    }

    results
}

fn combine(
    child_variants: &[Vec<Vec<NodeId>>],
    order: &[usize],
    chain: &[NodeId],
    results: &mut Vec<Vec<NodeId>>,
    budget: &mut usize,
) {
    fn rec(
        i: usize,
        order: &[usize],
        child_variants: &[Vec<Vec<NodeId>>],
        acc: &mut Vec<NodeId>,
        results: &mut Vec<Vec<NodeId>>,
        budget: &mut usize,
    ) {
        if *budget == 0 {
            return;
        }
        if i == order.len() {
            results.push(acc.clone());
            *budget -= 1;
            return;
        }
        for variant in &child_variants[order[i]] {
            if *budget == 0 {
                return;
            }
            let mark = acc.len();
            acc.extend(variant.iter().copied());
            rec(i + 1, order, child_variants, acc, results, budget);
            acc.truncate(mark);
        }
    }

    let mut acc = chain.to_vec();
    rec(0, order, child_variants, &mut acc, results, budget);
}

/// Enumerates up to `cap` full traversals of `topology`, starting at its
/// root.
pub fn enumerate(topology: &Topology, cap: usize) -> Vec<Vec<NodeId>> {
    let mut budget = cap.max(1);
    subtree_orderings(topology, topology.root, &mut budget)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::registry::Registry;

    #[test]
    fn single_chain_has_exactly_one_traversal() {
        let registry = Registry::new();
        let feature = crate::parser::parse("A[Window(length=32), RDFT]", &registry).unwrap();
        let mut builder = GraphBuilder::new(&registry);
        builder.add_feature(&feature).unwrap();
        let graph = builder.build();
        let pcm = crate::format::BufferFormat::new(crate::format::ElementKind::Int16, 1)
            .with_sampling_rate(16_000)
            .with_element_array_length(48_000);
        let mut graph = graph;
        crate::resolve::resolve(&mut graph, &registry, pcm).unwrap();
        let topology = Topology::from_graph(&graph);

        let traversals = enumerate(&topology, DEFAULT_TRAVERSAL_CAP);
        assert_eq!(traversals.len(), 1);
        assert_eq!(traversals[0].len(), topology.len());
    }

    #[test]
    fn all_leaf_sibling_group_is_not_permuted() {
        let topology = Topology::from_parents(
            &[None, Some(0), Some(1), Some(1), Some(1)],
            &[4, 4, 1, 1, 1],
        );
        let traversals = enumerate(&topology, DEFAULT_TRAVERSAL_CAP);
        assert_eq!(traversals.len(), 1, "all-leaf sibling group must not be permuted");
    }

    #[test]
    fn branching_non_leaf_children_are_permuted() {
        // root -> branch -> {a -> leaf, b -> leaf}, where a and b are NOT
        // themselves leaves (they each have one child), so permutation
        // across {a, b} is expected: 2! = 2 traversals.
        let topology = Topology::from_parents(
            &[None, Some(0), Some(1), Some(1), Some(2), Some(3)],
            &[1, 1, 1, 1, 1, 1],
        );
        let traversals = enumerate(&topology, DEFAULT_TRAVERSAL_CAP);
        assert_eq!(traversals.len(), 2);
    }
}
