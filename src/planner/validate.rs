//! The Validator: an independent correctness oracle for a planned arena
//! (spec.md §4.5 "Correctness contract").

use crate::planner::packing::PlannedArena;
use crate::planner::topology::Topology;

/// Checks contract items (a)-(d). Returns `Err(reason)` naming the first
/// violation found.
pub fn validate(topology: &Topology, arena: &PlannedArena) -> Result<(), String> {
    let n = topology.len();

    // (d) the `next`-order linked list covers every node exactly once.
    if arena.next.len() != n {
        return Err(format!(
            "next-order has {} entries but the graph has {n} nodes",
            arena.next.len()
        ));
    }
    let mut seen = vec![false; n];
    for &id in &arena.next {
        if seen[id] {
            return Err(format!("next-order visits node {id} more than once"));
        }
        seen[id] = true;
    }
    if let Some(missing) = seen.iter().position(|&s| !s) {
        return Err(format!("next-order omits node {missing}"));
    }

    // (a) every node has an initialized offset.
    for id in topology.ids() {
        if arena.offsets[id] == usize::MAX {
            return Err(format!("node {id} has an uninitialized offset"));
        }
    }

    // (b) and (c): any two nodes whose lifetimes overlap must occupy
    // disjoint byte ranges. A node's lifetime in traversal-index space is
    // exactly the [x, end) window the packer used to place it, so recompute
    // it the same way and check every pair.
    let mut pos = vec![0usize; n];
    for (x, &id) in arena.next.iter().enumerate() {
        pos[id] = x;
    }
    let mut ends = vec![0usize; n];
    for (x, &id) in arena.next.iter().enumerate() {
        ends[id] = match topology.children(id).len() {
            0 => arena.next.len(),
            1 => x + 2,
            _ => topology.children(id).iter().map(|&c| pos[c]).max().unwrap() + 1,
        };
    }

    for i in 0..n {
        let a = arena.next[i];
        let a_end = ends[a];
        for j in (i + 1)..n {
            let b = arena.next[j];
            let b_end = ends[b];
            let lifetimes_overlap = i < b_end && j < a_end;
            if !lifetimes_overlap {
                continue;
            }
            let (oa, sa) = (arena.offsets[a], arena.sizes[a]);
            let (ob, sb) = (arena.offsets[b], arena.sizes[b]);
            let ranges_disjoint = oa + sa <= ob || ob + sb <= oa;
            if !ranges_disjoint {
                return Err(format!(
                    "nodes {a} and {b} have overlapping lifetimes and overlapping byte ranges \
                     [{oa}, {}) vs [{ob}, {})",
                    oa + sa,
                    ob + sb
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::packing::pack;
    use crate::planner::traversal::{enumerate, DEFAULT_TRAVERSAL_CAP};

    fn reference_tree() -> Topology {
        // spec.md §8 S1/S2's 10-node tree, sizes {1,1,2,3,2,4,1,2,1,1}.
        // root(0, size 1) -> {1 (size 1), 2 (size 2)}
        // 1 -> {3 (size 3), 4 (size 2)}
        // 2 -> {5 (size 4), 6 (size 1)}
        // 3 -> 7 (size 2)
        // 7 -> {8 (size 1), 9 (size 1)}
        Topology::from_parents(
            &[
                None,
                Some(0),
                Some(0),
                Some(1),
                Some(1),
                Some(2),
                Some(2),
                Some(3),
                Some(7),
                Some(7),
            ],
            &[1, 1, 2, 3, 2, 4, 1, 2, 1, 1],
        )
    }

    #[test]
    fn s1_validator_rejects_overlapping_leaves() {
        let topology = reference_tree();
        let traversal = enumerate(&topology, DEFAULT_TRAVERSAL_CAP).remove(0);
        let mut arena = pack(&topology, &traversal);
        // Force two leaves (8 and 9) to collide.
        arena.offsets[9] = arena.offsets[8];
        let result = validate(&topology, &arena);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("overlapping"));
    }

    #[test]
    fn s2_sliding_blocks_beats_sum_of_sizes() {
        let topology = reference_tree();
        let sum: usize = (0..10).map(|id| topology.size(id)).sum();
        assert_eq!(sum, 18);

        let traversals = enumerate(&topology, DEFAULT_TRAVERSAL_CAP);
        let best = traversals
            .iter()
            .map(|t| pack(&topology, t))
            .min_by_key(|a| a.height)
            .unwrap();

        validate(&topology, &best).expect("planner output must validate");
        assert!(best.height < sum, "height {} should be < sum {sum}", best.height);
    }
}
