//! Worst Allocator (spec.md §4.5 "Degenerate fallback"): an always-correct,
//! memory-wasteful strategy used as a property-test oracle and a guaranteed
//! fallback when traversal enumeration is exhausted without success.

use crate::graph::NodeId;
use crate::planner::packing::PlannedArena;
use crate::planner::topology::Topology;

/// Assigns every node a fresh, non-overlapping offset by accumulating sizes
/// along `order`, and links `next` along that same order.
pub fn worst_allocate(topology: &Topology, order: &[NodeId]) -> PlannedArena {
    let mut offsets = vec![usize::MAX; topology.len()];
    let mut sizes = vec![0usize; topology.len()];
    let mut cursor = 0usize;

    for &id in order {
        let size = topology.size(id);
        offsets[id] = cursor;
        sizes[id] = size;
        cursor += size;
    }

    PlannedArena {
        offsets,
        sizes,
        next: order.to_vec(),
        height: cursor,
    }
}
