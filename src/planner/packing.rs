//! Sliding-Blocks greedy 2-D packing (spec.md §4.5 steps 4-6).

use crate::graph::NodeId;
use crate::planner::topology::Topology;

/// One candidate arena layout: `offsets[id]` / `sizes[id]` are indexed by
/// [`NodeId`]; `next` is the traversal that produced this layout, doubling
/// as the execution `next`-pointer chain for DOT rendering.
pub struct PlannedArena {
    pub offsets: Vec<usize>,
    pub sizes: Vec<usize>,
    pub next: Vec<NodeId>,
    pub height: usize,
}

/// A node's lifetime end index within `traversal`: the traversal position
/// immediately after the last moment its storage must remain valid
/// (spec.md §4.5 step 4).
fn lifetime_end(topology: &Topology, traversal_len: usize, pos: &[usize], x: usize, id: NodeId) -> usize {
    match topology.children(id).len() {
        0 => traversal_len,
        1 => x + 2,
        _ => topology.children(id).iter().map(|&c| pos[c]).max().unwrap() + 1,
    }
}

/// Packs one traversal with the Sliding-Blocks greedy strategy: a `relief`
/// array tracks the current top of the packing per column; each node is
/// placed at the lowest y that clears every column it spans.
pub fn pack(topology: &Topology, traversal: &[NodeId]) -> PlannedArena {
    let w = traversal.len();
    let mut pos = vec![0usize; topology.len()];
    for (x, &id) in traversal.iter().enumerate() {
        pos[id] = x;
    }

    let mut relief = vec![0usize; w];
    let mut offsets = vec![usize::MAX; topology.len()];
    let mut sizes = vec![0usize; topology.len()];
    let mut height = 0usize;

    for (x, &id) in traversal.iter().enumerate() {
        let size = topology.size(id);
        let end = lifetime_end(topology, w, &pos, x, id).min(w);
        let y = relief[x..end].iter().copied().max().unwrap_or(0);
        for slot in relief[x..end].iter_mut() {
            *slot = y + size;
        }
        offsets[id] = y;
        sizes[id] = size;
        height = height.max(y + size);
    }

    PlannedArena {
        offsets,
        sizes,
        next: traversal.to_vec(),
        height,
    }
}
