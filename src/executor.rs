//! Executor (spec.md §4.6): runs a compiled pipeline over one PCM buffer.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::config::Config;
use crate::error::{CoreError, Result};
use crate::graph::{Graph, NodeId, NodeKind};
use crate::planner::PlannedArena;

/// Output of one [`crate::execute`] call: the feature-tagged leaf buffers
/// plus per-transform-identity timing, accumulated across every node in the
/// DAG sharing that identity (spec.md §4.6 step 2).
#[derive(Debug)]
pub struct ExecuteOutput {
    pub features: HashMap<String, Vec<u8>>,
    pub timings: HashMap<String, Duration>,
}

/// Raw pointer into the shared arena buffer. `execute_one` only ever hands
/// out the byte ranges the planner proved disjoint for concurrently live
/// nodes (spec.md §4.5 Validator, §5 "Shared resources"), so sharing this
/// across worker threads is sound despite the raw pointer.
#[derive(Clone, Copy)]
struct ArenaPtr(*mut u8);

unsafe impl Send for ArenaPtr {}
unsafe impl Sync for ArenaPtr {}

pub fn execute(
    graph: &Graph,
    arena_plan: &PlannedArena,
    config: &Config,
    input_len_samples: usize,
    pcm: &[i16],
) -> Result<ExecuteOutput> {
    if pcm.len() != input_len_samples {
        return Err(CoreError::ExecutionError {
            transform: "<root>".to_string(),
            reason: format!(
                "expected a PCM buffer of {input_len_samples} samples, got {}",
                pcm.len()
            ),
        });
    }

    let mut bytes = vec![0u8; arena_plan.height];
    let root_id = graph.root;
    let root_offset = arena_plan.offsets[root_id];
    for (i, &sample) in pcm.iter().enumerate() {
        let at = root_offset + i * 2;
        bytes[at..at + 2].copy_from_slice(&sample.to_le_bytes());
    }

    let arena = ArenaPtr(bytes.as_mut_ptr());
    let timings: Mutex<HashMap<String, Duration>> = Mutex::new(HashMap::new());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_transform_threads.max(1))
        .build()
        .map_err(|e| CoreError::ExecutionError {
            transform: "<executor>".to_string(),
            reason: format!("failed to build worker pool: {e}"),
        })?;

    pool.install(|| run_node(arena, graph, arena_plan, root_id, &timings, config.use_simd))?;

    let mut features = HashMap::new();
    for id in graph.ids() {
        let node = graph.node(id);
        if node.feature_tags.is_empty() {
            continue;
        }
        let offset = arena_plan.offsets[id];
        let size = arena_plan.sizes[id];
        let slice = bytes[offset..offset + size].to_vec();
        for tag in &node.feature_tags {
            features.insert(tag.clone(), slice.clone());
        }
    }

    Ok(ExecuteOutput {
        features,
        timings: timings.into_inner(),
    })
}

/// Runs `node_id` (a no-op for the root, which only seeds PCM) and then its
/// children, in parallel when there is more than one — the only case in
/// which spec.md §4.6's "two nodes may execute concurrently iff neither is
/// the ancestor of the other" condition is non-trivially exercised.
fn run_node(
    arena: ArenaPtr,
    graph: &Graph,
    arena_plan: &PlannedArena,
    node_id: NodeId,
    timings: &Mutex<HashMap<String, Duration>>,
    use_simd: bool,
) -> Result<()> {
    if node_id != graph.root {
        execute_one(arena, graph, arena_plan, node_id, timings, use_simd)?;
    }

    let children = &graph.node(node_id).children;
    match children.len() {
        0 => Ok(()),
        1 => run_node(arena, graph, arena_plan, children[0], timings, use_simd),
        _ => children
            .par_iter()
            .map(|&child| run_node(arena, graph, arena_plan, child, timings, use_simd))
            .collect::<Result<Vec<()>>>()
            .map(|_| ()),
    }
}

fn execute_one(
    arena: ArenaPtr,
    graph: &Graph,
    arena_plan: &PlannedArena,
    node_id: NodeId,
    timings: &Mutex<HashMap<String, Duration>>,
    use_simd: bool,
) -> Result<()> {
    let node = graph.node(node_id);
    let parent_id = node.parent.expect("non-root nodes always have a parent");
    let parent_offset = arena_plan.offsets[parent_id];
    let parent_size = arena_plan.sizes[parent_id];
    let offset = arena_plan.offsets[node_id];
    let size = arena_plan.sizes[node_id];

    // SAFETY: the planner's Validator proves `[offset, offset+size)` is
    // disjoint from every byte range alive at the same time, and the
    // parent's range has already been written by the time this call runs
    // (ancestor-before-descendant, enforced by the recursive call order
    // above).
    let input = unsafe { std::slice::from_raw_parts(arena.0.add(parent_offset), parent_size) };
    let output = unsafe { std::slice::from_raw_parts_mut(arena.0.add(offset), size) };

    let instance = match &node.kind {
        NodeKind::Transform(instance) => instance,
        NodeKind::Root { .. } => unreachable!("the root is never scheduled for execute"),
    };

    let start = Instant::now();
    instance.execute(input, output, use_simd)?;
    let elapsed = start.elapsed();

    *timings.lock().entry(instance.name.clone()).or_insert(Duration::ZERO) += elapsed;
    Ok(())
}
