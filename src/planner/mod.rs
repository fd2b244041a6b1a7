//! Buffer Arena Planner (spec.md §4.5) — the algorithmic core of the
//! compiler. Explores a budget-capped set of DAG linearizations, packs each
//! with the Sliding-Blocks greedy strategy, and keeps the smallest-height
//! result, independently re-checked by the [`validate`] oracle before it is
//! handed back to the caller.

mod packing;
mod topology;
mod traversal;
mod validate;
mod worst;

pub use packing::PlannedArena;
pub use traversal::DEFAULT_TRAVERSAL_CAP;
pub use worst::worst_allocate;

use tracing::debug;

use crate::error::{CoreError, Result};
use crate::graph::Graph;
use topology::Topology;

pub struct Planner {
    traversal_cap: usize,
}

impl Planner {
    pub fn new(traversal_cap: usize) -> Self {
        Self { traversal_cap }
    }

    /// Explores every enumerated traversal, keeps the first one achieving
    /// the smallest height (spec.md §9: "the source retains the first-seen
    /// solution"), and validates it before returning.
    pub fn plan(&self, graph: &Graph) -> Result<PlannedArena> {
        let topology = Topology::from_graph(graph);
        let traversals = traversal::enumerate(&topology, self.traversal_cap);
        debug!(variants = traversals.len(), "planner: enumerated traversals");

        let mut best: Option<PlannedArena> = None;
        for candidate_traversal in &traversals {
            let candidate = packing::pack(&topology, candidate_traversal);
            let is_better = match &best {
                None => true,
                Some(current) => candidate.height < current.height,
            };
            if is_better {
                best = Some(candidate);
            }
        }

        let best = best.ok_or_else(|| CoreError::CorruptedTree {
            reason: "planner produced no traversals for a non-empty graph".to_string(),
        })?;

        validate::validate(&topology, &best).map_err(|reason| CoreError::CorruptedTree { reason })?;
        debug!(height = best.height, "planner: selected arena layout");
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{BufferFormat, ElementKind};
    use crate::graph::GraphBuilder;
    use crate::registry::Registry;
    use crate::resolve::resolve;

    fn pcm_format() -> BufferFormat {
        BufferFormat::new(ElementKind::Int16, 1)
            .with_sampling_rate(16_000)
            .with_element_array_length(48_000)
    }

    #[test]
    fn single_feature_height_equals_sum_of_sizes() {
        // Invariant 8: no sharing possible, so height == sum(sizes).
        let registry = Registry::new();
        let feature = crate::parser::parse("A[Window(length=32), RDFT, Energy]", &registry).unwrap();
        let mut builder = GraphBuilder::new(&registry);
        builder.add_feature(&feature).unwrap();
        let mut graph = builder.build();
        let order = resolve(&mut graph, &registry, pcm_format()).unwrap();

        let plan = Planner::new(DEFAULT_TRAVERSAL_CAP).plan(&graph).unwrap();
        let sum: usize = order.iter().map(|&id| graph.node(id).size()).sum();
        assert_eq!(plan.height, sum);
    }

    #[test]
    fn shared_chain_height_matches_single_chain() {
        // Invariant 9: identical specs fully share, height == one chain's height.
        let registry = Registry::new();
        let a = crate::parser::parse("A[Window(length=32), RDFT]", &registry).unwrap();
        let b = crate::parser::parse("B[Window(length=32), RDFT]", &registry).unwrap();

        let mut one = GraphBuilder::new(&registry);
        one.add_feature(&a).unwrap();
        let mut one_graph = one.build();
        resolve(&mut one_graph, &registry, pcm_format()).unwrap();
        let one_height = Planner::new(DEFAULT_TRAVERSAL_CAP).plan(&one_graph).unwrap().height;

        let mut both = GraphBuilder::new(&registry);
        both.add_feature(&a).unwrap();
        both.add_feature(&b).unwrap();
        let mut both_graph = both.build();
        resolve(&mut both_graph, &registry, pcm_format()).unwrap();
        let both_height = Planner::new(DEFAULT_TRAVERSAL_CAP).plan(&both_graph).unwrap().height;

        assert_eq!(one_height, both_height);
    }

    #[test]
    fn sliding_blocks_never_worse_than_worst_allocator() {
        // Invariant 5.
        let registry = Registry::new();
        let a = crate::parser::parse("A[Window(length=32), RDFT, Energy]", &registry).unwrap();
        let b = crate::parser::parse("B[Window(length=32), RDFT, Square]", &registry).unwrap();
        let c = crate::parser::parse("C[Window(length=32), RDFT, Log]", &registry).unwrap();
        let mut builder = GraphBuilder::new(&registry);
        builder.add_feature(&a).unwrap();
        builder.add_feature(&b).unwrap();
        builder.add_feature(&c).unwrap();
        let mut graph = builder.build();
        let order = resolve(&mut graph, &registry, pcm_format()).unwrap();

        let planned = Planner::new(DEFAULT_TRAVERSAL_CAP).plan(&graph).unwrap();
        let topology = Topology::from_graph(&graph);
        let worst = worst_allocate(&topology, &order);
        validate::validate(&topology, &worst).expect("worst allocator must always validate");

        assert!(planned.height <= worst.height);
    }
}
