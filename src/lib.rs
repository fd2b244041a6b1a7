//! Compiles declarative sound-feature-extraction pipelines (spec.md §1-§2)
//! into an executable DAG with a packed buffer arena, then runs them over
//! PCM input.
//!
//! External interfaces (spec.md §6): [`compile`], [`execute`],
//! [`list_transforms`], [`pipeline_dot`].

mod config;
mod dot;
mod error;
mod executor;
mod format;
mod graph;
mod param;
mod parser;
mod planner;
mod registry;
mod resolve;
mod transform;
mod transforms;

use std::collections::BTreeMap;

pub use config::Config;
pub use error::{CoreError, Result};
pub use executor::ExecuteOutput;
pub use format::{BufferFormat, ElementKind};
pub use param::ParamValue;

use graph::{Graph, GraphBuilder};
use planner::{Planner, PlannedArena, DEFAULT_TRAVERSAL_CAP};
use registry::Registry;

/// A compiled pipeline: a resolved DAG and a planned buffer arena. Reusable
/// across many [`execute`] calls.
///
/// The executor walks the DAG's own parent/child structure rather than
/// replaying the Format Resolver's flat pre-order list directly — that
/// structure trivially preserves the ancestor-before-descendant guarantee
/// and lets sibling subtrees run concurrently (spec.md §4.6
/// "Concurrency"). The planner's own chosen traversal (`arena.next`)
/// remains the canonical total order for DOT rendering and the
/// Worst-Allocator oracle.
pub struct Pipeline {
    graph: Graph,
    arena: PlannedArena,
    config: Config,
    input_len_samples: usize,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("input_len_samples", &self.input_len_samples)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn arena_height(&self) -> usize {
        self.arena.height
    }
}

/// Compiles a batch of feature specification strings into one pipeline
/// sharing their common transform prefixes (spec.md §4.4, §6 `compile`).
pub fn compile(specs: &[&str], pcm_buffer_length_samples: usize, sampling_rate: u32, config: Config) -> Result<Pipeline> {
    let registry = Registry::new();
    let mut builder = GraphBuilder::new(&registry);
    for spec in specs {
        let parsed = parser::parse(spec, &registry)?;
        builder.add_feature(&parsed)?;
    }
    let mut graph = builder.build();

    let root_format = BufferFormat::new(ElementKind::Int16, 1)
        .with_sampling_rate(sampling_rate)
        .with_element_array_length(pcm_buffer_length_samples);
    resolve::resolve(&mut graph, &registry, root_format)?;

    let arena = Planner::new(DEFAULT_TRAVERSAL_CAP).plan(&graph)?;

    Ok(Pipeline {
        graph,
        arena,
        config,
        input_len_samples: pcm_buffer_length_samples,
    })
}

/// Runs `pipeline` over one PCM buffer (spec.md §6 `execute`, §4.6).
pub fn execute(pipeline: &Pipeline, pcm: &[i16]) -> Result<ExecuteOutput> {
    executor::execute(
        &pipeline.graph,
        &pipeline.arena,
        &pipeline.config,
        pipeline.input_len_samples,
        pcm,
    )
}

/// Every registered transform's name, description, and parameter schema
/// (spec.md §6 `list_transforms`).
pub fn list_transforms() -> Vec<(String, String, BTreeMap<String, (String, String)>)> {
    let registry = Registry::new();
    registry
        .enumerate()
        .into_iter()
        .map(|name| {
            let descriptor = registry.lookup(name).expect("enumerate only yields registered names");
            (
                descriptor.name.to_string(),
                descriptor.description.to_string(),
                (descriptor.params)().describe(),
            )
        })
        .collect()
}

/// A GraphViz DOT rendering of the compiled DAG (spec.md §6 `pipeline_dot`).
pub fn pipeline_dot(pipeline: &Pipeline) -> String {
    dot::render(&pipeline.graph, &pipeline.arena)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_smoke_s6() {
        // spec.md §8 S6.
        let config = Config::default();
        let pipeline = compile(
            &["MFCC[Window(length=32), RDFT, Energy, FilterBank, Log, Square, DCT, Selector(length=24)]"],
            48_000,
            16_000,
            config,
        )
        .expect("pipeline should compile");

        let pcm = vec![1_i16; 48_000];
        let output = execute(&pipeline, &pcm).expect("pipeline should execute");

        let mfcc = output.features.get("MFCC").expect("MFCC feature should be present");
        assert!(!mfcc.is_empty());
        assert_eq!(mfcc.len() % 4, 0, "MFCC output should be a whole number of f32s");
    }

    #[test]
    fn list_transforms_includes_stock_kernels() {
        let names: Vec<String> = list_transforms().into_iter().map(|(name, _, _)| name).collect();
        for expected in ["Identity", "Window", "RDFT", "Energy", "FilterBank", "Log", "Square", "DCT", "Selector", "Int16ToFloat"] {
            assert!(names.contains(&expected.to_string()), "missing {expected} in list_transforms()");
        }
    }

    #[test]
    fn pipeline_dot_names_the_digraph() {
        let pipeline = compile(&["A[Window(length=32), RDFT]"], 4_096, 16_000, Config::default()).unwrap();
        let dot = pipeline_dot(&pipeline);
        assert!(dot.starts_with("digraph BuffersAllocator {\n"));
    }
}
