//! Integration tests against the public API, covering spec.md §8's
//! end-to-end scenarios and invariants that are expressible without reaching
//! into `Graph`/`Planner` internals (those live as unit tests alongside the
//! modules that own them).

use soundgraph::{compile, execute, list_transforms, pipeline_dot, Config, CoreError};

fn pcm_of(len: usize, value: i16) -> Vec<i16> {
    vec![value; len]
}

/// Counts occurrences of a node label prefix in a `pipeline_dot` rendering —
/// the only way to observe DAG node identity through the public API.
fn label_count(dot: &str, label_prefix: &str) -> usize {
    dot.lines()
        .filter(|line| line.contains(&format!("label=\"{label_prefix}")))
        .count()
}

/// Extracts the numeric node id whose label starts with `label_prefix`.
fn node_id_for(dot: &str, label_prefix: &str) -> usize {
    let line = dot
        .lines()
        .find(|line| line.contains(&format!("label=\"{label_prefix}")))
        .expect("label not found in dot output");
    let after_n = line.trim_start().strip_prefix('n').expect("node line must start with n<id>");
    let digits: String = after_n.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().expect("node id must be numeric")
}

/// Counts `node_id`'s outgoing *structural* (parent -> child) edges, ignoring
/// the red `next`-order edges dot.rs overlays on top.
fn outgoing_edge_count(dot: &str, node_id: usize) -> usize {
    let prefix = format!("n{node_id} -> ");
    dot.lines()
        .filter(|line| line.trim_start().starts_with(&prefix) && !line.contains("color=red"))
        .count()
}

#[test]
fn s3_identical_prefix_sharing() {
    let pipeline = compile(
        &["A[Window(length=32), RDFT, Energy]", "B[Window(length=32), RDFT, Flux]"],
        48_000,
        16_000,
        Config::default(),
    )
    .expect("shared-prefix spec should compile");

    let dot = pipeline_dot(&pipeline);
    assert_eq!(label_count(&dot, "Window"), 1, "Window must be shared");
    assert_eq!(label_count(&dot, "RDFT"), 1, "RDFT must be shared");

    let rdft_id = node_id_for(&dot, "RDFT");
    assert_eq!(outgoing_edge_count(&dot, rdft_id), 2, "RDFT should fan out to two children");
}

#[test]
fn s4_parameter_difference_blocks_sharing() {
    let pipeline = compile(
        &["A[Window(length=25)]", "B[Window(length=50)]"],
        48_000,
        16_000,
        Config::default(),
    )
    .expect("differing-param spec should compile");

    let dot = pipeline_dot(&pipeline);
    assert_eq!(label_count(&dot, "Window"), 2, "differing params must not share a node");
}

#[test]
fn s6_end_to_end_mfcc_smoke() {
    let pipeline = compile(
        &["MFCC[Window(length=32), RDFT, Energy, FilterBank, Log, Square, DCT, Selector(length=24)]"],
        48_000,
        16_000,
        Config::default(),
    )
    .expect("MFCC chain should compile");

    let pcm = pcm_of(48_000, 1);
    let output = execute(&pipeline, &pcm).expect("MFCC chain should execute without error");

    let mfcc = output.features.get("MFCC").expect("MFCC feature must be present");
    assert!(!mfcc.is_empty());
    assert_eq!(mfcc.len() % 4, 0, "feature output must be a whole number of f32s");
}

#[test]
fn invariant_7_recompiling_the_same_specs_is_deterministic() {
    let specs = ["MFCC[Window(length=32), RDFT, Energy, FilterBank, Log, Square, DCT, Selector(length=24)]"];
    let a = compile(&specs, 48_000, 16_000, Config::default()).unwrap();
    let b = compile(&specs, 48_000, 16_000, Config::default()).unwrap();
    assert_eq!(a.arena_height(), b.arena_height());
}

#[test]
fn invariant_9_two_identical_specs_share_fully() {
    let one = compile(&["A[Window(length=32), RDFT]"], 48_000, 16_000, Config::default()).unwrap();
    let both = compile(
        &["A[Window(length=32), RDFT]", "B[Window(length=32), RDFT]"],
        48_000,
        16_000,
        Config::default(),
    )
    .unwrap();
    assert_eq!(one.arena_height(), both.arena_height());
}

#[test]
fn unknown_transform_name_fails_at_compile() {
    let err = compile(&["A[NotARealTransform]"], 48_000, 16_000, Config::default()).unwrap_err();
    assert!(matches!(err, CoreError::UnknownTransform { .. }));
}

#[test]
fn unknown_parameter_name_fails_at_compile() {
    let err = compile(&["A[Window(bogus=1)]"], 48_000, 16_000, Config::default()).unwrap_err();
    assert!(matches!(err, CoreError::InvalidParameterName { .. }));
}

#[test]
fn invalid_parameter_value_fails_at_compile() {
    let err = compile(&["A[Window(length=not-a-number)]"], 48_000, 16_000, Config::default()).unwrap_err();
    assert!(matches!(err, CoreError::InvalidParameterValue { .. }));
}

#[test]
fn malformed_spec_reports_parse_error() {
    let err = compile(&["A[Window(length=32]"], 48_000, 16_000, Config::default()).unwrap_err();
    assert!(matches!(err, CoreError::ParseError { .. }));
}

#[test]
fn execute_rejects_mismatched_pcm_length() {
    let pipeline = compile(&["A[Window(length=32), RDFT]"], 48_000, 16_000, Config::default()).unwrap();
    let wrong_length_pcm = pcm_of(1_000, 1);
    let err = execute(&pipeline, &wrong_length_pcm).unwrap_err();
    assert!(matches!(err, CoreError::ExecutionError { .. }));
}

#[test]
fn list_transforms_exposes_registered_schemas() {
    let transforms = list_transforms();
    let window = transforms
        .iter()
        .find(|(name, _, _)| name == "Window")
        .expect("Window must be registered");
    assert!(window.2.contains_key("length"));
}

#[test]
fn pipeline_dot_renders_a_graphviz_digraph() {
    let pipeline = compile(&["A[Window(length=32), RDFT]"], 48_000, 16_000, Config::default()).unwrap();
    let dot = pipeline_dot(&pipeline);
    assert!(dot.starts_with("digraph BuffersAllocator {\n"));
    assert!(dot.ends_with("}\n"));
}
