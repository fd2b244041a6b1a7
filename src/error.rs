//! Error taxonomy for the pipeline compiler and executor (spec.md §7).

use snafu::Snafu;

use crate::format::BufferFormat;

/// All failure modes the core surfaces to a driver.
///
/// Compile-time variants (`ParseError` through `CorruptedTree`) are returned
/// from [`crate::compile`] and never partially consumed. `ExecutionError`
/// aborts one [`crate::execute`] invocation but leaves the compiled pipeline
/// reusable.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CoreError {
    #[snafu(display("parse error at offset {offset}: {message}"))]
    ParseError { offset: usize, message: String },

    #[snafu(display("unknown transform `{name}`"))]
    UnknownTransform { name: String },

    #[snafu(display("transform `{transform}` has no parameter named `{param}`"))]
    InvalidParameterName { transform: String, param: String },

    #[snafu(display(
        "transform `{transform}` parameter `{param}` rejected value `{value}`: {reason}"
    ))]
    InvalidParameterValue {
        transform: String,
        param: String,
        value: String,
        reason: String,
    },

    #[snafu(display(
        "incompatible formats between `{parent}` (output {parent_format:?}, kind `{parent_kind}`) and `{child}` (declared input kind `{child_kind}`), and no format converter is registered for this pair"
    ))]
    IncompatibleFormats {
        parent: String,
        child: String,
        parent_format: BufferFormat,
        parent_kind: &'static str,
        child_kind: &'static str,
    },

    #[snafu(display("corrupted allocation tree: {reason}"))]
    CorruptedTree { reason: String },

    #[snafu(display("transform `{transform}` failed during execution: {reason}"))]
    ExecutionError { transform: String, reason: String },
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
