//! Transform Instance contract (spec.md §4.2): a configured, format-bound
//! invocation of a registered transform.

use std::collections::BTreeMap;

use crate::error::{CoreError, Result};
use crate::format::BufferFormat;
use crate::param::ParamValue;

/// The result of feeding a transform its resolved input format.
pub struct FormatChange {
    /// Number of output buffers fanning out in parallel (spec.md §3 "count").
    pub output_count: usize,
    /// The transform's resulting output format.
    pub output_format: BufferFormat,
}

/// Capability table every registered transform implements.
///
/// Design Note (spec.md §9): represented as a trait object rather than a
/// tagged variant with downcasts — the executor never needs to recover a
/// concrete type, only to call through this contract, so a vtable is the
/// idiomatic and sufficient choice here.
pub trait Transform: Send + Sync {
    /// Called once formats are known for this node's parent. Returns the
    /// output fan-out multiplier and may choose the output format.
    fn on_format_changed(&mut self, input_format: &BufferFormat) -> Result<FormatChange>;

    /// Called once, after `on_format_changed`, before the first `execute`.
    /// May precompute coefficient tables or transform plans.
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Deterministic pure function of `input`, this transform's parameters,
    /// and `use_simd`. Must not allocate.
    fn execute(&self, input: &[u8], output: &mut [u8], use_simd: bool) -> Result<()>;

    /// Only required when a compiled edge declares `inverse=true`.
    fn inverse_execute(&self, _output: &[u8], _input: &mut [u8]) -> Result<()> {
        Err(CoreError::ExecutionError {
            transform: "<unknown>".to_string(),
            reason: "inverse_execute is not implemented for this transform".to_string(),
        })
    }
}

/// Lifecycle state of a [`TransformInstance`] (spec.md §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    ParametersBound,
    InputFormatBound,
    Initialized,
    Executing,
}

/// A configured, format-bound invocation of a registered transform.
pub struct TransformInstance {
    pub name: String,
    pub normalized_params: BTreeMap<String, ParamValue>,
    pub input_format: Option<BufferFormat>,
    pub output_format: Option<BufferFormat>,
    pub output_count: usize,
    pub lifecycle: Lifecycle,
    pub inner: Box<dyn Transform>,
}

impl TransformInstance {
    pub fn new(
        name: String,
        normalized_params: BTreeMap<String, ParamValue>,
        inner: Box<dyn Transform>,
    ) -> Self {
        Self {
            name,
            normalized_params,
            input_format: None,
            output_format: None,
            output_count: 1,
            lifecycle: Lifecycle::ParametersBound,
            inner,
        }
    }

    /// Identity used for DAG prefix-sharing: equal (name, normalized params)
    /// tuples at the same position are the same node (spec.md §3, §4.4).
    pub fn identity(&self) -> (&str, &BTreeMap<String, ParamValue>) {
        (&self.name, &self.normalized_params)
    }

    pub fn set_input_format(&mut self, format: BufferFormat) -> Result<()> {
        self.input_format = Some(format.clone());
        let change = self.inner.on_format_changed(&format)?;
        self.output_format = Some(change.output_format);
        self.output_count = change.output_count;
        self.lifecycle = Lifecycle::InputFormatBound;
        Ok(())
    }

    pub fn initialize(&mut self) -> Result<()> {
        self.inner.initialize()?;
        self.lifecycle = Lifecycle::Initialized;
        Ok(())
    }

    pub fn execute(&self, input: &[u8], output: &mut [u8], use_simd: bool) -> Result<()> {
        self.inner.execute(input, output, use_simd).map_err(|e| match e {
            CoreError::ExecutionError { reason, .. } => CoreError::ExecutionError {
                transform: self.name.clone(),
                reason,
            },
            other => other,
        })
    }
}

impl std::fmt::Debug for TransformInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformInstance")
            .field("name", &self.name)
            .field("normalized_params", &self.normalized_params)
            .field("input_format", &self.input_format)
            .field("output_format", &self.output_format)
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}
