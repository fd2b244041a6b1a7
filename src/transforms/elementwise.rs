//! Shape-preserving elementwise kernels: `Energy` (power), `Log`, `Square`.
//! All three keep `count` and `element_array_length` unchanged, so they
//! share one generic implementation parameterized by the per-sample
//! function and a registered name/description. `Flux` lives here too,
//! though it reduces rather than preserves shape.

use std::collections::BTreeMap;

use crate::error::{CoreError, Result};
use crate::format::{BufferFormat, ElementKind};
use crate::param::{ParamSchema, ParamValue};
use crate::registry::TransformDescriptor;
use crate::transform::{FormatChange, Transform};

use super::bytes::{read_f32, validate_f32_block, write_f32};

const LOG_EPSILON: f32 = 1e-6;

pub struct ElementwiseTransform {
    name: &'static str,
    op: fn(f32) -> f32,
    total_len: usize,
}

impl ElementwiseTransform {
    fn new(name: &'static str, op: fn(f32) -> f32) -> Self {
        Self {
            name,
            op,
            total_len: 0,
        }
    }
}

impl Transform for ElementwiseTransform {
    fn on_format_changed(&mut self, input_format: &BufferFormat) -> Result<FormatChange> {
        self.total_len = input_format.count * input_format.element_array_length.unwrap_or(1);
        Ok(FormatChange {
            output_count: input_format.count,
            output_format: input_format.clone(),
        })
    }

    fn execute(&self, input: &[u8], output: &mut [u8], _use_simd: bool) -> Result<()> {
        for i in 0..self.total_len {
            write_f32(output, i, (self.op)(read_f32(input, i)));
        }
        validate_f32_block(output, self.total_len).map_err(|reason| CoreError::ExecutionError {
            transform: self.name.to_string(),
            reason,
        })
    }
}

fn energy_op(x: f32) -> f32 {
    x * x
}

fn log_op(x: f32) -> f32 {
    (x.abs() + LOG_EPSILON).ln()
}

fn square_op(x: f32) -> f32 {
    x * x
}

/// Reduces a float buffer to one scalar: the sum of squared successive
/// differences ("spectral flux" against the buffer's own previous element,
/// since a transform has no access to the prior frame). Named only in
/// spec.md §8 S3 as a sibling leaf sharing `Window`/`RDFT` with `Energy`.
pub struct Flux {
    total_len: usize,
}

impl Transform for Flux {
    fn on_format_changed(&mut self, input_format: &BufferFormat) -> Result<FormatChange> {
        self.total_len = input_format.count * input_format.element_array_length.unwrap_or(1);
        Ok(FormatChange {
            output_count: 1,
            output_format: BufferFormat::new(ElementKind::Float, 1),
        })
    }

    fn execute(&self, input: &[u8], output: &mut [u8], _use_simd: bool) -> Result<()> {
        let mut sum = 0.0f32;
        for i in 1..self.total_len {
            let delta = read_f32(input, i) - read_f32(input, i - 1);
            sum += delta * delta;
        }
        write_f32(output, 0, sum);
        validate_f32_block(output, 1).map_err(|reason| CoreError::ExecutionError {
            transform: "Flux".to_string(),
            reason,
        })
    }
}

fn flux_factory(_params: &BTreeMap<String, ParamValue>) -> Box<dyn Transform> {
    Box::new(Flux { total_len: 0 })
}

fn empty_schema() -> ParamSchema {
    ParamSchema::new()
}

fn energy_factory(_params: &BTreeMap<String, ParamValue>) -> Box<dyn Transform> {
    Box::new(ElementwiseTransform::new("Energy", energy_op))
}

fn log_factory(_params: &BTreeMap<String, ParamValue>) -> Box<dyn Transform> {
    Box::new(ElementwiseTransform::new("Log", log_op))
}

fn square_factory(_params: &BTreeMap<String, ParamValue>) -> Box<dyn Transform> {
    Box::new(ElementwiseTransform::new("Square", square_op))
}

inventory::submit! {
    TransformDescriptor {
        name: "Energy",
        description: "Elementwise power (x^2).",
        input_kind: "float",
        output_kind: "float",
        params: empty_schema,
        factory: energy_factory,
    }
}

inventory::submit! {
    TransformDescriptor {
        name: "Log",
        description: "Elementwise natural log of |x| + epsilon.",
        input_kind: "float",
        output_kind: "float",
        params: empty_schema,
        factory: log_factory,
    }
}

inventory::submit! {
    TransformDescriptor {
        name: "Square",
        description: "Elementwise square (x^2).",
        input_kind: "float",
        output_kind: "float",
        params: empty_schema,
        factory: square_factory,
    }
}

inventory::submit! {
    TransformDescriptor {
        name: "Flux",
        description: "Sum of squared successive differences, reduced to one scalar.",
        input_kind: "float",
        output_kind: "float",
        params: empty_schema,
        factory: flux_factory,
    }
}
