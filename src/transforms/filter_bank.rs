//! `FilterBank`: a bank of triangular filters spaced evenly across the
//! input spectrum, collapsing `element_array_length` down to `bands`.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::error::{CoreError, Result};
use crate::format::{BufferFormat, ElementKind};
use crate::param::{ParamSchema, ParamSpec, ParamValue};
use crate::registry::TransformDescriptor;
use crate::transform::{FormatChange, Transform};

use super::bytes::{read_f32, validate_f32_block, write_f32};

struct Tables {
    in_len: usize,
    bands: usize,
    count: usize,
    /// Triangular weights, `bands` rows of `in_len` columns each.
    weights: Vec<f32>,
}

pub struct FilterBankTransform {
    bands: usize,
    tables: Mutex<Option<Tables>>,
}

impl FilterBankTransform {
    fn new(bands: usize) -> Self {
        Self {
            bands,
            tables: Mutex::new(None),
        }
    }
}

/// Triangular weight of bin `n` (of `in_len`) under the filter spanning
/// `[left, right]` and peaking at `center`.
fn triangular_weight(n: f32, left: f32, center: f32, right: f32) -> f32 {
    if n <= left || n >= right {
        0.0
    } else if n <= center {
        if center == left {
            1.0
        } else {
            (n - left) / (center - left)
        }
    } else if center == right {
        1.0
    } else {
        (right - n) / (right - center)
    }
}

impl Transform for FilterBankTransform {
    fn on_format_changed(&mut self, input_format: &BufferFormat) -> Result<FormatChange> {
        let in_len = input_format.element_array_length.unwrap_or(1);
        let output_format = BufferFormat {
            element_kind: ElementKind::Float,
            count: input_format.count,
            sampling_rate: input_format.sampling_rate,
            duration_ms: input_format.duration_ms,
            element_array_length: Some(self.bands),
        };
        *self.tables.lock() = Some(Tables {
            in_len,
            bands: self.bands,
            count: input_format.count,
            weights: Vec::new(),
        });
        Ok(FormatChange {
            output_count: input_format.count,
            output_format,
        })
    }

    fn initialize(&mut self) -> Result<()> {
        let mut guard = self.tables.lock();
        let t = guard.as_mut().expect("on_format_changed runs before initialize");
        let last_bin = (t.in_len.max(1) - 1) as f32;
        let step = last_bin / (t.bands + 1) as f32;
        let mut weights = vec![0.0_f32; t.bands * t.in_len];
        for b in 0..t.bands {
            let left = b as f32 * step;
            let center = (b + 1) as f32 * step;
            let right = (b + 2) as f32 * step;
            for n in 0..t.in_len {
                weights[b * t.in_len + n] = triangular_weight(n as f32, left, center, right);
            }
        }
        t.weights = weights;
        Ok(())
    }

    fn execute(&self, input: &[u8], output: &mut [u8], _use_simd: bool) -> Result<()> {
        let guard = self.tables.lock();
        let t = guard.as_ref().expect("execute runs after initialize");

        for c in 0..t.count {
            for b in 0..t.bands {
                let mut sum = 0.0_f32;
                for n in 0..t.in_len {
                    sum += read_f32(input, c * t.in_len + n) * t.weights[b * t.in_len + n];
                }
                write_f32(output, c * t.bands + b, sum);
            }
        }

        validate_f32_block(output, t.count * t.bands).map_err(|reason| {
            CoreError::ExecutionError {
                transform: "FilterBank".to_string(),
                reason,
            }
        })
    }
}

fn validate_bands(value: &ParamValue) -> std::result::Result<(), String> {
    match value {
        ParamValue::Int(n) if *n >= 1 => Ok(()),
        ParamValue::Int(n) => Err(format!("bands must be >= 1, got {n}")),
        _ => Err("bands must be an integer".to_string()),
    }
}

fn schema() -> ParamSchema {
    ParamSchema::new().with(
        "bands",
        ParamSpec::new("number of filter bank output bands", ParamValue::Int(20))
            .with_validator(validate_bands),
    )
}

fn factory(params: &BTreeMap<String, ParamValue>) -> Box<dyn Transform> {
    let bands = match params.get("bands") {
        Some(ParamValue::Int(n)) => *n as usize,
        _ => 20,
    };
    Box::new(FilterBankTransform::new(bands))
}

inventory::submit! {
    TransformDescriptor {
        name: "FilterBank",
        description: "Triangular filter bank collapsing a spectrum into a fixed number of bands.",
        input_kind: "float",
        output_kind: "float",
        params: schema,
        factory,
    }
}
