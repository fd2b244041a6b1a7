//! `Window`: slices raw PCM into overlap-free fixed-length windows and
//! applies a Hamming envelope (spec.md §8 S5).

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::error::{CoreError, Result};
use crate::format::{BufferFormat, ElementKind};
use crate::param::{ParamSchema, ParamSpec, ParamValue};
use crate::registry::TransformDescriptor;
use crate::transform::{FormatChange, Transform};

use super::bytes::{read_i16, validate_f32_block, write_f32};

/// `HAMMING(length, k)`, matching spec.md §8 S5: `0.54 - 0.46 *
/// cos(2*pi*k/(length-1))`.
pub fn hamming(length: usize, k: usize) -> f32 {
    if length <= 1 {
        return 1.0;
    }
    let phase = 2.0 * std::f64::consts::PI * k as f64 / (length - 1) as f64;
    (0.54 - 0.46 * phase.cos()) as f32
}

struct Precomputed {
    coeffs: Vec<f32>,
    length: usize,
    num_windows: usize,
}

pub struct WindowTransform {
    length: usize,
    state: Mutex<Option<Precomputed>>,
}

impl WindowTransform {
    fn new(length: usize) -> Self {
        Self {
            length,
            state: Mutex::new(None),
        }
    }
}

impl Transform for WindowTransform {
    fn on_format_changed(&mut self, input_format: &BufferFormat) -> Result<FormatChange> {
        let total_samples = input_format.element_array_length.unwrap_or(1) * input_format.count;
        let num_windows = (total_samples / self.length).max(1);

        let output_format = BufferFormat {
            element_kind: ElementKind::Float,
            count: num_windows,
            sampling_rate: input_format.sampling_rate,
            duration_ms: input_format.sampling_rate.map(|rate| {
                ((self.length as u64 * 1000) / rate.max(1) as u64) as u32
            }),
            element_array_length: Some(self.length),
        };

        *self.state.lock() = Some(Precomputed {
            coeffs: Vec::new(),
            length: self.length,
            num_windows,
        });

        Ok(FormatChange {
            output_count: num_windows,
            output_format,
        })
    }

    fn initialize(&mut self) -> Result<()> {
        let mut guard = self.state.lock();
        let state = guard.as_mut().expect("on_format_changed runs before initialize");
        state.coeffs = (0..state.length).map(|k| hamming(state.length, k)).collect();
        Ok(())
    }

    fn execute(&self, input: &[u8], output: &mut [u8], _use_simd: bool) -> Result<()> {
        let guard = self.state.lock();
        let state = guard.as_ref().expect("execute runs after initialize");
        let total_samples = input.len() / 2;

        for w in 0..state.num_windows {
            for k in 0..state.length {
                let sample_idx = w * state.length + k;
                let sample = if sample_idx < total_samples {
                    read_i16(input, sample_idx) as f32 / 32_768.0
                } else {
                    0.0
                };
                write_f32(output, w * state.length + k, sample * state.coeffs[k]);
            }
        }

        validate_f32_block(output, state.num_windows * state.length).map_err(|reason| {
            CoreError::ExecutionError {
                transform: "Window".to_string(),
                reason,
            }
        })
    }
}

fn validate_length(value: &ParamValue) -> std::result::Result<(), String> {
    match value {
        ParamValue::Int(n) if *n >= 2 => Ok(()),
        ParamValue::Int(n) => Err(format!("length must be >= 2, got {n}")),
        _ => Err("length must be an integer".to_string()),
    }
}

fn schema() -> ParamSchema {
    ParamSchema::new().with(
        "length",
        ParamSpec::new("window length in samples", ParamValue::Int(32))
            .with_validator(validate_length),
    )
}

fn factory(params: &BTreeMap<String, ParamValue>) -> Box<dyn Transform> {
    let length = match params.get("length") {
        Some(ParamValue::Int(n)) => *n as usize,
        _ => 32,
    };
    Box::new(WindowTransform::new(length))
}

inventory::submit! {
    TransformDescriptor {
        name: "Window",
        description: "Slices PCM into fixed-length windows and applies a Hamming envelope.",
        input_kind: "int16",
        output_kind: "float",
        params: schema,
        factory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hamming_matches_reference_values() {
        let expected = [0.0800_f32, 0.5400, 1.0000, 0.5400, 0.0800];
        for (k, want) in expected.iter().enumerate() {
            let got = hamming(5, k);
            assert!((got - want).abs() < 1e-4, "k={k} got={got} want={want}");
        }
    }
}
