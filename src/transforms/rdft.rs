//! `RDFT`: a naive real discrete Fourier transform, magnitude only.
//!
//! No FFT crate appears anywhere in the corpus this crate was grounded on,
//! so an O(n^2) direct summation is used rather than fabricating a
//! dependency. Window lengths in this pipeline are small (tens of samples
//! per block), so the quadratic cost is immaterial in practice.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::error::{CoreError, Result};
use crate::format::{BufferFormat, ElementKind};
use crate::param::{ParamSchema, ParamValue};
use crate::registry::TransformDescriptor;
use crate::transform::{FormatChange, Transform};

use super::bytes::{read_f32, validate_f32_block, write_f32};

struct Tables {
    in_len: usize,
    out_len: usize,
    count: usize,
    cos: Vec<f32>,
    sin: Vec<f32>,
}

#[derive(Default)]
pub struct RdftTransform {
    tables: Mutex<Option<Tables>>,
}

impl Transform for RdftTransform {
    fn on_format_changed(&mut self, input_format: &BufferFormat) -> Result<FormatChange> {
        let in_len = input_format.element_array_length.unwrap_or(1);
        let out_len = in_len / 2 + 1;

        let output_format = BufferFormat {
            element_kind: ElementKind::Float,
            count: input_format.count,
            sampling_rate: input_format.sampling_rate,
            duration_ms: input_format.duration_ms,
            element_array_length: Some(out_len),
        };

        *self.tables.lock() = Some(Tables {
            in_len,
            out_len,
            count: input_format.count,
            cos: Vec::new(),
            sin: Vec::new(),
        });

        Ok(FormatChange {
            output_count: input_format.count,
            output_format,
        })
    }

    fn initialize(&mut self) -> Result<()> {
        let mut guard = self.tables.lock();
        let t = guard.as_mut().expect("on_format_changed runs before initialize");
        let mut cos = Vec::with_capacity(t.out_len * t.in_len);
        let mut sin = Vec::with_capacity(t.out_len * t.in_len);
        for k in 0..t.out_len {
            for n in 0..t.in_len {
                let phase = 2.0 * std::f64::consts::PI * k as f64 * n as f64 / t.in_len as f64;
                cos.push(phase.cos() as f32);
                sin.push(phase.sin() as f32);
            }
        }
        t.cos = cos;
        t.sin = sin;
        Ok(())
    }

    fn execute(&self, input: &[u8], output: &mut [u8], _use_simd: bool) -> Result<()> {
        let guard = self.tables.lock();
        let t = guard.as_ref().expect("execute runs after initialize");

        for c in 0..t.count {
            for k in 0..t.out_len {
                let mut sum_re = 0.0_f32;
                let mut sum_im = 0.0_f32;
                for n in 0..t.in_len {
                    let x = read_f32(input, c * t.in_len + n);
                    sum_re += x * t.cos[k * t.in_len + n];
                    sum_im -= x * t.sin[k * t.in_len + n];
                }
                let magnitude = (sum_re * sum_re + sum_im * sum_im).sqrt();
                write_f32(output, c * t.out_len + k, magnitude);
            }
        }

        validate_f32_block(output, t.count * t.out_len).map_err(|reason| {
            CoreError::ExecutionError {
                transform: "RDFT".to_string(),
                reason,
            }
        })
    }
}

fn schema() -> ParamSchema {
    ParamSchema::new()
}

fn factory(_params: &BTreeMap<String, ParamValue>) -> Box<dyn Transform> {
    Box::<RdftTransform>::default()
}

inventory::submit! {
    TransformDescriptor {
        name: "RDFT",
        description: "Real discrete Fourier transform magnitude spectrum.",
        input_kind: "float",
        output_kind: "float",
        params: schema,
        factory,
    }
}
