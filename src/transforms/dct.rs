//! `DCT`: naive type-II discrete cosine transform, same length in as out.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::error::{CoreError, Result};
use crate::format::BufferFormat;
use crate::param::{ParamSchema, ParamValue};
use crate::registry::TransformDescriptor;
use crate::transform::{FormatChange, Transform};

use super::bytes::{read_f32, validate_f32_block, write_f32};

struct Tables {
    len: usize,
    count: usize,
    cos: Vec<f32>,
}

#[derive(Default)]
pub struct DctTransform {
    tables: Mutex<Option<Tables>>,
}

impl Transform for DctTransform {
    fn on_format_changed(&mut self, input_format: &BufferFormat) -> Result<FormatChange> {
        let len = input_format.element_array_length.unwrap_or(1);
        *self.tables.lock() = Some(Tables {
            len,
            count: input_format.count,
            cos: Vec::new(),
        });
        Ok(FormatChange {
            output_count: input_format.count,
            output_format: input_format.clone(),
        })
    }

    fn initialize(&mut self) -> Result<()> {
        let mut guard = self.tables.lock();
        let t = guard.as_mut().expect("on_format_changed runs before initialize");
        let mut cos = Vec::with_capacity(t.len * t.len);
        for k in 0..t.len {
            for n in 0..t.len {
                let phase = std::f64::consts::PI / t.len as f64 * (n as f64 + 0.5) * k as f64;
                cos.push(phase.cos() as f32);
            }
        }
        t.cos = cos;
        Ok(())
    }

    fn execute(&self, input: &[u8], output: &mut [u8], _use_simd: bool) -> Result<()> {
        let guard = self.tables.lock();
        let t = guard.as_ref().expect("execute runs after initialize");

        for c in 0..t.count {
            for k in 0..t.len {
                let mut sum = 0.0_f32;
                for n in 0..t.len {
                    sum += read_f32(input, c * t.len + n) * t.cos[k * t.len + n];
                }
                write_f32(output, c * t.len + k, sum);
            }
        }

        validate_f32_block(output, t.count * t.len).map_err(|reason| CoreError::ExecutionError {
            transform: "DCT".to_string(),
            reason,
        })
    }
}

fn schema() -> ParamSchema {
    ParamSchema::new()
}

fn factory(_params: &BTreeMap<String, ParamValue>) -> Box<dyn Transform> {
    Box::<DctTransform>::default()
}

inventory::submit! {
    TransformDescriptor {
        name: "DCT",
        description: "Naive type-II discrete cosine transform.",
        input_kind: "float",
        output_kind: "float",
        params: schema,
        factory,
    }
}
