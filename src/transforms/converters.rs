//! Automatically-insertable format converters (spec.md §4.4 step 2).

use std::collections::BTreeMap;

use crate::error::{CoreError, Result};
use crate::format::{BufferFormat, ElementKind};
use crate::param::{ParamSchema, ParamValue};
use crate::registry::{ConverterDescriptor, TransformDescriptor};
use crate::transform::{FormatChange, Transform};

use super::bytes::{read_i16, validate_f32_block, write_f32};

/// Normalizes signed 16-bit PCM into `[-1.0, 1.0]` floats, shape preserved.
#[derive(Default)]
pub struct Int16ToFloatTransform {
    total_len: usize,
}

impl Transform for Int16ToFloatTransform {
    fn on_format_changed(&mut self, input_format: &BufferFormat) -> Result<FormatChange> {
        self.total_len = input_format.count * input_format.element_array_length.unwrap_or(1);
        let output_format = BufferFormat {
            element_kind: ElementKind::Float,
            count: input_format.count,
            sampling_rate: input_format.sampling_rate,
            duration_ms: input_format.duration_ms,
            element_array_length: input_format.element_array_length,
        };
        Ok(FormatChange {
            output_count: input_format.count,
            output_format,
        })
    }

    fn execute(&self, input: &[u8], output: &mut [u8], _use_simd: bool) -> Result<()> {
        for i in 0..self.total_len {
            write_f32(output, i, read_i16(input, i) as f32 / 32_768.0);
        }
        validate_f32_block(output, self.total_len).map_err(|reason| CoreError::ExecutionError {
            transform: "Int16ToFloat".to_string(),
            reason,
        })
    }
}

fn schema() -> ParamSchema {
    ParamSchema::new()
}

fn factory(_params: &BTreeMap<String, ParamValue>) -> Box<dyn Transform> {
    Box::<Int16ToFloatTransform>::default()
}

inventory::submit! {
    TransformDescriptor {
        name: "Int16ToFloat",
        description: "Normalizes int16 PCM to float in [-1.0, 1.0].",
        input_kind: "int16",
        output_kind: "float",
        params: schema,
        factory,
    }
}

inventory::submit! {
    ConverterDescriptor {
        transform_name: "Int16ToFloat",
        from_kind: "int16",
        to_kind: "float",
    }
}
