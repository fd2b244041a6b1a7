//! `Selector`: truncates or zero-pads to a fixed output length. Typically
//! the last transform before a feature-tagged leaf.

use std::collections::BTreeMap;

use crate::error::{CoreError, Result};
use crate::format::BufferFormat;
use crate::param::{ParamSchema, ParamSpec, ParamValue};
use crate::registry::TransformDescriptor;
use crate::transform::{FormatChange, Transform};

use super::bytes::{read_f32, validate_f32_block, write_f32};

pub struct SelectorTransform {
    length: usize,
    in_len: usize,
    count: usize,
}

impl SelectorTransform {
    fn new(length: usize) -> Self {
        Self {
            length,
            in_len: 0,
            count: 0,
        }
    }
}

impl Transform for SelectorTransform {
    fn on_format_changed(&mut self, input_format: &BufferFormat) -> Result<FormatChange> {
        self.in_len = input_format.element_array_length.unwrap_or(1);
        self.count = input_format.count;
        let mut output_format = input_format.clone();
        output_format.element_array_length = Some(self.length);
        Ok(FormatChange {
            output_count: input_format.count,
            output_format,
        })
    }

    fn execute(&self, input: &[u8], output: &mut [u8], _use_simd: bool) -> Result<()> {
        let copy_len = self.length.min(self.in_len);
        for c in 0..self.count {
            for i in 0..copy_len {
                write_f32(output, c * self.length + i, read_f32(input, c * self.in_len + i));
            }
            for i in copy_len..self.length {
                write_f32(output, c * self.length + i, 0.0);
            }
        }

        validate_f32_block(output, self.count * self.length).map_err(|reason| {
            CoreError::ExecutionError {
                transform: "Selector".to_string(),
                reason,
            }
        })
    }
}

fn validate_length(value: &ParamValue) -> std::result::Result<(), String> {
    match value {
        ParamValue::Int(n) if *n >= 1 => Ok(()),
        ParamValue::Int(n) => Err(format!("length must be >= 1, got {n}")),
        _ => Err("length must be an integer".to_string()),
    }
}

fn schema() -> ParamSchema {
    ParamSchema::new().with(
        "length",
        ParamSpec::new("output element count", ParamValue::Int(13)).with_validator(validate_length),
    )
}

fn factory(params: &BTreeMap<String, ParamValue>) -> Box<dyn Transform> {
    let length = match params.get("length") {
        Some(ParamValue::Int(n)) => *n as usize,
        _ => 13,
    };
    Box::new(SelectorTransform::new(length))
}

inventory::submit! {
    TransformDescriptor {
        name: "Selector",
        description: "Truncates or zero-pads to a fixed element count.",
        input_kind: "float",
        output_kind: "float",
        params: schema,
        factory,
    }
}
