//! The synthetic root's transform, and a pass-through usable anywhere a
//! feature chain names it explicitly.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::format::BufferFormat;
use crate::param::{ParamSchema, ParamValue};
use crate::registry::TransformDescriptor;
use crate::transform::{FormatChange, Transform};

pub struct IdentityTransform;

impl Transform for IdentityTransform {
    fn on_format_changed(&mut self, input_format: &BufferFormat) -> Result<FormatChange> {
        Ok(FormatChange {
            output_count: input_format.count,
            output_format: input_format.clone(),
        })
    }

    fn execute(&self, input: &[u8], output: &mut [u8], _use_simd: bool) -> Result<()> {
        let n = input.len().min(output.len());
        output[..n].copy_from_slice(&input[..n]);
        Ok(())
    }
}

fn schema() -> ParamSchema {
    ParamSchema::new()
}

fn factory(_params: &BTreeMap<String, ParamValue>) -> Box<dyn Transform> {
    Box::new(IdentityTransform)
}

inventory::submit! {
    TransformDescriptor {
        name: "Identity",
        description: "Passes its input through unchanged; used for the synthetic root and as a no-op splice point.",
        input_kind: "any",
        output_kind: "any",
        params: schema,
        factory,
    }
}
