//! Transform Registry (spec.md §4.1): a process-wide, read-only-after-init
//! directory mapping a transform name to its factory and schema.
//!
//! Populated the way the teacher registers pluggable sinks/sources/transforms
//! — via `inventory::submit! { ... }` at each call site, collected lazily
//! into a lookup table the first time the registry is touched.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;

use crate::error::{CoreError, Result};
use crate::param::{ParamSchema, ParamValue};
use crate::transform::{Transform, TransformInstance};

/// A statically-registered transform: its name, human description, the
/// coarse input/output "kind" it declares (used only to decide whether a
/// format converter must be spliced in — the concrete format is resolved
/// per-edge at compile time), its parameter schema, and its factory.
pub struct TransformDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_kind: &'static str,
    pub output_kind: &'static str,
    pub params: fn() -> ParamSchema,
    pub factory: fn(&BTreeMap<String, ParamValue>) -> Box<dyn Transform>,
}

inventory::collect!(TransformDescriptor);

/// A registered automatic format converter: instantiating `transform_name`
/// converts a buffer of kind `from_kind` into one of kind `to_kind`.
pub struct ConverterDescriptor {
    pub transform_name: &'static str,
    pub from_kind: &'static str,
    pub to_kind: &'static str,
}

inventory::collect!(ConverterDescriptor);

struct RegistryIndex {
    transforms: HashMap<&'static str, &'static TransformDescriptor>,
    converters: Vec<&'static ConverterDescriptor>,
}

static INDEX: Lazy<RegistryIndex> = Lazy::new(|| {
    let transforms = inventory::iter::<TransformDescriptor>()
        .map(|d| (d.name, d))
        .collect();
    let converters = inventory::iter::<ConverterDescriptor>().collect();
    RegistryIndex {
        transforms,
        converters,
    }
});

/// The process-wide transform registry. Stateless — all state lives in the
/// lazily-built [`INDEX`], safe for concurrent reads once initialized.
#[derive(Clone, Copy, Default)]
pub struct Registry;

impl Registry {
    pub fn new() -> Self {
        Registry
    }

    /// Names of every registered transform, in a stable (sorted) order.
    pub fn enumerate(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = INDEX.transforms.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn lookup(&self, name: &str) -> Result<&'static TransformDescriptor> {
        INDEX
            .transforms
            .get(name)
            .copied()
            .ok_or_else(|| CoreError::UnknownTransform {
                name: name.to_string(),
            })
    }

    /// `(from_kind, to_kind)` pairs for which a converter can be inserted
    /// automatically.
    pub fn enumerate_format_converters(&self) -> Vec<(&'static str, &'static str)> {
        INDEX
            .converters
            .iter()
            .map(|c| (c.from_kind, c.to_kind))
            .collect()
    }

    /// Finds a converter transform name for the given kind pair, if any is
    /// registered.
    pub fn find_converter(&self, from_kind: &str, to_kind: &str) -> Option<&'static str> {
        INDEX
            .converters
            .iter()
            .find(|c| c.from_kind == from_kind && c.to_kind == to_kind)
            .map(|c| c.transform_name)
    }

    /// Normalizes `raw_params` against the transform's schema and
    /// instantiates it (spec.md §4.1): unknown names fail with
    /// `InvalidParameterName`, bad values with `InvalidParameterValue`,
    /// absent ones take their default.
    pub fn instantiate(
        &self,
        name: &str,
        raw_params: &BTreeMap<String, String>,
    ) -> Result<TransformInstance> {
        let descriptor = self.lookup(name)?;
        let schema = (descriptor.params)();
        let normalized = schema.normalize(name, raw_params)?;
        let inner = (descriptor.factory)(&normalized);
        Ok(TransformInstance::new(
            descriptor.name.to_string(),
            normalized,
            inner,
        ))
    }

    /// Normalizes `raw_params` without instantiating — used by the Graph
    /// Builder to compute the identity a chain step would share on, before
    /// committing to a new node.
    pub fn normalize_params(
        &self,
        name: &str,
        raw_params: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, ParamValue>> {
        let descriptor = self.lookup(name)?;
        (descriptor.params)().normalize(name, raw_params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_always_registered() {
        let registry = Registry::new();
        assert!(registry.lookup("Identity").is_ok());
    }

    #[test]
    fn unknown_transform_errors() {
        let registry = Registry::new();
        assert!(matches!(
            registry.lookup("DoesNotExist"),
            Err(CoreError::UnknownTransform { .. })
        ));
    }

    #[test]
    fn enumerate_is_sorted_and_stable() {
        let registry = Registry::new();
        let a = registry.enumerate();
        let b = registry.enumerate();
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(a, sorted);
    }
}
