//! Parameter values and schemas for registered transforms (spec.md §4.1, §4.3).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A bound parameter value. The parser only ever produces raw strings; the
/// registry's [`ParamSchema`] is what assigns a type by attempting to parse
/// the raw token against the schema entry's default variant.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Str(v) => write!(f, "{v}"),
        }
    }
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamValue::Int(a), ParamValue::Int(b)) => a == b,
            (ParamValue::Float(a), ParamValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ParamValue::Bool(a), ParamValue::Bool(b)) => a == b,
            (ParamValue::Str(a), ParamValue::Str(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for ParamValue {}

impl std::hash::Hash for ParamValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            ParamValue::Int(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            ParamValue::Float(v) => {
                1u8.hash(state);
                v.to_bits().hash(state);
            }
            ParamValue::Bool(v) => {
                2u8.hash(state);
                v.hash(state);
            }
            ParamValue::Str(v) => {
                3u8.hash(state);
                v.hash(state);
            }
        }
    }
}

/// Parses a raw token (bare or already-unquoted string) into a [`ParamValue`]
/// matching the shape of `default`.
fn parse_as(default: &ParamValue, raw: &str) -> std::result::Result<ParamValue, String> {
    match default {
        ParamValue::Int(_) => raw
            .parse::<i64>()
            .map(ParamValue::Int)
            .map_err(|_| format!("expected an integer, got `{raw}`")),
        ParamValue::Float(_) => raw
            .parse::<f64>()
            .map(ParamValue::Float)
            .map_err(|_| format!("expected a float, got `{raw}`")),
        ParamValue::Bool(_) => match raw {
            "true" => Ok(ParamValue::Bool(true)),
            "false" => Ok(ParamValue::Bool(false)),
            _ => Err(format!("expected `true` or `false`, got `{raw}`")),
        },
        ParamValue::Str(_) => Ok(ParamValue::Str(raw.to_string())),
    }
}

/// A validator rejects a value by returning `Err(reason)`.
pub type Validator = fn(&ParamValue) -> std::result::Result<(), String>;

fn accept_any(_: &ParamValue) -> std::result::Result<(), String> {
    Ok(())
}

#[derive(Clone)]
pub struct ParamSpec {
    pub description: &'static str,
    pub default: ParamValue,
    pub validator: Validator,
}

impl ParamSpec {
    pub const fn new(description: &'static str, default: ParamValue) -> Self {
        Self {
            description,
            default,
            validator: accept_any,
        }
    }

    pub const fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }
}

/// The set of parameters a registered transform recognizes, with defaults
/// and validators (spec.md §4.1).
#[derive(Clone, Default)]
pub struct ParamSchema(pub BTreeMap<&'static str, ParamSpec>);

impl ParamSchema {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, name: &'static str, spec: ParamSpec) -> Self {
        self.0.insert(name, spec);
        self
    }

    /// Normalizes a raw (possibly partial) string-keyed parameter map:
    /// unknown names fail, absent names take their default, present names
    /// are parsed and validated. The returned map is a `BTreeMap` so that
    /// two semantically identical parameter sets normalize to `Eq` values
    /// (spec.md §4.4: "Normalization resolves absent params to their
    /// declared defaults, so two syntactically different requests with
    /// identical effective parameters share").
    pub fn normalize(
        &self,
        transform: &str,
        raw: &BTreeMap<String, String>,
    ) -> crate::error::Result<BTreeMap<String, ParamValue>> {
        for key in raw.keys() {
            if !self.0.contains_key(key.as_str()) {
                return Err(crate::error::CoreError::InvalidParameterName {
                    transform: transform.to_string(),
                    param: key.clone(),
                });
            }
        }

        let mut out = BTreeMap::new();
        for (&name, spec) in self.0.iter() {
            let value = match raw.get(name) {
                Some(token) => {
                    let parsed = parse_as(&spec.default, token).map_err(|reason| {
                        crate::error::CoreError::InvalidParameterValue {
                            transform: transform.to_string(),
                            param: name.to_string(),
                            value: token.clone(),
                            reason,
                        }
                    })?;
                    (spec.validator)(&parsed).map_err(|reason| {
                        crate::error::CoreError::InvalidParameterValue {
                            transform: transform.to_string(),
                            param: name.to_string(),
                            value: token.clone(),
                            reason,
                        }
                    })?;
                    parsed
                }
                None => spec.default.clone(),
            };
            out.insert(name.to_string(), value);
        }
        Ok(out)
    }

    pub fn describe(&self) -> BTreeMap<String, (String, String)> {
        self.0
            .iter()
            .map(|(name, spec)| {
                (
                    name.to_string(),
                    (spec.description.to_string(), spec.default.to_string()),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_fills_defaults() {
        let schema = ParamSchema::new().with(
            "length",
            ParamSpec::new("window length in samples", ParamValue::Int(32)),
        );
        let raw = BTreeMap::new();
        let normalized = schema.normalize("Window", &raw).unwrap();
        assert_eq!(normalized.get("length"), Some(&ParamValue::Int(32)));
    }

    #[test]
    fn normalize_rejects_unknown_param() {
        let schema = ParamSchema::new();
        let mut raw = BTreeMap::new();
        raw.insert("bogus".to_string(), "1".to_string());
        assert!(schema.normalize("Window", &raw).is_err());
    }

    #[test]
    fn normalize_rejects_bad_value() {
        let schema = ParamSchema::new().with(
            "length",
            ParamSpec::new("window length in samples", ParamValue::Int(32)),
        );
        let mut raw = BTreeMap::new();
        raw.insert("length".to_string(), "not-a-number".to_string());
        assert!(schema.normalize("Window", &raw).is_err());
    }
}
