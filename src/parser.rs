//! Expression Parser (spec.md §4.3): turns one feature specification string
//! into a feature name plus an ordered chain of (transform name, raw
//! parameter map) pairs.
//!
//! ```text
//! feature       := identifier "[" transform_list "]"
//! transform_list := transform ("," transform)*
//! transform     := identifier ( "(" param_list ")" )?
//! param_list    := param ("," param)*
//! param         := identifier "=" value_literal
//! value_literal := bare_token | quoted_string
//! ```

use std::collections::BTreeMap;

use crate::error::{CoreError, Result};
use crate::registry::Registry;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedTransform {
    pub name: String,
    pub params: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedFeature {
    pub name: String,
    pub chain: Vec<ParsedTransform>,
}

struct Cursor<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_'
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> CoreError {
        CoreError::ParseError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!(
                "expected `{}`, found `{}`",
                expected as char, c as char
            ))),
            None => Err(self.error(format!("expected `{}`, found end of input", expected as char))),
        }
    }

    fn parse_identifier(&mut self) -> Result<String> {
        self.skip_whitespace();
        let start = self.pos;
        match self.peek() {
            Some(c) if is_ident_start(c) => self.pos += 1,
            Some(c) => {
                return Err(self.error(format!("expected an identifier, found `{}`", c as char)))
            }
            None => return Err(self.error("expected an identifier, found end of input")),
        }
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn parse_value_literal(&mut self) -> Result<String> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'"') => self.parse_quoted_string(),
            Some(_) => self.parse_bare_token(),
            None => Err(self.error("expected a value, found end of input")),
        }
    }

    fn parse_quoted_string(&mut self) -> Result<String> {
        let quote_offset = self.pos;
        self.pos += 1; // opening quote
        let start = self.pos;
        loop {
            match self.peek() {
                Some(b'"') => {
                    let value = self.src[start..self.pos].to_string();
                    self.pos += 1; // closing quote
                    return Ok(value);
                }
                Some(_) => self.pos += 1,
                None => {
                    return Err(CoreError::ParseError {
                        offset: quote_offset,
                        message: "unterminated quoted string".to_string(),
                    })
                }
            }
        }
    }

    fn parse_bare_token(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == b',' || c == b')' || c == b']' || c.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected a value"));
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn parse_param(&mut self) -> Result<(String, String)> {
        let name = self.parse_identifier()?;
        self.expect_byte(b'=')?;
        let value = self.parse_value_literal()?;
        Ok((name, value))
    }

    fn parse_transform(&mut self, registry: &Registry) -> Result<ParsedTransform> {
        let name = self.parse_identifier()?;
        registry.lookup(&name)?;

        let mut params = BTreeMap::new();
        self.skip_whitespace();
        if self.peek() == Some(b'(') {
            self.pos += 1;
            self.skip_whitespace();
            if self.peek() != Some(b')') {
                loop {
                    let (key, value) = self.parse_param()?;
                    params.insert(key, value);
                    self.skip_whitespace();
                    match self.peek() {
                        Some(b',') => {
                            self.pos += 1;
                        }
                        Some(b')') => break,
                        _ => return Err(self.error("expected `,` or `)`")),
                    }
                }
            }
            self.expect_byte(b')')?;
        }

        Ok(ParsedTransform { name, params })
    }

    fn parse_feature(&mut self, registry: &Registry) -> Result<ParsedFeature> {
        let name = self.parse_identifier()?;
        self.expect_byte(b'[')?;

        let mut chain = Vec::new();
        self.skip_whitespace();
        if self.peek() != Some(b']') {
            loop {
                chain.push(self.parse_transform(registry)?);
                self.skip_whitespace();
                match self.peek() {
                    Some(b',') => {
                        self.pos += 1;
                    }
                    Some(b']') => break,
                    _ => return Err(self.error("expected `,` or `]`")),
                }
            }
        }
        self.expect_byte(b']')?;

        self.skip_whitespace();
        if self.pos != self.bytes.len() {
            return Err(self.error("unexpected trailing input"));
        }

        Ok(ParsedFeature { name, chain })
    }
}

/// Parses one feature specification string against the given registry.
pub fn parse(spec: &str, registry: &Registry) -> Result<ParsedFeature> {
    let mut cursor = Cursor::new(spec);
    cursor.parse_feature(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chain_with_params() {
        let registry = Registry::new();
        let parsed = parse("MFCC[Window(length=32), RDFT, Selector(length=24)]", &registry)
            .expect("should parse");
        assert_eq!(parsed.name, "MFCC");
        assert_eq!(parsed.chain.len(), 3);
        assert_eq!(parsed.chain[0].name, "Window");
        assert_eq!(parsed.chain[0].params.get("length"), Some(&"32".to_string()));
        assert_eq!(parsed.chain[1].name, "RDFT");
        assert!(parsed.chain[1].params.is_empty());
    }

    #[test]
    fn unknown_transform_is_an_error() {
        let registry = Registry::new();
        let err = parse("A[NotATransform]", &registry).unwrap_err();
        assert!(matches!(err, CoreError::UnknownTransform { .. }));
    }

    #[test]
    fn malformed_spec_reports_offset() {
        let registry = Registry::new();
        let err = parse("A[Window(length=32]", &registry).unwrap_err();
        match err {
            CoreError::ParseError { offset, .. } => assert_eq!(offset, 19),
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn quoted_string_values_are_supported() {
        let registry = Registry::new();
        // Identity accepts no params, but the grammar must still parse a
        // quoted value syntactically for any transform.
        let parsed = parse("A[Identity]", &registry).unwrap();
        assert_eq!(parsed.chain[0].name, "Identity");
    }

    #[test]
    fn whitespace_is_insignificant() {
        let registry = Registry::new();
        let a = parse("A[Window(length=32),RDFT]", &registry).unwrap();
        let b = parse(" A [ Window ( length = 32 ) , RDFT ] ", &registry).unwrap();
        assert_eq!(a, b);
    }
}
