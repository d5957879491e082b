//! # Typed response decoding
//!
//! Decoders work field by field and never stop at the first bad field. Every
//! failure found anywhere in the structure, nested objects and arrays
//! included, ends up in one ordered `ParsingErrors` list.
//!
//! A missing or `null` value is an error only when the field is required;
//! otherwise the parser's fallback is used.

mod api_error;
mod fields;
mod primitives;

use std::fmt;

use serde_json::Value;

pub use api_error::*;
pub use fields::*;
pub use primitives::*;

pub(crate) static NULL: Value = Value::Null;

/// A single field-level decoding failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingError {
    pub message: String,
}

impl ParsingError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn missing_required(key: Option<&str>, type_name: &str) -> Self {
        Self::new(format!(
            "Found null for required data '{}' when parsing '{}'",
            key.unwrap_or_default(),
            type_name
        ))
    }

    pub fn unexpected_kind(value: &Value, key: Option<&str>, type_name: &str) -> Self {
        Self::new(format!(
            "Expected value '{}' for key '{}' to be a '{}'",
            value,
            key.unwrap_or_default(),
            type_name
        ))
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Non-empty list of decoding failures, in the order they were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingErrors(Vec<ParsingError>);

impl ParsingErrors {
    pub fn single(error: ParsingError) -> Self {
        Self(vec![error])
    }

    /// `None` when there is nothing to report.
    pub fn from_vec(errors: Vec<ParsingError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParsingError> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ParsingError] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<ParsingError> {
        self.0
    }
}

impl fmt::Display for ParsingErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParsingErrors {}

impl IntoIterator for ParsingErrors {
    type Item = ParsingError;
    type IntoIter = std::vec::IntoIter<ParsingError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Either a decoded value or every failure found while decoding it.
pub type ParsingResult<T> = Result<T, ParsingErrors>;

/// Decodes one kind of JSON node into a typed value.
pub trait JsonParser {
    type Output;

    /// Name used in error messages.
    fn type_name(&self) -> &'static str;

    /// Whether the node has the right JSON kind for this parser.
    fn can_parse(&self, value: &Value) -> bool;

    /// Decodes a node that already passed `can_parse`.
    fn parse_value(&self, value: &Value) -> ParsingResult<Self::Output>;

    /// Value used when an optional field is missing or `null`.
    fn fallback(&self) -> Self::Output;

    /// Decodes `json[key]`, or `json` itself when no key is given.
    fn parse_node(
        &self,
        json: &Value,
        key: Option<&str>,
        required: bool,
    ) -> ParsingResult<Self::Output> {
        let value = match key {
            Some(key) => json.get(key).unwrap_or(&NULL),
            None => json,
        };

        if value.is_null() {
            return if required {
                Err(ParsingErrors::single(ParsingError::missing_required(
                    key,
                    self.type_name(),
                )))
            } else {
                Ok(self.fallback())
            };
        }

        if !self.can_parse(value) {
            return Err(ParsingErrors::single(ParsingError::unexpected_kind(
                value,
                key,
                self.type_name(),
            )));
        }

        self.parse_value(value)
    }

    /// Parses raw response text, then decodes it like `parse_node`.
    fn parse_str(
        &self,
        raw: &str,
        key: Option<&str>,
        required: bool,
    ) -> ParsingResult<Self::Output> {
        let json: Value = serde_json::from_str(raw).map_err(|e| {
            ParsingErrors::single(ParsingError::new(format!(
                "Response body is not valid JSON: {e}"
            )))
        })?;
        self.parse_node(&json, key, required)
    }
}
