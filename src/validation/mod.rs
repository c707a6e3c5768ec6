//! Field-level validation errors collected across a whole request body.
//!
//! Validation never stops at the first problem: every offending field gets
//! its own list of messages, and nested shapes (the `geometry` object of a
//! polygon) get their own nested map.

pub mod fields;
pub mod messages;

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub use fields::FieldReader;

/// Key used for errors that belong to the object rather than a field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldErrors {
    Messages(Vec<String>),
    Nested(ValidationErrors),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, FieldErrors>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-field shorthand, mostly for storage-level conflicts.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message for `field`. A message already present is not repeated.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let message = message.into();
        let entry = self
            .0
            .entry(field.into())
            .or_insert_with(|| FieldErrors::Messages(Vec::new()));

        match entry {
            FieldErrors::Messages(messages) => {
                if !messages.contains(&message) {
                    messages.push(message);
                }
            }
            // A field that already failed as a nested shape keeps that shape
            FieldErrors::Nested(nested) => nested.add(NON_FIELD_ERRORS, message),
        }
    }

    /// Attach the errors of a nested shape under `field`. Empty maps are dropped.
    pub fn nest(&mut self, field: impl Into<String>, errors: ValidationErrors) {
        if !errors.is_empty() {
            self.0.insert(field.into(), FieldErrors::Nested(errors));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

// Assertion helpers
#[cfg(test)]
impl ValidationErrors {
    pub(crate) fn has_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Flat messages recorded for `field`; empty for absent or nested fields.
    pub(crate) fn messages(&self, field: &str) -> &[String] {
        match self.0.get(field) {
            Some(FieldErrors::Messages(messages)) => messages,
            _ => &[],
        }
    }

    pub(crate) fn nested(&self, field: &str) -> Option<&ValidationErrors> {
        match self.0.get(field) {
            Some(FieldErrors::Nested(nested)) => Some(nested),
            _ => None,
        }
    }

    pub(crate) fn contains(&self, field: &str, message: &str) -> bool {
        self.messages(field).iter().any(|m| m == message)
    }
}

/// Name of a JSON value's shape, spelled the way clients of this API have
/// always seen it in error messages (`dict`, `list`, `str`, `int`, ...).
pub fn json_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
