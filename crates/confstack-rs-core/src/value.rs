//! Value model shared by every stage of the pipeline.

use serde_json::{Map, Value};

/// A string-keyed record of configuration values.
///
/// Insertion order is preserved, which matters for key matching where the
/// first schema key that matches wins.
pub type ConfigRecord = Map<String, Value>;

/// Whether a value is a plain record that merge and key matching may recurse into.
///
/// Only objects qualify. Arrays, `null` and scalars are always replaced wholesale.
pub fn is_mergeable(value: &Value) -> bool {
    matches!(value, Value::Object(_))
}

/// Human readable type name used in messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
