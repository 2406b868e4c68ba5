//! Schema validation for merged configuration values.

use super::{ObjectSchema, Schema, UnknownKeys};
use crate::value::type_name;
use serde_json::{Map, Number, Value};
use std::fmt;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Field path from the root, e.g. `["database", "port"]`.
    pub path: Vec<String>,
    /// What went wrong.
    pub message: String,
}

impl ValidationIssue {
    /// Dotted rendering of the path, `root` for the top level.
    pub fn dotted_path(&self) -> String {
        if self.path.is_empty() {
            "root".to_string()
        } else {
            self.path.join(".")
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.dotted_path(), self.message)
    }
}

/// Every issue found while validating a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Issues in the order they were found.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Consume the error, returning its issues.
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join("; "))
    }
}

impl std::error::Error for ValidationError {}

pub(super) fn validate(schema: &Schema, value: &Value) -> Result<Value, ValidationError> {
    let mut checker = Checker::default();
    let output = checker.check(schema, Some(value));
    if checker.issues.is_empty() {
        Ok(output.unwrap_or(Value::Null))
    } else {
        Err(ValidationError {
            issues: checker.issues,
        })
    }
}

#[derive(Default)]
struct Checker {
    path: Vec<String>,
    issues: Vec<ValidationIssue>,
}

impl Checker {
    /// Check a possibly-absent value. `None` in the result means "leave the key out".
    fn check(&mut self, schema: &Schema, value: Option<&Value>) -> Option<Value> {
        match schema {
            Schema::Optional(inner) => match value {
                None | Some(Value::Null) => None,
                Some(value) => self.check(inner, Some(value)),
            },
            Schema::Default(inner, fallback) => self.check(inner, Some(value.unwrap_or(fallback))),
            Schema::Pipe(inner, transform) => {
                let before = self.issues.len();
                let output = self.check(inner, value)?;
                if self.issues.len() > before {
                    return None;
                }
                match transform(output) {
                    Ok(value) => Some(value),
                    Err(message) => {
                        self.issue(message);
                        None
                    }
                }
            }
            _ => {
                let Some(value) = value else {
                    self.issue("Required");
                    return None;
                };
                self.check_present(schema, value)
            }
        }
    }

    fn check_present(&mut self, schema: &Schema, value: &Value) -> Option<Value> {
        match schema {
            Schema::Object(shape) => self.check_object(shape, value),
            Schema::Array(item) => self.check_array(item, value),
            Schema::String => match value {
                Value::String(_) => Some(value.clone()),
                _ => self.expected("string", value),
            },
            Schema::Number { coerce } => match value {
                Value::Number(_) => Some(value.clone()),
                Value::String(text) if *coerce => match coerce_number(text) {
                    Some(number) => Some(Value::Number(number)),
                    None => self.expected("number", value),
                },
                _ => self.expected("number", value),
            },
            Schema::Integer { coerce } => match value {
                Value::Number(number) => match integer_from(number) {
                    Some(number) => Some(Value::Number(number)),
                    None => {
                        self.issue("Expected integer, received float");
                        None
                    }
                },
                Value::String(text) if *coerce => match text.trim().parse::<i64>() {
                    Ok(parsed) => Some(Value::from(parsed)),
                    Err(_) => self.expected("integer", value),
                },
                _ => self.expected("integer", value),
            },
            Schema::Boolean { coerce } => match value {
                Value::Bool(_) => Some(value.clone()),
                Value::String(text) if *coerce => match coerce_bool(text) {
                    Some(flag) => Some(Value::Bool(flag)),
                    None => self.expected("boolean", value),
                },
                _ => self.expected("boolean", value),
            },
            Schema::Enum(variants) => match value {
                Value::String(text) if variants.iter().any(|variant| variant == text) => {
                    Some(value.clone())
                }
                _ => {
                    let expected: Vec<String> =
                        variants.iter().map(|variant| format!("'{variant}'")).collect();
                    self.issue(format!(
                        "Invalid enum value. Expected {}, received {}",
                        expected.join(" | "),
                        value
                    ));
                    None
                }
            },
            Schema::Any => Some(value.clone()),
            Schema::Optional(_) | Schema::Default(..) | Schema::Pipe(..) => {
                self.check(schema, Some(value))
            }
        }
    }

    fn check_object(&mut self, shape: &ObjectSchema, value: &Value) -> Option<Value> {
        let Value::Object(map) = value else {
            return self.expected("object", value);
        };

        let mut output = Map::new();
        for (name, field) in shape.fields() {
            self.path.push(name.to_string());
            if let Some(checked) = self.check(field, map.get(name)) {
                output.insert(name.to_string(), checked);
            }
            self.path.pop();
        }

        if shape.unknown_keys() == UnknownKeys::Passthrough {
            for (key, entry) in map {
                if shape.get(key).is_none() {
                    output.insert(key.clone(), entry.clone());
                }
            }
        }

        Some(Value::Object(output))
    }

    fn check_array(&mut self, item: &Schema, value: &Value) -> Option<Value> {
        let Value::Array(entries) = value else {
            return self.expected("array", value);
        };

        let mut output = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            self.path.push(idx.to_string());
            output.push(self.check(item, Some(entry)).unwrap_or(Value::Null));
            self.path.pop();
        }
        Some(Value::Array(output))
    }

    fn expected(&mut self, expected: &str, value: &Value) -> Option<Value> {
        self.issue(format!(
            "Expected {expected}, received {}",
            type_name(value)
        ));
        None
    }

    fn issue(&mut self, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: self.path.clone(),
            message: message.into(),
        });
    }
}

fn coerce_number(text: &str) -> Option<Number> {
    let text = text.trim();
    if let Ok(parsed) = text.parse::<i64>() {
        return Some(Number::from(parsed));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

fn integer_from(number: &Number) -> Option<Number> {
    if number.is_i64() || number.is_u64() {
        return Some(number.clone());
    }
    let float = number.as_f64()?;
    if float.fract() == 0.0 && float >= i64::MIN as f64 && float <= i64::MAX as f64 {
        Some(Number::from(float as i64))
    } else {
        None
    }
}

fn coerce_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
