//! Per-entry transforms and nesting separator expansion.

use crate::ConfigError;
use crate::value::ConfigRecord;
use serde_json::Value;
use std::sync::Arc;

/// One top-level key/value pair handed to a transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: Value,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// What a transform wants done with an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformResult {
    /// Keep the (possibly rewritten) entry.
    Keep(Entry),
    /// Drop the entry.
    Drop,
    /// Untyped result: `false` drops, an object with both `key` and `value`
    /// keeps, anything else is a contract violation. A non-string `key` is
    /// used as its JSON text.
    Raw(Value),
}

impl From<Entry> for TransformResult {
    fn from(entry: Entry) -> Self {
        Self::Keep(entry)
    }
}

impl From<Option<Entry>> for TransformResult {
    fn from(entry: Option<Entry>) -> Self {
        entry.map_or(Self::Drop, Self::Keep)
    }
}

/// Caller supplied per-entry transform.
pub type Transform = Arc<dyn Fn(Entry) -> TransformResult + Send + Sync>;

/// Wrap a closure as a [`Transform`].
pub fn transform_fn<F, R>(f: F) -> Transform
where
    F: Fn(Entry) -> R + Send + Sync + 'static,
    R: Into<TransformResult>,
{
    Arc::new(move |entry| f(entry).into())
}

/// Apply the transform and then the nesting separator to every top-level entry.
///
/// With neither supplied the data is returned as is. Only top-level keys are
/// split; nested records are left alone.
pub fn apply_transformations(
    data: ConfigRecord,
    transform: Option<&Transform>,
    nesting_separator: Option<&str>,
) -> Result<ConfigRecord, ConfigError> {
    let separator = nesting_separator.filter(|separator| !separator.is_empty());
    if transform.is_none() && separator.is_none() {
        return Ok(data);
    }

    let mut output = ConfigRecord::new();
    for (key, value) in data {
        let entry = match transform {
            Some(transform) => match resolve(&key, transform(Entry { key: key.clone(), value }))? {
                Some(entry) => entry,
                None => continue,
            },
            None => Entry { key, value },
        };

        match separator {
            Some(separator) => insert_nested(&mut output, entry, separator)?,
            None => {
                output.insert(entry.key, entry.value);
            }
        }
    }
    Ok(output)
}

fn resolve(key: &str, result: TransformResult) -> Result<Option<Entry>, ConfigError> {
    match result {
        TransformResult::Keep(entry) => Ok(Some(entry)),
        TransformResult::Drop | TransformResult::Raw(Value::Bool(false)) => Ok(None),
        TransformResult::Raw(raw) => match (raw.get("key"), raw.get("value")) {
            (Some(new_key), Some(value)) => Ok(Some(Entry {
                key: property_key(new_key),
                value: value.clone(),
            })),
            _ => Err(ConfigError::TransformContractViolation {
                key: key.to_string(),
                received: raw.to_string(),
            }),
        },
    }
}

fn property_key(key: &Value) -> String {
    match key {
        Value::String(key) => key.clone(),
        other => other.to_string(),
    }
}

/// Split `entry.key` on `separator` and assign the value at the nested path.
fn insert_nested(target: &mut ConfigRecord, entry: Entry, separator: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = entry.key.split(separator).collect();
    let (leaf, parents) = match parts.split_last() {
        Some(split) => split,
        None => return Ok(()),
    };

    let mut current = target;
    for (idx, part) in parents.iter().enumerate() {
        let slot = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(ConfigRecord::new()));
        current = match slot {
            Value::Object(map) => map,
            _ => {
                let conflicting = parts[..=idx].join(separator);
                return Err(ConfigError::NestedKeyConflict(format!(
                    "Cannot create nested object at \"{conflicting}\" because it already exists as a primitive value. Conflicting key: \"{}\" and \"{conflicting}\"",
                    entry.key
                )));
            }
        };
    }

    if matches!(current.get(*leaf), Some(Value::Object(_) | Value::Array(_))) {
        return Err(ConfigError::NestedKeyConflict(format!(
            "\"{}\" cannot be assigned because \"{}\" already exists as an object (created by another key)",
            entry.key, entry.key
        )));
    }
    current.insert(leaf.to_string(), entry.value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(value: Value) -> ConfigRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn no_transformations_returns_data() {
        let data = record(json!({"a": 1, "b.c": 2}));
        let output = apply_transformations(data.clone(), None, None).expect("output");
        assert_eq!(output, data);
    }

    #[test]
    fn transform_rewrites_entries() {
        let transform = transform_fn(|entry: Entry| {
            Entry::new(entry.key.to_uppercase(), format!("transformed_{}", entry.value.as_str().unwrap_or("")))
        });
        let data = record(json!({"key1": "value1", "key2": "value2"}));
        let output = apply_transformations(data, Some(&transform), None).expect("output");
        assert_eq!(
            Value::Object(output),
            json!({"KEY1": "transformed_value1", "KEY2": "transformed_value2"})
        );
    }

    #[test]
    fn transform_can_drop_entries() {
        let transform = transform_fn(|entry: Entry| {
            (!entry.key.starts_with("drop")).then(|| Entry::new(entry.key, "transformed"))
        });
        let data = record(json!({"keep": 1, "drop": 2, "keep2": 3}));
        let output = apply_transformations(data, Some(&transform), None).expect("output");
        assert_eq!(
            Value::Object(output),
            json!({"keep": "transformed", "keep2": "transformed"})
        );
    }

    #[test]
    fn raw_results_follow_the_contract() {
        let transform: Transform = Arc::new(|entry: Entry| match entry.key.as_str() {
            "dropped" => TransformResult::Raw(json!(false)),
            _ => TransformResult::Raw(json!({"key": format!("raw_{}", entry.key), "value": entry.value})),
        });
        let data = record(json!({"dropped": 1, "kept": 2}));
        let output = apply_transformations(data, Some(&transform), None).expect("output");
        assert_eq!(Value::Object(output), json!({"raw_kept": 2}));
    }

    #[test]
    fn invalid_raw_result_is_fatal() {
        let cases = [
            (json!("invalid"), "\"invalid\""),
            (json!({"value": "test"}), "{\"value\":\"test\"}"),
            (json!({"key": "test"}), "{\"key\":\"test\"}"),
        ];
        for (raw, rendered) in cases {
            let transform: Transform = Arc::new(move |_: Entry| TransformResult::Raw(raw.clone()));
            let err = apply_transformations(record(json!({"key1": "v"})), Some(&transform), None)
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                format!(
                    "Invalid transform result for key \"key1\": expected {{ key: string, value: unknown }} or false, received: {rendered}"
                )
            );
        }
    }

    #[test]
    fn nesting_separator_builds_records() {
        let data = record(json!({"database.host": "localhost", "database.port": "5432", "name": "app"}));
        let output = apply_transformations(data, None, Some(".")).expect("output");
        assert_eq!(
            Value::Object(output),
            json!({"database": {"host": "localhost", "port": "5432"}, "name": "app"})
        );
    }

    #[test]
    fn multi_character_separator() {
        let data = record(json!({"APP__DB__HOST": "h", "APP__DB__PORT": 1}));
        let output = apply_transformations(data, None, Some("__")).expect("output");
        assert_eq!(
            Value::Object(output),
            json!({"APP": {"DB": {"HOST": "h", "PORT": 1}}})
        );
    }

    #[test]
    fn primitive_then_nested_conflicts() {
        let data = record(json!({"database": "x", "database.host": "y"}));
        let err = apply_transformations(data, None, Some(".")).unwrap_err();
        assert!(matches!(err, ConfigError::NestedKeyConflict(_)));
        assert!(err.to_string().contains("already exists as a primitive value"));
    }

    #[test]
    fn nested_then_primitive_conflicts() {
        let data = record(json!({"database.host": "y", "database": "x"}));
        let err = apply_transformations(data, None, Some(".")).unwrap_err();
        assert!(err.to_string().contains("cannot be assigned because"));
        assert!(err.to_string().contains("already exists as an object"));
    }

    #[test]
    fn array_leaf_conflicts() {
        let transform = transform_fn(|entry: Entry| Entry::new("servers", entry.value));
        let data = record(json!({"hosts": ["a", "b"], "primary": "a"}));
        let err = apply_transformations(data, Some(&transform), Some(".")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Nested key conflict: \"servers\" cannot be assigned because \"servers\" already exists as an object (created by another key)"
        );
    }

    #[test]
    fn raw_key_need_not_be_a_string() {
        let transform: Transform =
            Arc::new(|entry: Entry| TransformResult::Raw(json!({"key": 42, "value": entry.value})));
        let output = apply_transformations(record(json!({"answer": true})), Some(&transform), None)
            .expect("output");
        assert_eq!(Value::Object(output), json!({"42": true}));
    }

    #[test]
    fn nested_values_are_not_split() {
        let data = record(json!({"outer.key": {"inner.key": 1}}));
        let output = apply_transformations(data, None, Some(".")).expect("output");
        assert_eq!(Value::Object(output), json!({"outer": {"key": {"inner.key": 1}}}));
    }

    #[test]
    fn transform_runs_before_nesting() {
        let transform = transform_fn(|entry: Entry| {
            (entry.key != "SKIP").then(|| Entry::new(entry.key.to_lowercase().replace('_', "."), entry.value))
        });
        let data = record(json!({"DB_HOST": "h", "SKIP": 1, "DB_PORT": 2}));
        let output = apply_transformations(data, Some(&transform), Some(".")).expect("output");
        assert_eq!(Value::Object(output), json!({"db": {"host": "h", "port": 2}}));
    }
}
