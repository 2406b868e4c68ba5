//! Deep merge helpers for layered configuration.

use crate::value::ConfigRecord;
use serde_json::Value;

/// Merge every source into `target` left to right, later sources winning.
///
/// - Records are merged key by key, recursively.
/// - Arrays, scalars and `null` replace whatever was there.
/// - A record landing on a non-record slot is cloned in, never aliased.
///
/// Merging is incremental: `deep_merge(t, [a, b])` equals
/// `deep_merge(deep_merge(t, [a]), [b])`.
pub fn deep_merge<'a>(
    mut target: ConfigRecord,
    sources: impl IntoIterator<Item = &'a ConfigRecord>,
) -> ConfigRecord {
    for source in sources {
        merge_record(&mut target, source);
    }
    target
}

/// Merge owned records in order into a fresh record.
///
/// Equivalent to [`deep_merge`] starting from an empty record, but moves the
/// sources instead of cloning them.
pub fn deep_merge_all(records: impl IntoIterator<Item = ConfigRecord>) -> ConfigRecord {
    records
        .into_iter()
        .fold(ConfigRecord::new(), |mut target, source| {
            merge_owned(&mut target, source);
            target
        })
}

/// Merge a borrowed source record into the target.
pub fn merge_record(target: &mut ConfigRecord, source: &ConfigRecord) {
    for (key, value) in source {
        let Value::Object(nested) = value else {
            target.insert(key.clone(), value.clone());
            continue;
        };
        match target.get_mut(key) {
            Some(Value::Object(existing)) => merge_record(existing, nested),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

fn merge_owned(target: &mut ConfigRecord, source: ConfigRecord) {
    for (key, value) in source {
        let Value::Object(nested) = value else {
            target.insert(key, value);
            continue;
        };
        match target.get_mut(&key) {
            Some(Value::Object(existing)) => merge_owned(existing, nested),
            _ => {
                target.insert(key, Value::Object(nested));
            }
        }
    }
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
    fn later_sources_override_earlier() {
        let a = record(json!({"a": 1, "b": 2}));
        let b = record(json!({"b": 3, "c": 4}));
        let merged = deep_merge(ConfigRecord::new(), [&a, &b]);
        assert_eq!(Value::Object(merged), json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn nested_records_merge_recursively() {
        let base = record(json!({"server": {"host": "localhost", "port": 8080}, "debug": true}));
        let overlay = record(json!({"server": {"port": 9000}}));
        let merged = deep_merge(base, [&overlay]);
        assert_eq!(
            Value::Object(merged),
            json!({"server": {"host": "localhost", "port": 9000}, "debug": true})
        );
    }

    #[test]
    fn absent_keys_never_override() {
        let base = record(json!({"a": 1}));
        let overlay = record(json!({"c": []}));
        let merged = deep_merge(base, [&overlay]);
        assert_eq!(Value::Object(merged), json!({"a": 1, "c": []}));
    }

    #[test]
    fn null_overrides_everything() {
        let base = record(json!({"a": 1, "b": {"c": 2}}));
        let overlay = record(json!({"a": null, "b": null}));
        let merged = deep_merge(base, [&overlay]);
        assert_eq!(Value::Object(merged), json!({"a": null, "b": null}));
    }

    #[test]
    fn arrays_replace_instead_of_merging() {
        let base = record(json!({"a": [1, 2]}));
        let overlay = record(json!({"a": [3, 4]}));
        let merged = deep_merge(base, [&overlay]);
        assert_eq!(Value::Object(merged), json!({"a": [3, 4]}));
    }

    #[test]
    fn record_replaces_primitive_and_back() {
        let base = record(json!({"value": 42, "other": {"x": 1}}));
        let overlay = record(json!({"value": {"nested": true}, "other": "flat"}));
        let merged = deep_merge(base, [&overlay]);
        assert_eq!(
            Value::Object(merged),
            json!({"value": {"nested": true}, "other": "flat"})
        );
    }

    #[test]
    fn zero_sources_returns_target() {
        let base = record(json!({"a": {"b": 1}}));
        let merged = deep_merge(base.clone(), [] as [&ConfigRecord; 0]);
        assert_eq!(merged, base);
    }

    #[test]
    fn merge_is_left_associative() {
        let a = record(json!({"a": {"x": 1, "y": [1]}, "k": "a"}));
        let b = record(json!({"a": {"y": [2], "z": {"deep": 1}}, "k": null}));
        let c = record(json!({"a": {"z": {"deeper": 2}}, "k": "c"}));

        let all_at_once = deep_merge(ConfigRecord::new(), [&a, &b, &c]);
        let stepwise = deep_merge(deep_merge(ConfigRecord::new(), [&a, &b]), [&c]);
        assert_eq!(all_at_once, stepwise);
        assert_eq!(all_at_once, deep_merge_all([a, b, c]));
    }

    #[test]
    fn merged_target_does_not_alias_sources() {
        let source = record(json!({"nested": {"value": 1}}));
        let mut merged = deep_merge(ConfigRecord::new(), [&source]);
        if let Some(Value::Object(nested)) = merged.get_mut("nested") {
            nested.insert("value".to_string(), json!(2));
        }
        assert_eq!(Value::Object(source), json!({"nested": {"value": 1}}));
        assert_eq!(Value::Object(merged), json!({"nested": {"value": 2}}));
    }
}
