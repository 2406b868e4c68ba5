//! Rewrites data keys to the names declared by a schema.

use crate::schema::ObjectSchema;
use crate::value::ConfigRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Recursion bound for key matching on deep or pathological inputs.
pub const DEFAULT_MAX_DEPTH: usize = 150;

/// How data keys are compared against schema keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMatching {
    /// Keys are used exactly as read.
    #[default]
    Strict,
    /// Keys match when equal after dropping non-alphanumerics and lowercasing.
    Lenient,
}

impl KeyMatching {
    /// Whether `data_key` should be renamed to `shape_key`.
    pub fn matches(self, shape_key: &str, data_key: &str) -> bool {
        match self {
            Self::Strict => shape_key == data_key,
            Self::Lenient => lenient_eq(shape_key, data_key),
        }
    }
}

/// Rename keys in `data` to match `shape`, recursing into nested object fields.
///
/// Strict matching returns the data untouched.
pub fn apply_key_matching(data: ConfigRecord, shape: &ObjectSchema, mode: KeyMatching) -> ConfigRecord {
    if mode == KeyMatching::Strict {
        return data;
    }
    apply_key_matcher(data, shape, &|a: &str, b: &str| mode.matches(a, b), 0, DEFAULT_MAX_DEPTH)
}

/// Traversal shared by every matching strategy.
///
/// For each data key the first schema key accepted by `matcher` wins; keys
/// without a match are kept as is. Subtrees at or below `max_depth` are
/// returned unchanged.
pub fn apply_key_matcher<F>(
    data: ConfigRecord,
    shape: &ObjectSchema,
    matcher: &F,
    depth: usize,
    max_depth: usize,
) -> ConfigRecord
where
    F: Fn(&str, &str) -> bool,
{
    if depth >= max_depth || data.is_empty() || shape.is_empty() {
        return data;
    }

    let mut output = ConfigRecord::with_capacity(data.len());
    for (key, value) in data {
        let matched = shape.fields().find(|(name, _)| matcher(name, &key));
        let Some((name, field)) = matched else {
            output.insert(key, value);
            continue;
        };

        let value = match (field.shape(), value) {
            (Some(nested), Value::Object(record)) => {
                Value::Object(apply_key_matcher(record, nested, matcher, depth + 1, max_depth))
            }
            (_, value) => value,
        };
        output.insert(name.to_string(), value);
    }
    output
}

fn lenient_eq(a: &str, b: &str) -> bool {
    let mut left = normalized(a);
    let mut right = normalized(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x == y => continue,
            _ => return false,
        }
    }
}

fn normalized(key: &str) -> impl Iterator<Item = char> + '_ {
    key.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(value: Value) -> ConfigRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn nested_shape() -> ObjectSchema {
        ObjectSchema::new().field(
            "foo",
            Schema::object(
                ObjectSchema::new()
                    .field("nestedProp", Schema::string())
                    .field("OTHER_PROP", Schema::string()),
            ),
        )
    }

    #[test]
    fn lenient_matching_is_recursive() {
        let data = record(json!({"FOO": {"NESTED_PROP": "x", "otherProp": "y"}}));
        let output = apply_key_matching(data, &nested_shape(), KeyMatching::Lenient);
        assert_eq!(
            Value::Object(output),
            json!({"foo": {"nestedProp": "x", "OTHER_PROP": "y"}})
        );
    }

    #[test]
    fn strict_matching_is_identity() {
        let data = record(json!({"FOO": {"NESTED_PROP": "x"}}));
        let output = apply_key_matching(data.clone(), &nested_shape(), KeyMatching::Strict);
        assert_eq!(output, data);
    }

    #[test]
    fn unmatched_keys_are_kept() {
        let data = record(json!({"unknown-key": 1, "f_o_o": {"nested-prop": "x"}}));
        let output = apply_key_matching(data, &nested_shape(), KeyMatching::Lenient);
        assert_eq!(
            Value::Object(output),
            json!({"unknown-key": 1, "foo": {"nestedProp": "x"}})
        );
    }

    #[test]
    fn first_matching_schema_key_wins() {
        let shape = ObjectSchema::new()
            .field("apiKey", Schema::string())
            .field("API_KEY", Schema::string());
        let output = apply_key_matching(record(json!({"api-key": "k"})), &shape, KeyMatching::Lenient);
        assert_eq!(Value::Object(output), json!({"apiKey": "k"}));
    }

    #[test]
    fn wrapped_object_fields_are_recursed() {
        let shape = ObjectSchema::new().field(
            "database",
            Schema::object(ObjectSchema::new().field("maxConnections", Schema::integer()))
                .optional()
                .pipe(Ok),
        );
        let data = record(json!({"DATABASE": {"MAX_CONNECTIONS": 5}}));
        let output = apply_key_matching(data, &shape, KeyMatching::Lenient);
        assert_eq!(
            Value::Object(output),
            json!({"database": {"maxConnections": 5}})
        );
    }

    #[test]
    fn non_record_values_are_not_recursed() {
        let data = record(json!({"FOO": ["NESTED_PROP"]}));
        let output = apply_key_matching(data, &nested_shape(), KeyMatching::Lenient);
        assert_eq!(Value::Object(output), json!({"foo": ["NESTED_PROP"]}));
    }

    #[test]
    fn empty_inputs_short_circuit() {
        let output = apply_key_matching(ConfigRecord::new(), &nested_shape(), KeyMatching::Lenient);
        assert!(output.is_empty());

        let data = record(json!({"FOO": 1}));
        let output = apply_key_matching(data.clone(), &ObjectSchema::new(), KeyMatching::Lenient);
        assert_eq!(output, data);
    }

    /// A self-similar schema and data nested far past the bound terminates.
    #[test]
    fn depth_bound_halts_recursion() {
        fn deep_shape(levels: usize) -> ObjectSchema {
            let mut shape = ObjectSchema::new().field("leafValue", Schema::string());
            for _ in 0..levels {
                shape = ObjectSchema::new().field("child", Schema::object(shape));
            }
            shape
        }

        let levels = DEFAULT_MAX_DEPTH + 20;
        let mut data = json!({"LEAF_VALUE": "x"});
        for _ in 0..levels {
            data = json!({ "CHILD": data });
        }

        let output = apply_key_matching(record(data), &deep_shape(levels), KeyMatching::Lenient);

        let mut cursor = &Value::Object(output);
        let mut renamed = 0;
        while let Some(next) = cursor.get("child") {
            renamed += 1;
            cursor = next;
        }
        assert_eq!(renamed, DEFAULT_MAX_DEPTH);
        assert!(cursor.get("CHILD").is_some());
    }

    #[test]
    fn custom_matcher_uses_same_traversal() {
        let shape = ObjectSchema::new().field("Host", Schema::string());
        let data = record(json!({"host": "h"}));
        let output = apply_key_matcher(data, &shape, &|a: &str, b: &str| a.eq_ignore_ascii_case(b), 0, 4);
        assert_eq!(Value::Object(output), json!({"Host": "h"}));
    }
}
