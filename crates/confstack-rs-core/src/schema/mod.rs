//! Declarative schema tree used for validation and key matching.
//!
//! A [`Schema`] is a tagged tree: objects of named fields, wrappers
//! (optional, default, pipe) and leaf types. Key matching only needs the
//! object shapes, which [`Schema::shape`] recovers by unwrapping wrappers.

mod validate;


use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub use validate::{ValidationError, ValidationIssue};

/// Fallible value transform run after the inner schema of a pipe validates.
pub type PipeFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// How an object treats keys it does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Drop undeclared keys from the validated output.
    #[default]
    Strip,
    /// Copy undeclared keys through untouched.
    Passthrough,
}

/// Ordered set of named fields.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: Vec<(String, Schema)>,
    unknown_keys: UnknownKeys,
}

impl ObjectSchema {
    /// Create an empty object schema that strips unknown keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field. Redeclaring a name replaces the earlier schema in place.
    pub fn field(mut self, name: impl Into<String>, schema: Schema) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = schema,
            None => self.fields.push((name, schema)),
        }
        self
    }

    /// Keep undeclared keys in the validated output.
    pub fn passthrough(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Passthrough;
        self
    }

    /// Unknown key policy.
    pub fn unknown_keys(&self) -> UnknownKeys {
        self.unknown_keys
    }

    /// Field schema by exact name.
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, schema)| schema)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.fields
            .iter()
            .map(|(name, schema)| (name.as_str(), schema))
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Schema node.
#[derive(Clone)]
pub enum Schema {
    /// Record of named fields.
    Object(ObjectSchema),
    /// Field may be absent.
    Optional(Box<Schema>),
    /// Field falls back to the given value when absent.
    Default(Box<Schema>, Value),
    /// Validate with the inner schema, then transform the result.
    Pipe(Box<Schema>, PipeFn),
    /// Homogeneous array.
    Array(Box<Schema>),
    /// UTF-8 string.
    String,
    /// Any JSON number; `coerce` accepts numeric strings.
    Number { coerce: bool },
    /// Whole number; `coerce` accepts integer strings.
    Integer { coerce: bool },
    /// Boolean; `coerce` accepts `true/false/1/0/yes/no/on/off` strings.
    Boolean { coerce: bool },
    /// One of a fixed set of strings.
    Enum(Vec<String>),
    /// Anything, passed through unchanged.
    Any,
}

impl Schema {
    /// Object schema from a field set.
    pub fn object(shape: ObjectSchema) -> Self {
        Self::Object(shape)
    }

    pub fn string() -> Self {
        Self::String
    }

    pub fn number() -> Self {
        Self::Number { coerce: false }
    }

    pub fn integer() -> Self {
        Self::Integer { coerce: false }
    }

    pub fn boolean() -> Self {
        Self::Boolean { coerce: false }
    }

    pub fn any() -> Self {
        Self::Any
    }

    /// Array whose items all match `item`.
    pub fn array(item: Schema) -> Self {
        Self::Array(Box::new(item))
    }

    /// String restricted to the given variants.
    pub fn one_of<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(variants.into_iter().map(Into::into).collect())
    }

    /// Accept string input for number, integer and boolean leaves.
    ///
    /// Other nodes are returned unchanged.
    pub fn coerce(self) -> Self {
        match self {
            Self::Number { .. } => Self::Number { coerce: true },
            Self::Integer { .. } => Self::Integer { coerce: true },
            Self::Boolean { .. } => Self::Boolean { coerce: true },
            other => other,
        }
    }

    /// Wrap this schema so the field may be absent.
    pub fn optional(self) -> Self {
        Self::Optional(Box::new(self))
    }

    /// Wrap this schema with a default used when the field is absent.
    pub fn with_default(self, value: impl Into<Value>) -> Self {
        Self::Default(Box::new(self), value.into())
    }

    /// Run `transform` on the validated value.
    pub fn pipe<F>(self, transform: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self::Pipe(Box::new(self), Arc::new(transform))
    }

    /// Object shape, looking through optional, default and pipe wrappers.
    pub fn shape(&self) -> Option<&ObjectSchema> {
        match self {
            Self::Object(shape) => Some(shape),
            Self::Optional(inner) | Self::Default(inner, _) | Self::Pipe(inner, _) => {
                inner.shape()
            }
            _ => None,
        }
    }

    /// Validate a value, returning the normalized output or every issue found.
    pub fn validate(&self, value: &Value) -> Result<Value, ValidationError> {
        validate::validate(self, value)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(shape) => f.debug_tuple("Object").field(shape).finish(),
            Self::Optional(inner) => f.debug_tuple("Optional").field(inner).finish(),
            Self::Default(inner, value) => {
                f.debug_tuple("Default").field(inner).field(value).finish()
            }
            Self::Pipe(inner, _) => f.debug_tuple("Pipe").field(inner).finish_non_exhaustive(),
            Self::Array(item) => f.debug_tuple("Array").field(item).finish(),
            Self::String => f.write_str("String"),
            Self::Number { coerce } => f.debug_struct("Number").field("coerce", coerce).finish(),
            Self::Integer { coerce } => f.debug_struct("Integer").field("coerce", coerce).finish(),
            Self::Boolean { coerce } => f.debug_struct("Boolean").field("coerce", coerce).finish(),
            Self::Enum(variants) => f.debug_tuple("Enum").field(variants).finish(),
            Self::Any => f.write_str("Any"),
        }
    }
}

impl From<ObjectSchema> for Schema {
    fn from(shape: ObjectSchema) -> Self {
        Self::Object(shape)
    }
}
