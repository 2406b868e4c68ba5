//! Adapters backed by a single file on disk.

use crate::filter::filtered;
use confstack_rs_core::{
    Adapter, AdapterError, AdapterOptions, AdapterRead, ConfigRecord, WithAdapterOptions,
};
use log::debug;
use regex::Regex;
use serde_json::{Number, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Json,
    Json5,
    Yaml,
    Toml,
    DotEnv,
}

impl FileFormat {
    /// Label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Json5 => "JSON5",
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
            Self::DotEnv => ".env",
        }
    }

    /// Name reported by adapters reading this format.
    pub fn adapter_name(self) -> &'static str {
        match self {
            Self::Json => "json adapter",
            Self::Json5 => "json5 adapter",
            Self::Yaml => "yaml adapter",
            Self::Toml => "toml adapter",
            Self::DotEnv => "dotenv adapter",
        }
    }

    /// Parse file contents into a record.
    ///
    /// Empty and `null` documents yield an empty record; any other
    /// non-object document is rejected.
    pub fn parse(self, contents: &str) -> Result<ConfigRecord, String> {
        let value = match self {
            Self::DotEnv => return parse_dotenv(contents),
            _ if contents.trim().is_empty() => return Ok(ConfigRecord::new()),
            Self::Json => serde_json::from_str::<Value>(contents).map_err(|err| err.to_string())?,
            Self::Json5 => json5::from_str::<Value>(contents).map_err(|err| err.to_string())?,
            Self::Yaml => serde_yaml::from_str::<Value>(contents).map_err(|err| err.to_string())?,
            Self::Toml => {
                let table = toml::from_str::<toml::Table>(contents).map_err(|err| err.to_string())?;
                Value::Object(toml_table(table))
            }
        };
        into_record(value)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reads one file per load and parses it according to its [`FileFormat`].
#[derive(Debug, Clone)]
pub struct FileAdapter {
    path: PathBuf,
    format: FileFormat,
    regex: Option<Regex>,
    options: AdapterOptions,
}

impl FileAdapter {
    pub fn new(format: FileFormat, path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format,
            regex: None,
            options: AdapterOptions::default(),
        }
    }

    pub fn json(path: impl AsRef<Path>) -> Self {
        Self::new(FileFormat::Json, path)
    }

    pub fn json5(path: impl AsRef<Path>) -> Self {
        Self::new(FileFormat::Json5, path)
    }

    pub fn yaml(path: impl AsRef<Path>) -> Self {
        Self::new(FileFormat::Yaml, path)
    }

    pub fn toml(path: impl AsRef<Path>) -> Self {
        Self::new(FileFormat::Toml, path)
    }

    pub fn dotenv(path: impl AsRef<Path>) -> Self {
        Self::new(FileFormat::DotEnv, path)
    }

    /// Keep only top-level keys matching `regex`.
    pub fn regex(mut self, regex: Regex) -> Self {
        self.regex = Some(regex);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    fn read_file(&self) -> Result<ConfigRecord, AdapterError> {
        debug!(
            "reading {} file (path={})",
            self.format,
            self.path.display()
        );
        let data = fs::read_to_string(&self.path)
            .map_err(|err| err.to_string())
            .and_then(|contents| self.format.parse(&contents))
            .map_err(|cause| {
                AdapterError::new(format!(
                    "Failed to parse / read {} file at {}: {cause}",
                    self.format,
                    self.path.display()
                ))
            })?;
        Ok(filtered(data, self.regex.as_ref()))
    }
}

impl Adapter for FileAdapter {
    fn name(&self) -> &str {
        self.format.adapter_name()
    }

    fn read(&self) -> AdapterRead<'_> {
        AdapterRead::Ready(self.read_file())
    }

    fn options(&self) -> &AdapterOptions {
        &self.options
    }
}

impl WithAdapterOptions for FileAdapter {
    fn options_mut(&mut self) -> &mut AdapterOptions {
        &mut self.options
    }
}

fn into_record(value: Value) -> Result<ConfigRecord, String> {
    match value {
        Value::Object(record) => Ok(record),
        Value::Null => Ok(ConfigRecord::new()),
        Value::Array(_) => Err("expected a top-level object, found an array".to_string()),
        other => Err(format!("expected a top-level object, found {other}")),
    }
}

fn parse_dotenv(contents: &str) -> Result<ConfigRecord, String> {
    let mut record = ConfigRecord::new();
    for item in dotenvy::from_read_iter(contents.as_bytes()) {
        let (key, value) = item.map_err(|err| err.to_string())?;
        record.insert(key, Value::String(value));
    }
    Ok(record)
}

fn toml_table(table: toml::Table) -> ConfigRecord {
    table
        .into_iter()
        .map(|(key, value)| (key, toml_value(value)))
        .collect()
}

fn toml_value(value: toml::Value) -> Value {
    match value {
        toml::Value::String(text) => Value::String(text),
        toml::Value::Integer(number) => Value::from(number),
        toml::Value::Float(number) => Number::from_f64(number).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(flag) => Value::Bool(flag),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_value).collect()),
        toml::Value::Table(table) => Value::Object(toml_table(table)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_each_format() {
        let cases = [
            (FileFormat::Json, r#"{"a": {"b": "x"}}"#),
            (FileFormat::Json5, "{ a: { b: 'x', }, // trailing\n}"),
            (FileFormat::Yaml, "a:\n  b: x\n"),
            (FileFormat::Toml, "[a]\nb = \"x\"\n"),
        ];
        for (format, contents) in cases {
            let record = format.parse(contents).expect("parse");
            assert_eq!(Value::Object(record), json!({"a": {"b": "x"}}), "{format}");
        }
    }

    #[test]
    fn dotenv_values_are_strings() {
        let record = FileFormat::DotEnv
            .parse("# comment\nHOST=localhost\nPORT=5432\nQUOTED=\"a b\"\n")
            .expect("parse");
        assert_eq!(
            Value::Object(record),
            json!({"HOST": "localhost", "PORT": "5432", "QUOTED": "a b"})
        );
    }

    #[test]
    fn empty_and_null_documents_are_empty_records() {
        assert!(FileFormat::Json.parse("").expect("empty").is_empty());
        assert!(FileFormat::Json.parse("null").expect("null").is_empty());
        assert!(FileFormat::Yaml.parse("~\n").expect("null").is_empty());
    }

    #[test]
    fn non_object_documents_are_rejected() {
        let err = FileFormat::Json.parse("[1, 2]").unwrap_err();
        assert_eq!(err, "expected a top-level object, found an array");
        assert!(FileFormat::Yaml.parse("just text").is_err());
    }

    #[test]
    fn toml_datetimes_become_strings() {
        let record = FileFormat::Toml
            .parse("released = 1979-05-27T07:32:00Z\nratio = 0.5\n")
            .expect("parse");
        assert_eq!(
            Value::Object(record),
            json!({"released": "1979-05-27T07:32:00Z", "ratio": 0.5})
        );
    }
}
