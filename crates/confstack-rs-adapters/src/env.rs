use crate::filter::filtered;
use confstack_rs_core::{
    Adapter, AdapterOptions, AdapterRead, ConfigRecord, Environment, WithAdapterOptions,
};
use regex::Regex;

/// Reads environment variables, or a caller supplied record in their place.
///
/// Without a custom source the process environment is captured on every
/// read, so each load sees a fresh copy.
#[derive(Debug, Clone, Default)]
pub struct EnvAdapter {
    source: Option<ConfigRecord>,
    regex: Option<Regex>,
    options: AdapterOptions,
}

impl EnvAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from a fixed environment snapshot.
    pub fn with_environment(environment: &Environment) -> Self {
        Self::with_record(environment.to_record())
    }

    /// Read from an arbitrary record.
    pub fn with_record(record: ConfigRecord) -> Self {
        Self {
            source: Some(record),
            ..Self::default()
        }
    }

    /// Keep only variables whose name matches `regex`.
    pub fn regex(mut self, regex: Regex) -> Self {
        self.regex = Some(regex);
        self
    }
}

impl Adapter for EnvAdapter {
    fn name(&self) -> &str {
        "env adapter"
    }

    fn read(&self) -> AdapterRead<'_> {
        let data = match &self.source {
            Some(record) => record.clone(),
            None => Environment::capture().to_record(),
        };
        AdapterRead::ready(filtered(data, self.regex.as_ref()))
    }

    fn options(&self) -> &AdapterOptions {
        &self.options
    }
}

impl WithAdapterOptions for EnvAdapter {
    fn options_mut(&mut self) -> &mut AdapterOptions {
        &mut self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn read(adapter: &EnvAdapter) -> Value {
        match adapter.read() {
            AdapterRead::Ready(Ok(record)) => Value::Object(record),
            other => panic!("unexpected read: {other:?}"),
        }
    }

    #[test]
    fn reads_snapshot_with_filter() {
        let environment = Environment::from_iter([("APP_HOST", "h"), ("HOME", "/root")]);
        let adapter = EnvAdapter::with_environment(&environment).regex(Regex::new("^APP_").expect("regex"));
        assert_eq!(read(&adapter), json!({"APP_HOST": "h"}));
    }

    #[test]
    fn custom_record_keeps_value_types() {
        let Value::Object(record) = json!({"port": 8080, "debug": true}) else {
            panic!("object");
        };
        let adapter = EnvAdapter::with_record(record);
        assert_eq!(read(&adapter), json!({"port": 8080, "debug": true}));
    }

    #[test]
    fn process_environment_is_captured_per_read() {
        let adapter = EnvAdapter::new();
        let Value::Object(first) = read(&adapter) else {
            panic!("object");
        };
        assert_eq!(first.len(), Environment::capture().len());
    }
}
