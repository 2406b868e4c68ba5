use confstack_rs_core::{
    Adapter, AdapterError, AdapterOptions, AdapterRead, ConfigRecord, WithAdapterOptions,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Convert a JSON object literal into a record.
pub fn record(value: Value) -> ConfigRecord {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

#[derive(Debug, Clone)]
pub struct FixedAdapter {
    name: String,
    data: ConfigRecord,
    options: AdapterOptions,
    reads: Arc<Mutex<usize>>,
}

impl FixedAdapter {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data: record(data),
            options: AdapterOptions::default(),
            reads: Arc::new(Mutex::new(0)),
        }
    }

    pub fn read_count(&self) -> usize {
        *self.reads.lock()
    }
}

impl Adapter for FixedAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> AdapterRead<'_> {
        *self.reads.lock() += 1;
        AdapterRead::ready(self.data.clone())
    }

    fn options(&self) -> &AdapterOptions {
        &self.options
    }
}

impl WithAdapterOptions for FixedAdapter {
    fn options_mut(&mut self) -> &mut AdapterOptions {
        &mut self.options
    }
}

#[derive(Debug, Clone)]
pub struct FailingAdapter {
    name: String,
    message: String,
    deferred: bool,
    options: AdapterOptions,
}

impl FailingAdapter {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            deferred: false,
            options: AdapterOptions::default(),
        }
    }

    /// Fail only once the read is awaited.
    pub fn deferred(mut self) -> Self {
        self.deferred = true;
        self
    }
}

impl Adapter for FailingAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> AdapterRead<'_> {
        let error = AdapterError::new(self.message.clone());
        if self.deferred {
            AdapterRead::deferred(async move { Err(error) })
        } else {
            AdapterRead::Ready(Err(error))
        }
    }

    fn options(&self) -> &AdapterOptions {
        &self.options
    }
}

impl WithAdapterOptions for FailingAdapter {
    fn options_mut(&mut self) -> &mut AdapterOptions {
        &mut self.options
    }
}

/// Adapter whose data arrives after a delay.
///
/// Records when each read started and finished against a shared clock so
/// tests can check that reads overlap.
#[derive(Debug, Clone)]
pub struct DeferredAdapter {
    name: String,
    data: ConfigRecord,
    delay: Duration,
    options: AdapterOptions,
    events: Arc<Mutex<Vec<String>>>,
}

impl DeferredAdapter {
    pub fn new(name: impl Into<String>, data: Value, delay: Duration) -> Self {
        Self {
            name: name.into(),
            data: record(data),
            delay,
            options: AdapterOptions::default(),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Share an event log with other adapters.
    pub fn with_events(mut self, events: Arc<Mutex<Vec<String>>>) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl Adapter for DeferredAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> AdapterRead<'_> {
        AdapterRead::deferred(async move {
            self.events.lock().push(format!("start {}", self.name));
            tokio::time::sleep(self.delay).await;
            self.events.lock().push(format!("end {}", self.name));
            Ok(self.data.clone())
        })
    }

    fn options(&self) -> &AdapterOptions {
        &self.options
    }
}

impl WithAdapterOptions for DeferredAdapter {
    fn options_mut(&mut self) -> &mut AdapterOptions {
        &mut self.options
    }
}
