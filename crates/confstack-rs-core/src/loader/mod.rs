//! Config loading: read every adapter, reshape, merge and validate.
//!
//! Adapters are read in the order they were registered and merged with later
//! adapters taking precedence. A failing adapter never aborts a load; it is
//! logged (unless silenced) and contributes nothing.


use crate::adapter::{Adapter, AdapterRead, ReadResult, ResolvedAdapterConfig};
use crate::env::Environment;
use crate::error::ConfigError;
use crate::key_matching::{KeyMatching, apply_key_matching};
use crate::logger::{LogLogger, Logger};
use crate::merge::deep_merge_all;
use crate::schema::{ObjectSchema, Schema, ValidationError};
use crate::transform::{Transform, apply_transformations};
use crate::value::ConfigRecord;
use futures_util::future::join_all;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Called with the validated config.
pub type SuccessCallback = Box<dyn Fn(&Value) + Send + Sync>;
/// Called with validation issues. Registering one makes validation failures non fatal.
pub type ErrorCallback = Box<dyn Fn(&ValidationError) + Send + Sync>;

/// Everything a single load needs: schema, adapters and loader-wide settings.
pub struct LoadConfig {
    schema: Schema,
    adapters: Vec<Box<dyn Adapter>>,
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
    logger: Arc<dyn Logger>,
    key_matching: Option<KeyMatching>,
    silent: Option<bool>,
    transform: Option<Transform>,
    environment: Option<Environment>,
}

impl LoadConfig {
    /// Start a load for `schema` with no adapters.
    pub fn new(schema: impl Into<Schema>) -> Self {
        Self {
            schema: schema.into(),
            adapters: Vec::new(),
            on_success: None,
            on_error: None,
            logger: Arc::new(LogLogger),
            key_matching: None,
            silent: None,
            transform: None,
            environment: None,
        }
    }

    /// Append an adapter. Later adapters override earlier ones.
    pub fn adapter(mut self, adapter: impl Adapter + 'static) -> Self {
        self.adapters.push(Box::new(adapter));
        self
    }

    /// Append several adapters in order.
    pub fn adapters<I>(mut self, adapters: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn Adapter>>,
    {
        self.adapters.extend(adapters);
        self
    }

    pub fn on_success(mut self, callback: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    /// Handle validation failures instead of returning them.
    ///
    /// The load then resolves to an empty object when validation fails.
    pub fn on_error(
        mut self,
        callback: impl Fn(&ValidationError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Sink for adapter failure warnings. Defaults to [`LogLogger`].
    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    /// Key matching used by adapters that do not set their own.
    pub fn key_matching(mut self, key_matching: KeyMatching) -> Self {
        self.key_matching = Some(key_matching);
        self
    }

    /// Silence adapter failure warnings for adapters that do not set their own.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = Some(silent);
        self
    }

    /// Transform used by adapters that do not set their own.
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Environment validated when no adapters are registered.
    ///
    /// Defaults to a snapshot of the process environment taken at load time.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn adapter_count(&self) -> usize {
        self.adapters.len()
    }

    /// Settings `adapter` ends up with after falling back to this loader's.
    pub fn resolve_adapter(&self, adapter: &dyn Adapter) -> ResolvedAdapterConfig {
        ResolvedAdapterConfig::resolve(
            adapter.options(),
            self.key_matching,
            self.silent,
            self.transform.as_ref(),
        )
    }

    /// Shorthand for [`load_config`].
    pub async fn load(&self) -> Result<Value, ConfigError> {
        load_config(self).await
    }

    /// Shorthand for [`load_config_sync`].
    pub fn load_sync(&self) -> Result<Value, ConfigError> {
        load_config_sync(self)
    }

    fn environment_record(&self) -> ConfigRecord {
        match &self.environment {
            Some(environment) => environment.to_record(),
            None => Environment::capture().to_record(),
        }
    }

    /// Turn per-adapter read results into one merged record.
    fn merge_reads<'a>(
        &self,
        reads: impl IntoIterator<Item = (&'a (dyn Adapter + 'static), ReadResult)>,
    ) -> Result<ConfigRecord, ConfigError> {
        let shape = self.schema.shape();
        let mut records = Vec::with_capacity(self.adapters.len());
        for (adapter, result) in reads {
            let resolved = self.resolve_adapter(adapter);
            let data = match result {
                Ok(data) => data,
                Err(err) => {
                    if resolved.silent {
                        debug!("adapter {} failed silently: {}", adapter.name(), err);
                    } else {
                        self.logger
                            .warn(&format!("Cannot read data from {}: {}", adapter.name(), err));
                    }
                    ConfigRecord::new()
                }
            };
            records.push(process_adapter_data(data, shape, &resolved)?);
        }
        Ok(deep_merge_all(records))
    }

    fn finish(&self, data: ConfigRecord) -> Result<Outcome, ConfigError> {
        match self.schema.validate(&Value::Object(data)) {
            Ok(config) => {
                info!("config validated (adapters={})", self.adapters.len());
                if let Some(on_success) = &self.on_success {
                    on_success(&config);
                }
                Ok(Outcome::Validated(config))
            }
            Err(err) => {
                debug!("config failed validation: {err}");
                match &self.on_error {
                    Some(on_error) => {
                        on_error(&err);
                        Ok(Outcome::Handled)
                    }
                    None => Err(ConfigError::Validation(err)),
                }
            }
        }
    }
}

impl fmt::Debug for LoadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.adapters.iter().map(|adapter| adapter.name()).collect();
        f.debug_struct("LoadConfig")
            .field("schema", &self.schema)
            .field("adapters", &names)
            .field("key_matching", &self.key_matching)
            .field("silent", &self.silent)
            .field("transform", &self.transform.as_ref().map(|_| ".."))
            .field("environment", &self.environment.as_ref().map(Environment::len))
            .finish()
    }
}

/// Result of a load before it is turned into a public return value.
enum Outcome {
    Validated(Value),
    /// Validation failed and `on_error` took it.
    Handled,
}

impl Outcome {
    fn into_value(self) -> Value {
        match self {
            Self::Validated(config) => config,
            Self::Handled => Value::Object(ConfigRecord::new()),
        }
    }
}

/// Apply one adapter's transform, nesting separator and key matching.
pub fn process_adapter_data(
    data: ConfigRecord,
    shape: Option<&ObjectSchema>,
    resolved: &ResolvedAdapterConfig,
) -> Result<ConfigRecord, ConfigError> {
    let data = apply_transformations(
        data,
        resolved.transform.as_ref(),
        resolved.nesting_separator.as_deref(),
    )?;
    Ok(match shape {
        Some(shape) => apply_key_matching(data, shape, resolved.key_matching),
        None => data,
    })
}

/// Load config, awaiting every adapter concurrently.
///
/// All reads are started before any is awaited, but data is always merged
/// in registration order. Returns the validated value, or an empty object
/// when validation fails and an `on_error` callback is registered.
pub async fn load_config(config: &LoadConfig) -> Result<Value, ConfigError> {
    Ok(load_outcome(config).await?.into_value())
}

/// Load config without awaiting.
///
/// Fails with [`ConfigError::SyncAdapterMisuse`] as soon as an adapter
/// returns a deferred read.
pub fn load_config_sync(config: &LoadConfig) -> Result<Value, ConfigError> {
    Ok(load_outcome_sync(config)?.into_value())
}

/// [`load_config`] decoded into `T`. `Ok(None)` means `on_error` handled a failure.
pub async fn load_config_as<T: DeserializeOwned>(
    config: &LoadConfig,
) -> Result<Option<T>, ConfigError> {
    decode(load_outcome(config).await?)
}

/// [`load_config_sync`] decoded into `T`. `Ok(None)` means `on_error` handled a failure.
pub fn load_config_sync_as<T: DeserializeOwned>(
    config: &LoadConfig,
) -> Result<Option<T>, ConfigError> {
    decode(load_outcome_sync(config)?)
}

fn decode<T: DeserializeOwned>(outcome: Outcome) -> Result<Option<T>, ConfigError> {
    match outcome {
        Outcome::Validated(config) => Ok(Some(serde_json::from_value(config)?)),
        Outcome::Handled => Ok(None),
    }
}

async fn load_outcome(config: &LoadConfig) -> Result<Outcome, ConfigError> {
    if config.adapters.is_empty() {
        debug!("no adapters registered; validating environment");
        return config.finish(config.environment_record());
    }

    debug!("reading config from {} adapter(s)", config.adapters.len());
    let pending: Vec<_> = config
        .adapters
        .iter()
        .map(|adapter| adapter.read().resolve())
        .collect();
    let results = join_all(pending).await;

    let reads = config
        .adapters
        .iter()
        .map(|adapter| adapter.as_ref())
        .zip(results);
    let merged = config.merge_reads(reads)?;
    config.finish(merged)
}

fn load_outcome_sync(config: &LoadConfig) -> Result<Outcome, ConfigError> {
    if config.adapters.is_empty() {
        debug!("no adapters registered; validating environment");
        return config.finish(config.environment_record());
    }

    debug!(
        "reading config synchronously from {} adapter(s)",
        config.adapters.len()
    );
    let mut reads = Vec::with_capacity(config.adapters.len());
    for adapter in &config.adapters {
        match adapter.read() {
            AdapterRead::Ready(result) => reads.push((adapter.as_ref(), result)),
            AdapterRead::Deferred(_) => {
                return Err(ConfigError::SyncAdapterMisuse {
                    adapter: adapter.name().to_string(),
                });
            }
        }
    }
    let merged = config.merge_reads(reads)?;
    config.finish(merged)
}
