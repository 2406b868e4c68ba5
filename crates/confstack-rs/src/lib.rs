//! Public surface of confstack.
//!
//! This crate re-exports the loader and the adapters and provides a small
//! initialization helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use confstack_rs_adapters as adapters;
/// Re-export for convenience.
pub use confstack_rs_core as core;

pub use confstack_rs_adapters::{
    AdapterSpecifier, AsyncCallbackAdapter, CallbackAdapter, DirectoryAdapter, EnvAdapter,
    FileAdapter, FileFormat, ResolutionVariables, ScriptAdapter, ScriptRunner,
};
pub use confstack_rs_core::{
    Adapter, AdapterError, AdapterRead, ConfigError, ConfigRecord, Entry, Environment,
    KeyMatching, LoadConfig, Logger, ObjectSchema, Schema, TransformResult, ValidationError,
    WithAdapterOptions, load_config, load_config_as, load_config_sync, load_config_sync_as,
    transform_fn,
};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
    log::debug!("confstack logging initialized");
}
