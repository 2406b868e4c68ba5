//! Core of layered configuration loading.
//!
//! This crate owns the adapter contract, deep merge, per-adapter reshaping
//! (transforms, nesting separators, key matching), schema validation and the
//! loader that ties them together. Concrete adapters live in
//! `confstack-rs-adapters`.

mod adapter;
mod env;
mod error;
mod key_matching;
mod loader;
mod logger;
mod merge;
mod schema;
mod transform;
mod value;

/// Adapter contract and per-adapter settings.
pub use adapter::{
    Adapter, AdapterOptions, AdapterRead, ReadResult, ResolvedAdapterConfig, WithAdapterOptions,
};
pub use env::Environment;
/// Public error types returned by loading and adapter APIs.
pub use error::{AdapterError, ConfigError};
pub use key_matching::{DEFAULT_MAX_DEPTH, KeyMatching, apply_key_matcher, apply_key_matching};
/// Loader entry points.
pub use loader::{
    ErrorCallback, LoadConfig, SuccessCallback, load_config, load_config_as, load_config_sync,
    load_config_sync_as, process_adapter_data,
};
pub use logger::{LogLogger, Logger};
pub use merge::{deep_merge, deep_merge_all, merge_record};
/// Schema tree and validation errors.
pub use schema::{ObjectSchema, PipeFn, Schema, UnknownKeys, ValidationError, ValidationIssue};
pub use transform::{Entry, Transform, TransformResult, apply_transformations, transform_fn};
pub use value::{ConfigRecord, is_mergeable};
