//! Configuration sources for confstack.
//!
//! Every adapter implements [`confstack_rs_core::Adapter`] and carries the
//! shared [`AdapterOptions`](confstack_rs_core::AdapterOptions) builders via
//! [`WithAdapterOptions`](confstack_rs_core::WithAdapterOptions).

mod callback;
mod directory;
mod env;
mod file;
mod filter;
mod script;

pub use callback::{AsyncCallbackAdapter, CallbackAdapter};
/// Environment-aware directory scanning.
pub use directory::{
    AdapterFactory, AdapterSpecifier, DirectoryAdapter, ResolutionVariables, ResolvedFile,
    allowed_basenames,
};
pub use env::EnvAdapter;
pub use file::{FileAdapter, FileFormat};
pub use filter::filter_by_regex;
pub use script::{ScriptAdapter, ScriptRunner};
