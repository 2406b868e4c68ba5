//! Test helpers shared across confstack crates.

pub mod adapter;
pub mod logger;

pub use adapter::{DeferredAdapter, FailingAdapter, FixedAdapter, record};
pub use logger::RecordingLogger;
