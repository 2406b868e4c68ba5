//! Adapter contract shared by every configuration source.

use crate::error::AdapterError;
use crate::key_matching::KeyMatching;
use crate::transform::Transform;
use crate::value::ConfigRecord;
use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;

/// Outcome of a single adapter read.
pub type ReadResult = Result<ConfigRecord, AdapterError>;

/// Value returned by [`Adapter::read`].
///
/// `Ready` is a completed (synchronous) read. `Deferred` has to be awaited
/// and is rejected by the synchronous loader.
pub enum AdapterRead<'a> {
    Ready(ReadResult),
    Deferred(BoxFuture<'a, ReadResult>),
}

impl<'a> AdapterRead<'a> {
    /// Completed read carrying a record.
    pub fn ready(record: ConfigRecord) -> Self {
        Self::Ready(Ok(record))
    }

    /// Completed read that failed.
    pub fn failed(error: impl Into<AdapterError>) -> Self {
        Self::Ready(Err(error.into()))
    }

    /// Read that completes once `future` resolves.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = ReadResult> + Send + 'a,
    {
        Self::Deferred(Box::pin(future))
    }

    /// Whether the read has to be awaited.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Await the read regardless of how it was produced.
    pub async fn resolve(self) -> ReadResult {
        match self {
            Self::Ready(result) => result,
            Self::Deferred(future) => future.await,
        }
    }
}

impl fmt::Debug for AdapterRead<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Per-adapter overrides of the loader-wide settings.
///
/// `None` defers to the loader; `Some` always wins, including `Some(false)`.
#[derive(Clone, Default)]
pub struct AdapterOptions {
    pub silent: Option<bool>,
    pub key_matching: Option<KeyMatching>,
    pub transform: Option<Transform>,
    pub nesting_separator: Option<String>,
}

static NO_OPTIONS: AdapterOptions = AdapterOptions {
    silent: None,
    key_matching: None,
    transform: None,
    nesting_separator: None,
};

impl fmt::Debug for AdapterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterOptions")
            .field("silent", &self.silent)
            .field("key_matching", &self.key_matching)
            .field("transform", &self.transform.as_ref().map(|_| ".."))
            .field("nesting_separator", &self.nesting_separator)
            .finish()
    }
}

/// A source of configuration data.
pub trait Adapter: Send + Sync {
    /// Name used in log messages.
    fn name(&self) -> &str;

    /// Read the adapter's data. Called once per load.
    fn read(&self) -> AdapterRead<'_>;

    /// Overrides applied to this adapter's data.
    fn options(&self) -> &AdapterOptions {
        &NO_OPTIONS
    }
}

impl<A: Adapter + ?Sized> Adapter for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read(&self) -> AdapterRead<'_> {
        (**self).read()
    }

    fn options(&self) -> &AdapterOptions {
        (**self).options()
    }
}

impl<A: Adapter + ?Sized> Adapter for std::sync::Arc<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read(&self) -> AdapterRead<'_> {
        (**self).read()
    }

    fn options(&self) -> &AdapterOptions {
        (**self).options()
    }
}

/// Builder methods for adapters that carry [`AdapterOptions`].
pub trait WithAdapterOptions: Sized {
    fn options_mut(&mut self) -> &mut AdapterOptions;

    /// Suppress (or force) the warning logged when this adapter fails.
    fn silent(mut self, silent: bool) -> Self {
        self.options_mut().silent = Some(silent);
        self
    }

    /// Key matching mode for this adapter's data.
    fn key_matching(mut self, key_matching: KeyMatching) -> Self {
        self.options_mut().key_matching = Some(key_matching);
        self
    }

    /// Transform applied to each top-level entry.
    fn transform(mut self, transform: Transform) -> Self {
        self.options_mut().transform = Some(transform);
        self
    }

    /// Split top-level keys on `separator` into nested records.
    fn nesting_separator(mut self, separator: impl Into<String>) -> Self {
        self.options_mut().nesting_separator = Some(separator.into());
        self
    }
}

/// Settings for one adapter after falling back to loader-wide defaults.
#[derive(Clone, Default)]
pub struct ResolvedAdapterConfig {
    pub key_matching: KeyMatching,
    pub silent: bool,
    pub transform: Option<Transform>,
    pub nesting_separator: Option<String>,
}

impl ResolvedAdapterConfig {
    /// Resolve adapter overrides against the loader-wide settings.
    pub fn resolve(
        adapter: &AdapterOptions,
        key_matching: Option<KeyMatching>,
        silent: Option<bool>,
        transform: Option<&Transform>,
    ) -> Self {
        Self {
            key_matching: adapter.key_matching.or(key_matching).unwrap_or_default(),
            silent: adapter.silent.or(silent).unwrap_or(false),
            transform: adapter.transform.clone().or_else(|| transform.cloned()),
            nesting_separator: adapter.nesting_separator.clone(),
        }
    }
}

impl fmt::Debug for ResolvedAdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedAdapterConfig")
            .field("key_matching", &self.key_matching)
            .field("silent", &self.silent)
            .field("transform", &self.transform.as_ref().map(|_| ".."))
            .field("nesting_separator", &self.nesting_separator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Entry, transform_fn};
    use pretty_assertions::assert_eq;

    #[test]
    fn adapter_settings_win_over_loader_settings() {
        let options = AdapterOptions {
            silent: Some(false),
            key_matching: Some(KeyMatching::Strict),
            ..AdapterOptions::default()
        };
        let resolved =
            ResolvedAdapterConfig::resolve(&options, Some(KeyMatching::Lenient), Some(true), None);
        assert_eq!(resolved.silent, false);
        assert_eq!(resolved.key_matching, KeyMatching::Strict);
    }

    #[test]
    fn loader_settings_fill_gaps() {
        let global = transform_fn(|entry: Entry| entry);
        let resolved = ResolvedAdapterConfig::resolve(
            &AdapterOptions::default(),
            Some(KeyMatching::Lenient),
            Some(true),
            Some(&global),
        );
        assert_eq!(resolved.silent, true);
        assert_eq!(resolved.key_matching, KeyMatching::Lenient);
        assert!(resolved.transform.is_some());
        assert_eq!(resolved.nesting_separator, None);
    }

    #[test]
    fn defaults_are_strict_and_loud() {
        let resolved = ResolvedAdapterConfig::resolve(&AdapterOptions::default(), None, None, None);
        assert_eq!(resolved.silent, false);
        assert_eq!(resolved.key_matching, KeyMatching::Strict);
        assert!(resolved.transform.is_none());
    }

    #[tokio::test]
    async fn deferred_reads_resolve() {
        let read = AdapterRead::deferred(async { Ok(ConfigRecord::new()) });
        assert!(read.is_deferred());
        assert_eq!(read.resolve().await, Ok(ConfigRecord::new()));

        let failed = AdapterRead::failed("boom");
        assert!(!failed.is_deferred());
        assert_eq!(failed.resolve().await.unwrap_err().message(), "boom");
    }
}
