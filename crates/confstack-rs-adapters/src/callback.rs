//! Adapters backed by caller supplied functions.

use confstack_rs_core::{Adapter, AdapterOptions, AdapterRead, ReadResult, WithAdapterOptions};
use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;

type ReadFn = Box<dyn Fn() -> ReadResult + Send + Sync>;
type AsyncReadFn = Box<dyn Fn() -> BoxFuture<'static, ReadResult> + Send + Sync>;

/// Adapter whose data comes from a synchronous closure.
pub struct CallbackAdapter {
    name: String,
    read: ReadFn,
    options: AdapterOptions,
}

impl CallbackAdapter {
    pub fn new<F>(name: impl Into<String>, read: F) -> Self
    where
        F: Fn() -> ReadResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            read: Box::new(read),
            options: AdapterOptions::default(),
        }
    }
}

impl Adapter for CallbackAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> AdapterRead<'_> {
        AdapterRead::Ready((self.read)())
    }

    fn options(&self) -> &AdapterOptions {
        &self.options
    }
}

impl WithAdapterOptions for CallbackAdapter {
    fn options_mut(&mut self) -> &mut AdapterOptions {
        &mut self.options
    }
}

impl fmt::Debug for CallbackAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackAdapter")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Adapter whose data comes from a future produced on every read.
///
/// Reads are always deferred, so this adapter only works with the async loader.
pub struct AsyncCallbackAdapter {
    name: String,
    read: AsyncReadFn,
    options: AdapterOptions,
}

impl AsyncCallbackAdapter {
    pub fn new<F, Fut>(name: impl Into<String>, read: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ReadResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            read: Box::new(move || Box::pin(read())),
            options: AdapterOptions::default(),
        }
    }
}

impl Adapter for AsyncCallbackAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> AdapterRead<'_> {
        AdapterRead::Deferred((self.read)())
    }

    fn options(&self) -> &AdapterOptions {
        &self.options
    }
}

impl WithAdapterOptions for AsyncCallbackAdapter {
    fn options_mut(&mut self) -> &mut AdapterOptions {
        &mut self.options
    }
}

impl fmt::Debug for AsyncCallbackAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncCallbackAdapter")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
