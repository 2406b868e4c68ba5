//! Sink for warnings raised while loading.

/// Receives warnings about adapters that failed to read.
pub trait Logger: Send + Sync {
    fn warn(&self, message: &str);
}

/// Default logger forwarding to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLogger;

impl Logger for LogLogger {
    fn warn(&self, message: &str) {
        log::warn!("{message}");
    }
}

impl<L: Logger + ?Sized> Logger for std::sync::Arc<L> {
    fn warn(&self, message: &str) {
        (**self).warn(message);
    }
}
