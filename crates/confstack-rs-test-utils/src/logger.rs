use confstack_rs_core::Logger;
use parking_lot::Mutex;
use std::sync::Arc;

/// Logger that keeps every warning for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    warnings: Arc<Mutex<Vec<String>>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }
}

impl Logger for RecordingLogger {
    fn warn(&self, message: &str) {
        self.warnings.lock().push(message.to_string());
    }
}
