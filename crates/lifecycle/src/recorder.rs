//! Audit events.

use tracing::{info, warn};

/// Sink for controller audit events, keyed by a short reason.
pub trait EventRecorder: Send + Sync {
    fn warning(&self, reason: &str, message: &str);
    fn event(&self, reason: &str, message: &str);
}

/// Records events as structured log lines.
#[derive(Debug, Clone)]
pub struct TracingRecorder {
    controller: String,
}

impl TracingRecorder {
    pub fn new(controller: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
        }
    }
}

impl EventRecorder for TracingRecorder {
    fn warning(&self, reason: &str, message: &str) {
        warn!(controller = %self.controller, reason, "{message}");
    }

    fn event(&self, reason: &str, message: &str) {
        info!(controller = %self.controller, reason, "{message}");
    }
}
