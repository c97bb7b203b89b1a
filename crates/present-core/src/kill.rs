//! Kill trigger shared between a process and its output limiter.

use std::sync::Arc;

use tokio::sync::Notify;

/// Cloneable, fire-and-forget kill request.
///
/// Triggering never blocks. A trigger sent before anyone waits is remembered,
/// so the owner of the child observes it on its next `triggered().await`.
#[derive(Debug, Clone, Default)]
pub struct KillSwitch {
    notify: Arc<Notify>,
}

impl KillSwitch {
    /// Create a new, untriggered switch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a kill.
    pub fn trigger(&self) {
        self.notify.notify_one();
    }

    /// Wait for a kill request.
    pub async fn triggered(&self) {
        self.notify.notified().await;
    }
}
