use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Whoever owns the session gets told when the server rejects it.
pub trait SessionHandler: Send + Sync + 'static {
    fn invalidate(&self, reason: &str);
}

/// Rejection shuts the console down.
impl SessionHandler for CancellationToken {
    fn invalidate(&self, _reason: &str) {
        self.cancel();
    }
}

/// Forwards the first rejection to the [`SessionHandler`] and swallows the rest.
#[derive(Clone)]
pub struct SessionGuard {
    handler: Arc<dyn SessionHandler>,
    torn_down: Arc<AtomicBool>,
}

impl SessionGuard {
    pub fn new(handler: impl SessionHandler) -> Self {
        Self {
            handler: Arc::new(handler),
            torn_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns true only for the call that actually tore the session down.
    pub fn escalate(&self, reason: &str) -> bool {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return false;
        }

        warn!(reason, "session rejected, tearing down");
        self.handler.invalidate(reason);
        true
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }
}
