//! Cooperative stop flag shared between the signal handler and the radio loop.
//!
//! The flag is only observed at loop-iteration boundaries; a transfer or settle
//! delay in progress always completes first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Clonable "stop requested" flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    stop: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop; every clone observes it
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}
