use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::NeighborhoodError;

/// Cooperative cancellation flag shared between the engine and whoever
/// wants to interrupt it, typically a UI thread while a worker computes.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub(crate) fn reset(&self) {
        self.cancelled.store(false, Ordering::Relaxed);
    }

    pub(crate) fn check(&self) -> Result<(), NeighborhoodError> {
        if self.is_cancelled() {
            Err(NeighborhoodError::Cancelled)
        } else {
            Ok(())
        }
    }
}
