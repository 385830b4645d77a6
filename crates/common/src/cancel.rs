//! Cooperative cancellation shared between the assembler, the render
//! watchdog, and the CLI signal handler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{ReelError, ReelResult};

/// A cloneable stop flag. Raising it on any clone is visible on all clones.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Return `Err(ReelError::Cancelled)` once the flag has been raised.
    pub fn check(&self) -> ReelResult<()> {
        if self.is_raised() {
            Err(ReelError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_is_shared_between_clones() {
        let flag = StopFlag::new();
        let other = flag.clone();
        assert!(flag.check().is_ok());

        other.raise();
        assert!(flag.is_raised());
        assert!(matches!(flag.check(), Err(ReelError::Cancelled)));
    }
}
