//! Host clock collaborator.
//!
//! Windows close when the host height moves past them; the market never
//! advances the clock itself.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Monotonically non-decreasing block height.
pub trait HostClock {
    fn height(&self) -> u64;
}

impl<C: HostClock + ?Sized> HostClock for Arc<C> {
    fn height(&self) -> u64 {
        (**self).height()
    }
}

/// Clock driven by hand, for tests and simulations.
///
/// Share it behind an [`Arc`] to advance it while the market holds a handle.
#[derive(Debug, Default)]
pub struct ManualClock {
    height: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn new(height: u64) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    /// Move forward by `blocks`; returns the new height.
    pub fn advance(&self, blocks: u64) -> u64 {
        let previous = self
            .height
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |h| {
                Some(h.saturating_add(blocks))
            })
            .unwrap_or_else(|h| h);
        previous.saturating_add(blocks)
    }

    /// Jump to `height`. Heights never go backwards; a lower value is ignored.
    pub fn set(&self, height: u64) {
        self.height.fetch_max(height, Ordering::SeqCst);
    }
}

impl HostClock for ManualClock {
    fn height(&self) -> u64 {
        self.height.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_and_set() {
        let clock = ManualClock::new(5);
        assert_eq!(clock.height(), 5);
        assert_eq!(clock.advance(3), 8);
        clock.set(20);
        assert_eq!(clock.height(), 20);
    }

    #[test]
    fn never_goes_backwards() {
        let clock = ManualClock::new(10);
        clock.set(4);
        assert_eq!(clock.height(), 10);
    }

    #[test]
    fn shared_handle_sees_updates() {
        let clock = Arc::new(ManualClock::default());
        let handle = Arc::clone(&clock);
        clock.advance(7);
        assert_eq!(handle.height(), 7);
    }
}
