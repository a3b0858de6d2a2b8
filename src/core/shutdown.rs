//! Cooperative stop signalling for stage threads
//!
//! Stage loops never get interrupted; they poll a shared flag between
//! bounded waits on their input queue and wind down once it is set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared, clonable stop flag
///
/// All clones observe the same flag. Setting it is idempotent.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stop_requested: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop
    pub fn trigger(&self) {
        // Pairs with the Acquire load in is_set
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Check whether a stop has been requested
    pub fn is_set(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_stop_signal_starts_clear() {
        let signal = StopSignal::new();
        assert!(!signal.is_set());
    }

    #[test]
    fn test_stop_signal_is_shared_between_clones() {
        let signal = StopSignal::new();
        let observer = signal.clone();

        signal.trigger();

        assert!(observer.is_set());
        // Triggering again is harmless
        observer.trigger();
        assert!(signal.is_set());
    }

    #[test]
    fn test_stop_signal_crosses_threads() {
        let signal = StopSignal::new();
        let remote = signal.clone();

        let handle = thread::spawn(move || {
            while !remote.is_set() {
                thread::yield_now();
            }
            true
        });

        signal.trigger();
        assert!(handle.join().unwrap());
    }
}
