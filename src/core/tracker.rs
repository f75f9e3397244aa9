//! Per-device in-flight command counter (C1).
//!
//! `AioTracker` is the single source of truth for whether a device is
//! quiescent. Every accepted command brackets its lifetime with exactly one
//! [`AioTracker::start`] and exactly one [`AioTracker::finish`]; the
//! boolean `finish` returns drives the transport's idle-edge nudge.

use parking_lot::Mutex;

/// Tracks the number of commands currently in flight for one device.
#[derive(Debug)]
pub struct AioTracker {
    count: Mutex<u64>,
}

impl Default for AioTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AioTracker {
    /// Creates a tracker with the counter zeroed.
    pub fn new() -> Self {
        Self {
            count: Mutex::new(0),
        }
    }

    /// Marks the start of a new in-flight command.
    pub fn start(&self) {
        let mut count = self.count.lock();
        *count += 1;
        trace!(in_flight = *count, "aio tracker start");
    }

    /// Marks the completion of an in-flight command.
    ///
    /// Returns `true` iff this call brought the counter to zero, i.e. the
    /// device just became idle. The decrement and the zero-check happen
    /// under the same lock guard so the idle edge is observed exactly once.
    ///
    /// # Panics / aborts
    /// A decrement below zero is a programming bug (a `finish` without a
    /// matching `start`); rather than silently wrapping we abort the
    /// process, per the same contract a `finish` on an exhausted counter
    /// would violate in any single-writer accounting scheme.
    pub fn finish(&self) -> bool {
        let mut count = self.count.lock();
        if *count == 0 {
            error!("aio tracker underflow: finish() with no matching start()");
            std::process::abort();
        }
        *count -= 1;
        trace!(in_flight = *count, "aio tracker finish");
        *count == 0
    }

    /// Current in-flight count, mainly useful for tests and diagnostics.
    pub fn in_flight(&self) -> u64 {
        *self.count.lock()
    }

    /// Asserts the tracker is idle. Intended for use at device teardown.
    pub fn assert_idle(&self) {
        let count = *self.count.lock();
        assert_eq!(count, 0, "device torn down with {count} commands in flight");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn starts_at_zero() {
        let tracker = AioTracker::new();
        assert_eq!(tracker.in_flight(), 0);
    }

    #[test]
    fn single_start_finish_reports_idle() {
        let tracker = AioTracker::new();
        tracker.start();
        assert_eq!(tracker.in_flight(), 1);
        assert!(tracker.finish());
        assert_eq!(tracker.in_flight(), 0);
    }

    #[test]
    fn idle_edge_only_fires_at_zero() {
        let tracker = AioTracker::new();
        tracker.start();
        tracker.start();
        assert!(!tracker.finish());
        assert!(tracker.finish());
    }

    #[test]
    #[should_panic]
    fn assert_idle_panics_when_busy() {
        let tracker = AioTracker::new();
        tracker.start();
        tracker.assert_idle();
    }

    #[test]
    fn concurrent_start_finish_is_conserved() {
        let tracker = Arc::new(AioTracker::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let tracker = tracker.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    tracker.start();
                    tracker.finish();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(tracker.in_flight(), 0);
    }
}
