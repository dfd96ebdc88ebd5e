//! Time sources for the acquisition scheduler
//!
//! The scheduler, fault-recovery cooldowns, and stale detection all work on
//! plain millisecond timestamps so they stay pure functions of `now` and can
//! be driven by a test clock. The [`TimeSource`] trait is the seam for the
//! actual clock:
//!
//! - [`MonotonicTime`] — process-monotonic, for scheduling (never jumps)
//! - [`SystemTime`] — wall clock, for consumers that stamp output
//! - [`FixedTime`] — manually advanced, for tests
//!
//! On a bare-metal target the firmware supplies its own `TimeSource` backed
//! by a hardware timer; the core never reads a clock behind the caller's
//! back.

/// Timestamp in milliseconds since an arbitrary epoch.
///
/// For [`MonotonicTime`] the epoch is construction time; for [`SystemTime`]
/// it is the Unix epoch. The core only ever computes forward differences, so
/// the epoch does not matter as long as one source is used consistently.
pub type Timestamp = u64;

/// Source of millisecond timestamps.
pub trait TimeSource {
    /// Get current timestamp in milliseconds.
    fn now(&self) -> Timestamp;

    /// Check if this source provides wall clock time (vs monotonic).
    fn is_wall_clock(&self) -> bool;
}

/// Monotonic clock based on [`std::time::Instant`].
///
/// Starts at 0 on construction and never goes backwards, which is what the
/// sample scheduler needs: a wall clock stepped by NTP would either stall
/// acquisition or fire a burst of catch-up cycles.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicTime {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicTime {
    /// Create a monotonic source anchored at now.
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicTime {
    fn now(&self) -> Timestamp {
        self.start.elapsed().as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

/// System wall-clock source (requires std).
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SystemTime;

#[cfg(feature = "std")]
impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime as StdSystemTime, UNIX_EPOCH};

        StdSystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }
}

/// Fixed time source for testing.
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    /// Create a test clock at the given timestamp.
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    /// Set the clock to an absolute timestamp.
    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Advance the clock by `ms` milliseconds.
    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }

    fn is_wall_clock(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_advances() {
        let mut time = FixedTime::new(1000);
        assert_eq!(time.now(), 1000);

        time.advance(500);
        assert_eq!(time.now(), 1500);
    }

    #[cfg(feature = "std")]
    #[test]
    fn monotonic_never_decreases() {
        let time = MonotonicTime::new();
        let a = time.now();
        let b = time.now();
        assert!(b >= a);
        assert!(!time.is_wall_clock());
    }
}
