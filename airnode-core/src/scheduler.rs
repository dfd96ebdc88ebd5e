//! Drift-Free Sample Scheduling
//!
//! ## Overview
//!
//! Acquisition must fire on a fixed period regardless of how long each cycle
//! takes: a slow transport write or a sensor stuck at its bus timeout must
//! not push every subsequent sample later. The classic bug is
//!
//! ```text
//! previous_tick = now;            // cadence = period + cycle cost, forever
//! ```
//!
//! This scheduler instead advances its reference by *whole periods only*:
//!
//! ```text
//! while now - previous_tick >= period {
//!     previous_tick += period;    // cadence anchored to the start time
//!     fire();
//! }
//! ```
//!
//! Overruns therefore never accumulate. After a stall the scheduler
//! self-catches-up by firing once per missed period back to back, which
//! keeps the long-run invariant exact: total invocations equal
//! `floor((now - start) / period)`.
//!
//! The loop is cooperative and single-threaded — `tick` runs callbacks
//! inline, so "at most one acquisition in flight" holds by construction,
//! with no lock to enforce it.

use crate::constants::DEFAULT_SAMPLE_INTERVAL_MS;
use crate::time::Timestamp;

/// Fixed-period scheduler with whole-period advancement.
#[derive(Debug, Clone)]
pub struct SampleScheduler {
    period_ms: u64,
    previous_tick: Timestamp,
}

impl SampleScheduler {
    /// Scheduler on the default one-minute period, anchored at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self::with_period(start, DEFAULT_SAMPLE_INTERVAL_MS)
    }

    /// Scheduler with a custom period in milliseconds.
    ///
    /// A zero period is clamped to 1 ms so `tick` always terminates.
    pub fn with_period(start: Timestamp, period_ms: u64) -> Self {
        Self {
            period_ms: period_ms.max(1),
            previous_tick: start,
        }
    }

    /// The configured period in milliseconds.
    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// When the next period boundary falls, for callers that sleep.
    pub fn next_due(&self) -> Timestamp {
        self.previous_tick + self.period_ms
    }

    /// Advance to `now`, invoking `acquire` once per elapsed period.
    ///
    /// Returns the number of invocations. The reference tick moves by
    /// exactly one period per invocation — never snapped to `now` — so
    /// cadence is preserved across overruns and stalls.
    pub fn tick<F: FnMut()>(&mut self, now: Timestamp, mut acquire: F) -> u32 {
        let due = self.take_due(now);
        for _ in 0..due {
            acquire();
        }
        due
    }

    /// Advance to `now` and return how many periods elapsed, for callers
    /// that run the acquisition themselves (the node does, so each cycle
    /// can borrow state a closure could not).
    pub fn take_due(&mut self, now: Timestamp) -> u32 {
        let mut due = 0;
        while now.saturating_sub(self.previous_tick) >= self.period_ms {
            self.previous_tick += self.period_ms;
            due += 1;
        }
        due
    }

    /// Re-anchor at `now`, discarding any backlog of missed periods.
    ///
    /// Used by the supervisory loop after a full reinit: catch-up cycles
    /// from before the fault would read freshly restarted sensors and
    /// misattribute the pulse window.
    pub fn rearm(&mut self, now: Timestamp) {
        self.previous_tick = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_elapsed_period() {
        let mut sched = SampleScheduler::with_period(0, 1000);
        let mut fired = 0;

        assert_eq!(sched.tick(999, || fired += 1), 0);
        assert_eq!(sched.tick(1000, || fired += 1), 1);
        assert_eq!(sched.tick(1500, || fired += 1), 0);
        assert_eq!(sched.tick(2000, || fired += 1), 1);
        assert_eq!(fired, 2);
    }

    #[test]
    fn stall_catches_up_without_drift() {
        let mut sched = SampleScheduler::with_period(0, 1000);
        let mut fired = 0;

        // A 3.5-period stall: three catch-up firings in one tick
        assert_eq!(sched.tick(3500, || fired += 1), 3);
        // The reference stays on the period grid: next boundary is 4000,
        // not 4500
        assert_eq!(sched.next_due(), 4000);
        assert_eq!(sched.tick(4000, || fired += 1), 1);
        assert_eq!(fired, 4);
    }

    #[test]
    fn total_invocations_match_elapsed_over_period() {
        // Irregular polling with overruns: the count must still be exactly
        // floor((now_final - start) / P)
        let mut sched = SampleScheduler::with_period(500, 60_000);
        let mut fired: u64 = 0;

        let polls: [u64; 7] = [500, 59_999, 60_500, 185_000, 185_001, 240_499, 250_000];
        for now in polls {
            sched.tick(now, || fired += 1);
        }
        assert_eq!(fired, (250_000 - 500) / 60_000);
    }

    #[test]
    fn rearm_discards_backlog() {
        let mut sched = SampleScheduler::with_period(0, 1000);
        let mut fired = 0;

        sched.rearm(10_000);
        assert_eq!(sched.tick(10_500, || fired += 1), 0);
        assert_eq!(sched.tick(11_000, || fired += 1), 1);
    }

    #[test]
    fn zero_period_is_clamped() {
        let mut sched = SampleScheduler::with_period(0, 0);
        // Must terminate; with a 1 ms floor this fires `now` times at most
        assert_eq!(sched.tick(3, || {}), 3);
    }
}
