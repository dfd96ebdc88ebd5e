//! Fault Recovery for Intermittently Failing Sensors
//!
//! ## Overview
//!
//! Cheap environmental sensors fail in bursts: a particulate sensor's fan
//! stalls, a UART drops sync, an I2C peripheral wedges the bus. This module
//! decides, per sensor, when to stop trying (a wedged peripheral hammered
//! every cycle can destabilize the bus for its neighbors) and when to try
//! bringing it back — without operator intervention.
//!
//! ## State Machine
//!
//! ```text
//!              read ok (streak := 0)
//!          ┌───────────────────────────┐
//!          ▼                           │
//!      Healthy ──fail──► Degraded ──fail×N──► Down
//!          ▲                                   │
//!          │        restart ok                 │ restart fail
//!          └───────────────────────────────────┤ (≥ cooldown apart)
//!                                              ▼
//!                                        stays Down
//! ```
//!
//! - Each failed read increments a saturating fail streak; at
//!   [`FAIL_STREAK_THRESHOLD`] consecutive failures the sensor goes `Down`.
//! - While `Down`, the sensor is not touched at all except for one restart
//!   attempt per [`RECOVERY_COOLDOWN_MS`] cooldown window.
//! - A successful restart goes directly to `Healthy` with a zero streak; a
//!   failed one re-arms the cooldown.
//! - Any successful read zeroes the streak.
//!
//! `Degraded` is not stored — it is the read-only view of "nonzero streak,
//! not yet down". The observable contract (which reads are attempted, and
//! when) depends only on the down flag and the cooldown clock.
//!
//! ## Transient Glitches
//!
//! A single failed read is retried exactly once after a short fixed pause
//! before it counts toward the streak. Isolated glitches are absorbed;
//! genuine failures still surface within one cycle.

use crate::constants::{FAIL_STREAK_THRESHOLD, READ_RETRY_DELAY_MS, RECOVERY_COOLDOWN_MS};
use crate::errors::{SensorError, SensorResult};
use crate::time::Timestamp;
use crate::traits::{Delay, Measurements, SensorDriver};

/// Health of a monitored sensor, derived from the controller's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    /// Reads are attempted; no failures outstanding.
    Healthy,
    /// Reads are attempted; one or more consecutive failures recorded.
    Degraded,
    /// Reads are suppressed except for cooldown-gated restart attempts.
    Down,
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Healthy => defmt::write!(fmt, "healthy"),
            Self::Degraded => defmt::write!(fmt, "degraded"),
            Self::Down => defmt::write!(fmt, "down"),
        }
    }
}

/// Per-sensor failure tracking and recovery throttling.
///
/// Lives for the process lifetime; all transitions happen inside this type.
/// The controller is pure bookkeeping over `(down, fail_streak,
/// last_recovery_attempt)` — it never touches the driver itself, which keeps
/// it trivially testable cycle by cycle.
#[derive(Debug, Clone)]
pub struct FaultRecoveryController {
    down: bool,
    fail_streak: u8,
    last_recovery_attempt: Timestamp,
    threshold: u8,
    cooldown_ms: u64,
}

impl Default for FaultRecoveryController {
    fn default() -> Self {
        Self::new()
    }
}

impl FaultRecoveryController {
    /// Controller with the observed defaults: threshold 5, cooldown 3 s.
    pub const fn new() -> Self {
        Self {
            down: false,
            fail_streak: 0,
            last_recovery_attempt: 0,
            threshold: FAIL_STREAK_THRESHOLD,
            cooldown_ms: RECOVERY_COOLDOWN_MS,
        }
    }

    /// Controller with deployment-specific limits.
    pub const fn with_limits(threshold: u8, cooldown_ms: u64) -> Self {
        Self {
            down: false,
            fail_streak: 0,
            last_recovery_attempt: 0,
            threshold,
            cooldown_ms,
        }
    }

    /// Current derived state.
    pub fn state(&self) -> SensorState {
        if self.down {
            SensorState::Down
        } else if self.fail_streak > 0 {
            SensorState::Degraded
        } else {
            SensorState::Healthy
        }
    }

    /// Consecutive failures recorded so far (saturating).
    pub fn fail_streak(&self) -> u8 {
        self.fail_streak
    }

    /// Whether the sensor may be touched at `now`: always while up, at most
    /// once per cooldown while down.
    pub fn should_attempt(&self, now: Timestamp) -> bool {
        !self.down || now.saturating_sub(self.last_recovery_attempt) >= self.cooldown_ms
    }

    /// Record a successful read or restart. Zeroes the streak; a down
    /// sensor transitions directly back to `Healthy`.
    pub fn record_success(&mut self) {
        self.down = false;
        self.fail_streak = 0;
    }

    /// Record a failed read (already past the retry) or failed restart.
    ///
    /// Reaching the threshold marks the sensor down and starts the cooldown
    /// clock; failures while down only re-arm the cooldown.
    pub fn record_failure(&mut self, now: Timestamp) {
        if self.down {
            self.last_recovery_attempt = now;
            return;
        }
        self.fail_streak = self.fail_streak.saturating_add(1);
        if self.fail_streak >= self.threshold {
            self.down = true;
            self.last_recovery_attempt = now;
        }
    }

    /// Force the down state, used when the initial start fails at boot.
    pub fn mark_down(&mut self, now: Timestamp) {
        self.down = true;
        self.fail_streak = self.threshold;
        self.last_recovery_attempt = now;
    }
}

/// Result of asking a guarded driver for this cycle's values.
#[derive(Debug)]
pub enum SampleOutcome {
    /// The read succeeded; values are ordered per the driver's contract.
    Values(Measurements),
    /// The read (and its single retry, or the restart) failed; the caller
    /// leaves the slots at their default.
    Failed(SensorError),
    /// The sensor is down and inside its cooldown; it was not touched.
    Skipped,
}

/// A sensor driver behind the retry-once policy and, optionally, a
/// [`FaultRecoveryController`].
///
/// This is the single implementation of the per-cycle read discipline:
/// the node wraps every binding in one, and deployments with a known-flaky
/// sensor attach a controller via [`with_recovery`](Self::with_recovery).
pub struct GuardedDriver<D: SensorDriver> {
    driver: D,
    recovery: Option<FaultRecoveryController>,
    retry_delay_ms: u32,
}

impl<D: SensorDriver> GuardedDriver<D> {
    /// Guard a driver with the retry-once policy only.
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            recovery: None,
            retry_delay_ms: READ_RETRY_DELAY_MS,
        }
    }

    /// Guard a driver with retry-once plus degrade/recover tracking.
    pub fn with_recovery(driver: D, recovery: FaultRecoveryController) -> Self {
        Self {
            driver,
            recovery: Some(recovery),
            retry_delay_ms: READ_RETRY_DELAY_MS,
        }
    }

    /// Current state; a driver without a controller always reads `Healthy`.
    pub fn state(&self) -> SensorState {
        self.recovery
            .as_ref()
            .map(FaultRecoveryController::state)
            .unwrap_or(SensorState::Healthy)
    }

    /// The attached controller, if any.
    pub fn recovery(&self) -> Option<&FaultRecoveryController> {
        self.recovery.as_ref()
    }

    /// Unwrap the guard, returning the driver.
    pub fn into_inner(self) -> D {
        self.driver
    }

    /// Bring the peripheral up at boot.
    ///
    /// A failure on a recovery-tracked driver starts it in the `Down` state
    /// (it will get cooldown-gated restart attempts); on an untracked driver
    /// the error is just returned for the caller to escalate.
    pub fn init(&mut self, now: Timestamp) -> SensorResult<()> {
        match self.driver.init() {
            Ok(()) => {
                if let Some(ctrl) = self.recovery.as_mut() {
                    ctrl.record_success();
                }
                Ok(())
            }
            Err(e) => {
                if let Some(ctrl) = self.recovery.as_mut() {
                    ctrl.mark_down(now);
                }
                Err(e)
            }
        }
    }

    /// Take this cycle's measurement, honoring state, cooldown, and the
    /// single bounded retry.
    pub fn sample(&mut self, now: Timestamp, delay: &mut impl Delay) -> SampleOutcome {
        if let Some(ctrl) = self.recovery.as_mut() {
            if ctrl.state() == SensorState::Down {
                if !ctrl.should_attempt(now) {
                    return SampleOutcome::Skipped;
                }
                // Restart attempt: success goes straight back to Healthy,
                // failure re-arms the cooldown.
                match self.driver.init() {
                    Ok(()) => ctrl.record_success(),
                    Err(e) => {
                        ctrl.record_failure(now);
                        return SampleOutcome::Failed(e);
                    }
                }
            }
        }

        let result = match self.driver.read() {
            Ok(values) => Ok(values),
            Err(_first) => {
                // One immediate bounded retry absorbs isolated glitches
                delay.delay_ms(self.retry_delay_ms);
                self.driver.read()
            }
        };

        match result {
            Ok(values) => {
                if let Some(ctrl) = self.recovery.as_mut() {
                    ctrl.record_success();
                }
                SampleOutcome::Values(values)
            }
            Err(e) => {
                if let Some(ctrl) = self.recovery.as_mut() {
                    ctrl.record_failure(now);
                }
                SampleOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::NoopDelay;

    /// Scripted driver: each entry is one read outcome.
    struct ScriptedDriver {
        reads: std::vec::Vec<SensorResult<f32>>,
        read_calls: usize,
        init_results: std::vec::Vec<SensorResult<()>>,
        init_calls: usize,
    }

    impl ScriptedDriver {
        fn new(reads: std::vec::Vec<SensorResult<f32>>) -> Self {
            Self {
                reads,
                read_calls: 0,
                init_results: std::vec::Vec::new(),
                init_calls: 0,
            }
        }
    }

    impl SensorDriver for ScriptedDriver {
        fn init(&mut self) -> SensorResult<()> {
            let r = self
                .init_results
                .get(self.init_calls)
                .copied()
                .unwrap_or(Ok(()));
            self.init_calls += 1;
            r
        }

        fn read(&mut self) -> SensorResult<Measurements> {
            let r = self
                .reads
                .get(self.read_calls)
                .copied()
                .unwrap_or(Err(SensorError::ReadFailed("script exhausted")));
            self.read_calls += 1;
            r.map(|v| {
                let mut m = Measurements::new();
                let _ = m.push(v);
                m
            })
        }
    }

    const FAIL: SensorResult<f32> = Err(SensorError::ReadFailed("no response"));

    #[test]
    fn five_consecutive_failures_mark_down() {
        let mut ctrl = FaultRecoveryController::new();
        for i in 1..=4 {
            ctrl.record_failure(i * 1000);
            assert_eq!(ctrl.state(), SensorState::Degraded);
        }
        ctrl.record_failure(5000);
        assert_eq!(ctrl.state(), SensorState::Down);
        assert_eq!(ctrl.fail_streak(), 5);
    }

    #[test]
    fn cooldown_gates_recovery_attempts() {
        let mut ctrl = FaultRecoveryController::new();
        for i in 1..=5 {
            ctrl.record_failure(i * 100);
        }
        assert_eq!(ctrl.state(), SensorState::Down);

        // Inside the cooldown nothing is attempted, however often we ask
        for dt in [0u64, 500, 1500, 2999] {
            assert!(!ctrl.should_attempt(500 + dt));
        }
        assert!(ctrl.should_attempt(500 + 3000));

        // Failed attempt re-arms the clock
        ctrl.record_failure(3500);
        assert!(!ctrl.should_attempt(6499));
        assert!(ctrl.should_attempt(6500));
    }

    #[test]
    fn success_resets_streak_without_going_down() {
        let mut ctrl = FaultRecoveryController::new();
        ctrl.record_failure(100);
        ctrl.record_failure(200);
        assert_eq!(ctrl.fail_streak(), 2);

        ctrl.record_success();
        assert_eq!(ctrl.fail_streak(), 0);
        assert_eq!(ctrl.state(), SensorState::Healthy);

        // The streak starts over; two old failures don't count
        for i in 0..4 {
            ctrl.record_failure(300 + i * 100);
        }
        assert_eq!(ctrl.state(), SensorState::Degraded);
    }

    #[test]
    fn restart_success_goes_straight_to_healthy() {
        let mut ctrl = FaultRecoveryController::new();
        for i in 1..=5 {
            ctrl.record_failure(i * 100);
        }
        assert_eq!(ctrl.state(), SensorState::Down);

        ctrl.record_success();
        assert_eq!(ctrl.state(), SensorState::Healthy);
        assert_eq!(ctrl.fail_streak(), 0);
    }

    #[test]
    fn streak_saturates() {
        let mut ctrl = FaultRecoveryController::with_limits(255, 1000);
        for i in 0..400u64 {
            ctrl.record_failure(i);
        }
        assert_eq!(ctrl.fail_streak(), 255);
    }

    #[test]
    fn single_glitch_is_absorbed_by_retry() {
        // First read fails, retry succeeds: no failure recorded
        let driver = ScriptedDriver::new(vec![FAIL, Ok(12.5)]);
        let mut guarded = GuardedDriver::with_recovery(driver, FaultRecoveryController::new());

        match guarded.sample(1000, &mut NoopDelay) {
            SampleOutcome::Values(v) => assert_eq!(v[0], 12.5),
            other => panic!("expected values, got {other:?}"),
        }
        assert_eq!(guarded.recovery().unwrap().fail_streak(), 0);
    }

    #[test]
    fn both_attempts_failing_counts_once() {
        let driver = ScriptedDriver::new(vec![FAIL, FAIL]);
        let mut guarded = GuardedDriver::with_recovery(driver, FaultRecoveryController::new());

        assert!(matches!(
            guarded.sample(1000, &mut NoopDelay),
            SampleOutcome::Failed(_)
        ));
        // One cycle, one streak increment - not two
        assert_eq!(guarded.recovery().unwrap().fail_streak(), 1);
    }

    #[test]
    fn down_sensor_is_not_touched_inside_cooldown() {
        let mut driver = ScriptedDriver::new(std::vec::Vec::new());
        driver.reads = vec![FAIL; 10];
        let mut guarded = GuardedDriver::with_recovery(driver, FaultRecoveryController::new());

        // 5 failing cycles (each burns read + retry) bring it down
        for cycle in 1..=5u64 {
            guarded.sample(cycle * 1000, &mut NoopDelay);
        }
        assert_eq!(guarded.state(), SensorState::Down);
        let reads_so_far = 10;

        // Well inside the cooldown: skipped, and no driver traffic at all
        assert!(matches!(
            guarded.sample(5500, &mut NoopDelay),
            SampleOutcome::Skipped
        ));
        assert_eq!(guarded.driver.read_calls, reads_so_far);
        assert_eq!(guarded.driver.init_calls, 0);
    }

    #[test]
    fn init_failure_starts_down() {
        let mut driver = ScriptedDriver::new(std::vec::Vec::new());
        driver.init_results = vec![Err(SensorError::InitFailed("fan stalled"))];
        let mut guarded = GuardedDriver::with_recovery(driver, FaultRecoveryController::new());

        assert!(guarded.init(0).is_err());
        assert_eq!(guarded.state(), SensorState::Down);
    }
}
