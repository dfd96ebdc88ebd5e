//! Interrupt-Driven Pulse Accumulation
//!
//! ## Overview
//!
//! A Geiger tube delivers one edge per detected event, at any time, from an
//! interrupt context. This module accumulates those edges and hands the
//! scheduler a per-window count without losing or double-counting a single
//! pulse — the only shared-mutable-state hazard in the whole system.
//!
//! ## Why a Single Atomic?
//!
//! The ISR side and the main path meet at exactly one point:
//!
//! ```text
//! ISR (any time)                     Scheduler (once per window)
//!      ↓                                      ↓
//!  fetch_add(1) ────→ AtomicU32 ←──── swap(0)
//!      ↓                                      ↓
//!  Never blocks                       Window count, counter zeroed
//! ```
//!
//! `snapshot_and_reset` is a single `swap`: a pulse that fires during the
//! call lands either in the value returned (it incremented before the swap)
//! or in the fresh window (after) — never both, never neither. There is no
//! window in which the counter is read but not yet cleared.
//!
//! ## Memory Ordering
//!
//! - `Relaxed` for the ISR increment: no other memory is published by a
//!   pulse, only the count itself matters.
//! - `AcqRel` for the swap: the snapshot must observe every increment that
//!   preceded it, and the zeroed counter must be visible before the next
//!   window's pulses land.
//!
//! ## Overflow
//!
//! The counter wraps. At the default 60 s window even a tube screaming at
//! 100 kcps accumulates 6 × 10⁶ counts — three orders of magnitude below
//! `u32::MAX` — so wrap-around is a documented non-concern rather than a
//! handled case.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::constants::CPM_PER_USV_H;

/// Event counter shared between an interrupt handler and the scheduler.
///
/// The only main-path accessor is [`snapshot_and_reset`](Self::snapshot_and_reset);
/// the exclusion discipline is in the type, not in caller convention. Usable
/// as a `static` so the ISR can reach it without carrying state:
///
/// ```rust
/// use airnode_core::pulse::PulseCounter;
///
/// static PULSES: PulseCounter = PulseCounter::new();
///
/// // Interrupt handler
/// fn on_geiger_edge() {
///     PULSES.on_pulse();
/// }
///
/// // Scheduler, once per window
/// fn acquire() {
///     let count = PULSES.snapshot_and_reset();
///     let _ = count;
/// }
/// ```
#[derive(Debug, Default)]
pub struct PulseCounter {
    count: AtomicU32,
}

impl PulseCounter {
    /// Create a zeroed counter. Const so it can back a `static`.
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// Record one event. Interrupt-context safe: lock-free, O(1), never
    /// blocks. Cannot fail.
    #[inline]
    pub fn on_pulse(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Atomically take the current window's count and start the next window.
    ///
    /// Called only from the scheduler's normal execution context, once per
    /// period. Every pulse is attributed to exactly one window.
    #[inline]
    pub fn snapshot_and_reset(&self) -> u32 {
        self.count.swap(0, Ordering::AcqRel)
    }

    /// Peek without resetting. Diagnostic use only — the window accounting
    /// guarantee holds only for `snapshot_and_reset`.
    pub fn peek(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Conversion from a window's pulse count to a dose-rate slot value.
///
/// Two-step: count over the window → counts per minute, then CPM → µSv/h
/// through the tube's sensitivity figure. `tube_multiplier` folds in any
/// deployment-specific correction (shielding geometry, dead-time compensation
/// measured against a reference instrument).
#[derive(Debug, Clone, Copy)]
pub struct DoseCalibration {
    /// Tube sensitivity in counts per minute per µSv/h.
    pub cpm_per_usv_h: f32,
    /// Deployment-specific scale correction applied to the CPM figure.
    pub tube_multiplier: f32,
}

impl Default for DoseCalibration {
    fn default() -> Self {
        Self {
            cpm_per_usv_h: CPM_PER_USV_H,
            tube_multiplier: 1.0,
        }
    }
}

impl DoseCalibration {
    /// Counts per minute for `count` pulses observed over `window_ms`.
    pub fn counts_per_minute(&self, count: u32, window_ms: u64) -> f32 {
        if window_ms == 0 {
            return 0.0;
        }
        count as f32 * self.tube_multiplier * 60_000.0 / window_ms as f32
    }

    /// Dose rate in µSv/h for `count` pulses observed over `window_ms`.
    pub fn dose_rate_usv_h(&self, count: u32, window_ms: u64) -> f32 {
        self.counts_per_minute(count, window_ms) / self.cpm_per_usv_h
    }
}
