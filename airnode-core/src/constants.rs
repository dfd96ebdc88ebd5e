//! Constants for the acquisition core
//!
//! Every tuning value used by the core lives here with its provenance, so a
//! deployment can see at a glance what it is overriding. Values marked
//! "observed" come from the fielded sensor-node variants this crate
//! generalizes.

// ===== FRAMING =====

/// Synchronization byte prefixed to every telemetry frame.
///
/// Receivers scan the byte stream for this marker to find frame boundaries;
/// there is no length prefix (the slot count is fixed per deployment and
/// negotiated out of band).
pub const SYNC_MARKER: u8 = 0x8A;

// ===== SCHEDULING =====

/// Default acquisition period (ms).
///
/// Observed across all fielded variants: one record per minute. Ambient
/// environmental quantities move slowly; the dose-rate slot additionally
/// wants a window long enough to average Poisson counting noise.
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 60_000;

// ===== FAULT RECOVERY =====

/// Consecutive read failures before a sensor is marked down.
///
/// Observed: 5. One or two failures are routine on a shared I2C/UART bus;
/// five in a row means the peripheral is wedged and further traffic can
/// destabilize the bus for the other sensors on it.
pub const FAIL_STREAK_THRESHOLD: u8 = 5;

/// Minimum wait between recovery attempts for a down sensor (ms).
///
/// Observed: 3 s. Long enough for a wedged peripheral to complete its own
/// power-on housekeeping before the restart command lands.
pub const RECOVERY_COOLDOWN_MS: u64 = 3_000;

/// Pause before the single immediate re-read of a failed sensor (ms).
///
/// One bounded retry absorbs isolated bus glitches without counting them
/// toward the fail streak.
pub const READ_RETRY_DELAY_MS: u32 = 50;

// ===== STARTUP =====

/// Spacing between attempts to bring up a mandatory sensor (ms).
///
/// The original firmware polled `begin()` every 500 ms forever; here the
/// same spacing applies but the attempt count is bounded and the failure is
/// surfaced as [`NodeError::SensorInit`](crate::errors::NodeError).
pub const INIT_BACKOFF_MS: u32 = 500;

/// Attempts to bring up a mandatory sensor before giving up.
pub const INIT_MAX_ATTEMPTS: u32 = 5;

// ===== DOSE RATE =====

/// Tube sensitivity: counts per minute per µSv/h.
///
/// Calibration factor for the J305/M4011-class Geiger tubes used in the
/// fielded radiation variants. Datasheet figure for Co-60; deployments with
/// a different tube override it in [`DoseCalibration`](crate::pulse::DoseCalibration).
pub const CPM_PER_USV_H: f32 = 153.8;

// ===== DEPLOYMENT PRESETS =====

/// Slot counts of the fielded record layouts.
///
/// 3: temperature/humidity/pressure. 4: + dose rate. 7: + particulate
/// mass concentrations (PM1.0/PM2.5/PM10). 8: full suite.
pub const KNOWN_SLOT_COUNTS: [usize; 4] = [3, 4, 7, 8];

/// Most values a single driver contributes per cycle.
///
/// Sized for the particulate driver (three mass concentrations) plus one
/// spare; bounds the `heapless` measurement vector.
pub const MAX_VALUES_PER_SENSOR: usize = 4;

/// Most sensor bindings a node carries.
pub const MAX_SENSORS: usize = 8;
