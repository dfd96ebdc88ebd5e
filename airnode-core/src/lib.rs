//! Acquisition core for airnode
//!
//! Samples a suite of environmental sensors on a fixed, drift-free period,
//! fuses the readings into a fixed-layout checksummed record, and emits it
//! as a framed byte stream. Designed for small edge devices:
//!
//! Key constraints:
//! - No heap allocation in the acquisition path
//! - Single-threaded cooperative main loop; the only concurrency is the
//!   pulse-counting interrupt, isolated behind one atomic
//! - Every collaborator (sensor drivers, output transport, clock, delay)
//!   sits behind a trait, so the whole path runs in host tests
//!
//! ```no_run
//! use airnode_core::node::{Node, PulseBinding, SensorBinding};
//! use airnode_core::pulse::PulseCounter;
//! use airnode_core::recovery::FaultRecoveryController;
//! use airnode_core::time::MonotonicTime;
//! use airnode_core::traits::ThreadDelay;
//! # use airnode_core::traits::{SensorDriver, Measurements};
//! # use airnode_core::errors::SensorResult;
//! # struct Bme280; struct Pms5003;
//! # impl SensorDriver for Bme280 {
//! #     fn init(&mut self) -> SensorResult<()> { Ok(()) }
//! #     fn read(&mut self) -> SensorResult<Measurements> { Ok(Measurements::new()) }
//! # }
//! # impl SensorDriver for Pms5003 {
//! #     fn init(&mut self) -> SensorResult<()> { Ok(()) }
//! #     fn read(&mut self) -> SensorResult<Measurements> { Ok(Measurements::new()) }
//! # }
//!
//! static PULSES: PulseCounter = PulseCounter::new();
//!
//! let mut bme = Bme280; // temperature, humidity, pressure
//! let mut pms = Pms5003; // PM1.0, PM2.5, PM10 — known flaky
//!
//! let mut node = Node::<8, _, _, _>::builder(Vec::<u8>::new(), MonotonicTime::new(), ThreadDelay)
//!     .sensor(SensorBinding::new("bme280", &mut bme, &[0, 1, 2]))
//!     .sensor(
//!         SensorBinding::new("pms5003", &mut pms, &[4, 5, 6])
//!             .with_recovery(FaultRecoveryController::new()),
//!     )
//!     .pulse(PulseBinding::new(&PULSES, 3))
//!     .build();
//!
//! node.run();
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// Optional logging: the core logs only advisory messages (dropped frames,
// degraded sensors), so the dependency stays behind the std feature with
// no-op shims elsewhere.
#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        let _ = || ($($arg)*,);
    }};
}

pub mod constants;
pub mod errors;
pub mod frame;
pub mod node;
pub mod pulse;
pub mod record;
pub mod recovery;
pub mod scheduler;
#[cfg(feature = "std")]
pub mod snapshot;
pub mod time;
pub mod traits;

// Public API
pub use errors::{NodeError, NodeResult, SensorError, SensorResult, TransportError};
pub use frame::FrameWriter;
pub use node::{FaultPolicy, Node, NodeBuilder, NodeMetrics, PulseBinding, SensorBinding};
pub use pulse::{DoseCalibration, PulseCounter};
pub use record::{SlotIndex, TelemetryRecord, WireError};
pub use recovery::{FaultRecoveryController, GuardedDriver, SampleOutcome, SensorState};
pub use scheduler::SampleScheduler;
#[cfg(feature = "std")]
pub use snapshot::LatestRecord;
pub use time::{TimeSource, Timestamp};
pub use traits::{Delay, Measurements, OutputSink, SensorDriver};

/// Crate version, for status reporting.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
