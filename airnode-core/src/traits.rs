//! Collaborator contracts for the acquisition core
//!
//! The core treats everything that touches hardware as an opaque capability
//! behind a trait: sensor drivers produce values, the output sink swallows
//! bytes, and a delay provider pauses between retries. Bus protocols, pin
//! setup, and vendor driver calls all live on the far side of these seams,
//! which is what lets the whole acquisition path run in host tests.
//!
//! ## Latency contract
//!
//! The scheduler is a cooperative single-threaded loop, so nothing behind
//! these traits may block unboundedly. Drivers are expected to enforce their
//! own bus-level timeout and return [`SensorError`](crate::errors::SensorError)
//! when it expires; the
//! sink write must be short and bounded. The core does not police this — it
//! is part of the contract, exactly like the hardware it abstracts.

use heapless::Vec;

use crate::constants::MAX_VALUES_PER_SENSOR;
use crate::errors::{SensorResult, TransportError};

/// Values one driver contributes in one acquisition cycle.
///
/// Ordered: the n-th value goes to the n-th slot of the driver's binding.
/// Bounded so the acquisition path stays allocation-free.
pub type Measurements = Vec<f32, MAX_VALUES_PER_SENSOR>;

/// One physical sensor, reduced to "read once, return ok/fail plus values".
///
/// Implementations wrap the vendor driver for a BME280, a PMS5003, an
/// anemometer — whatever the deployment carries. `read` is called at most
/// once per acquisition cycle (plus the single bounded retry), and `init` is
/// called at startup and again as the restart command when the fault
/// recovery controller attempts to revive a down sensor.
pub trait SensorDriver {
    /// Bring the peripheral up (or back up). Must be safe to call repeatedly.
    fn init(&mut self) -> SensorResult<()>;

    /// Take one measurement, blocking at most for the driver's own bus
    /// timeout.
    fn read(&mut self) -> SensorResult<Measurements>;
}

/// Byte sink for framed telemetry: a UART, a TCP socket, a test buffer.
///
/// Writes are fire-and-forget; there is no read-back channel and the core
/// never retries a failed write.
pub trait OutputSink {
    /// Write the full buffer or fail.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

/// Short bounded pause, used for the read-retry gap and init backoff.
///
/// On std targets [`ThreadDelay`] sleeps; firmware supplies a timer- or
/// cycle-counter-based implementation.
pub trait Delay {
    /// Block for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// [`Delay`] via [`std::thread::sleep`].
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

#[cfg(feature = "std")]
impl Delay for ThreadDelay {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
    }
}

/// No-op delay for tests, where retry pacing is irrelevant.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDelay;

impl Delay for NoopDelay {
    fn delay_ms(&mut self, _ms: u32) {}
}

impl<T: SensorDriver + ?Sized> SensorDriver for &mut T {
    fn init(&mut self) -> SensorResult<()> {
        (**self).init()
    }

    fn read(&mut self) -> SensorResult<Measurements> {
        (**self).read()
    }
}

impl<T: OutputSink + ?Sized> OutputSink for &mut T {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write_bytes(bytes)
    }
}

/// Growable sink for tests and host-side capture (std).
#[cfg(feature = "std")]
impl OutputSink for std::vec::Vec<u8> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}
