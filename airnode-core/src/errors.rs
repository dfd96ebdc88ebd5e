//! Error types for acquisition and telemetry output
//!
//! ## Design Philosophy
//!
//! Errors here follow the same constraints as the rest of the core:
//!
//! 1. **Small and Copy**: sensor errors are returned on every failed read in
//!    the hot path and stored by the recovery controller, so they carry no
//!    heap data — only discriminants and `&'static str` context.
//!
//! 2. **Explicit escalation**: there is no exceptions-as-control-flow. A
//!    failed read returns `Err`, and the *caller* decides whether to default
//!    the slot, retry, mark the sensor down, or escalate to a fatal fault.
//!
//! 3. **Fatal faults are values**: the original hardware escape hatch for
//!    "unknown state" was a device reset buried inside the measurement path.
//!    Here it is [`NodeError::ImpossibleReading`], which the supervisory run
//!    loop handles by reinitializing every component — the policy is visible
//!    at the top level instead of hidden in a driver call.
//!
//! ## Taxonomy
//!
//! | Error                          | Scope     | Handling                      |
//! |--------------------------------|-----------|-------------------------------|
//! | [`SensorError`]                | one read  | retry / zero-fill / degrade   |
//! | [`NodeError::SensorInit`]      | startup   | blocks forward progress       |
//! | [`NodeError::Transport`]       | one frame | logged, record dropped        |
//! | [`NodeError::ImpossibleReading`] | cycle   | supervisory reinit            |

use thiserror_no_std::Error;

/// Result type for single-sensor operations.
pub type SensorResult<T> = Result<T, SensorError>;

/// Result type for node-level operations.
pub type NodeResult<T> = Result<T, NodeError>;

/// Failure of one sensor interaction.
///
/// Drivers translate their bus-level failures into these variants; the core
/// never inspects the detail beyond logging it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// A measurement could not be obtained within the driver's timeout.
    #[error("Sensor read failed: {0}")]
    ReadFailed(&'static str),

    /// The sensor did not respond to initialization or restart.
    #[error("Sensor init failed: {0}")]
    InitFailed(&'static str),

    /// The bus transaction itself failed (NAK, arbitration loss, framing).
    #[error("Bus error: {0}")]
    Bus(&'static str),
}

/// Failure of telemetry output.
///
/// Frame writes are fire-and-forget: the writer logs this and the cycle's
/// record is simply lost. Nothing is buffered or retried.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Transport write failed: {0}")]
pub struct TransportError(pub &'static str);

/// Node-level errors surfaced from an acquisition cycle or startup.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeError {
    /// A mandatory sensor could not be brought up within the configured
    /// backoff budget. The node must not start emitting records with a
    /// permanently zero-filled mandatory slot.
    #[error("Mandatory sensor '{name}' failed to initialize: {source}")]
    SensorInit {
        /// Binding name of the sensor that failed.
        name: &'static str,
        /// Underlying driver failure.
        source: SensorError,
    },

    /// The cycle produced a physically impossible combination of readings
    /// and the configured [`FaultPolicy`](crate::node::FaultPolicy) asks for
    /// a full restart instead of emitting the record.
    #[error("Impossible reading: {reason}")]
    ImpossibleReading {
        /// Which policy check fired.
        reason: &'static str,
    },

    /// The output sink rejected the frame.
    #[error("{0}")]
    Transport(#[from] TransportError),
}

impl NodeError {
    /// Whether the supervisory loop must tear down and reinitialize all
    /// components rather than proceed to the next cycle.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            NodeError::SensorInit { .. } | NodeError::ImpossibleReading { .. }
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ReadFailed(s) => defmt::write!(fmt, "read failed: {}", s),
            Self::InitFailed(s) => defmt::write!(fmt, "init failed: {}", s),
            Self::Bus(s) => defmt::write!(fmt, "bus error: {}", s),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for NodeError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::SensorInit { name, source } => {
                defmt::write!(fmt, "sensor '{}' init: {}", name, source)
            }
            Self::ImpossibleReading { reason } => {
                defmt::write!(fmt, "impossible reading: {}", reason)
            }
            Self::Transport(TransportError(s)) => defmt::write!(fmt, "transport: {}", s),
        }
    }
}
