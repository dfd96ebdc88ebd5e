//! Host-Side Consumers for the airnode Telemetry Stream
//!
//! ## Overview
//!
//! A node emits fixed-size binary frames over a byte stream — typically a
//! USB serial adapter on the listening host. This crate is the other end of
//! that wire: it finds frame boundaries, verifies checksums, turns slot
//! indices back into named quantities, and maintains an atomically-replaced
//! JSON snapshot file that a web server can serve as "current conditions"
//! without ever observing a half-written document.
//!
//! ## Pipeline
//!
//! ```text
//! serial device ──► FramePump ──► Deframer ──► SlotSchema ──► SnapshotWriter
//!   (io::Read)      staleness      sync scan     names          tmp+rename
//!                   watchdog       checksum
//! ```
//!
//! Each stage stands alone: the [`Deframer`](deframe::Deframer) is a pure
//! byte-feed state machine, the [`SlotSchema`](decode::SlotSchema) is the
//! out-of-band slot contract, and the [`FramePump`](pump::FramePump) only
//! adds liveness policy on top. Deployments that want frames into a
//! database instead of a JSON file swap the last stage.
//!
//! ## Liveness
//!
//! Serial links fail quietly: the device file stays open while the adapter
//! has long stopped delivering bytes. The pump therefore tracks the time
//! since the last *valid* frame — not the last read — and reports the
//! stream stale after a configurable window so the caller can close and
//! reopen the device. Garbage bytes keep a link exactly as dead as silence
//! does.

pub mod decode;
pub mod deframe;
pub mod pump;
pub mod snapshot;

pub use decode::{SchemaError, SlotSchema};
pub use deframe::{Deframer, DeframerStats};
pub use pump::{FramePump, PumpConfig, PumpError};
pub use snapshot::{SnapshotError, SnapshotWriter};
