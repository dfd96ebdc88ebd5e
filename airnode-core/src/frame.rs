//! Telemetry Frame Output
//!
//! One frame per acquisition cycle, written to an opaque byte sink:
//!
//! ```text
//! byte 0:        sync marker = 0x8A
//! bytes 1..=4N:  the record's packed little-endian float slots
//! byte 4N+1:     XOR checksum (carried inside the record)
//! ```
//!
//! No length prefix — the slot count is fixed per deployment and the
//! receiver is configured with it out of band. The write is fire-and-forget:
//! nothing is read back, nothing is buffered, and a failed write loses
//! exactly that cycle's record. The next cycle proceeds independently.

use heapless::Vec;

use crate::constants::SYNC_MARKER;
use crate::errors::TransportError;
use crate::record::{TelemetryRecord, MAX_WIRE_SIZE};
use crate::traits::OutputSink;

/// Largest frame across the fielded layouts: sync marker + payload.
pub const MAX_FRAME_SIZE: usize = 1 + MAX_WIRE_SIZE;

/// Serializes finalized records to the output sink.
pub struct FrameWriter<S: OutputSink> {
    sink: S,
}

impl<S: OutputSink> FrameWriter<S> {
    /// Wrap a byte sink.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Write one frame: sync marker followed by the exact packed record.
    ///
    /// The frame is assembled in a stack buffer and handed to the sink as a
    /// single write, so a sink that is itself packetized (TCP, USB bulk)
    /// sees one frame per call. Errors propagate for the caller to log and
    /// drop — never to retry.
    pub fn write<const N: usize>(
        &mut self,
        record: &TelemetryRecord<N>,
    ) -> Result<(), TransportError> {
        let mut frame: Vec<u8, MAX_FRAME_SIZE> = Vec::new();
        // Capacity covers the largest layout; pushes cannot fail
        let _ = frame.push(SYNC_MARKER);
        let _ = frame.extend_from_slice(&record.wire_bytes());
        self.sink.write_bytes(&frame)
    }

    /// Access the underlying sink (tests, teardown).
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the writer, returning the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSink;

    impl OutputSink for FailingSink {
        fn write_bytes(&mut self, _bytes: &[u8]) -> Result<(), TransportError> {
            Err(TransportError("serial overrun"))
        }
    }

    #[test]
    fn frame_is_marker_plus_packed_record() {
        let mut record = TelemetryRecord::<4>::new();
        record.set(0, 21.5);
        record.set(1, 44.0);
        record.finalize();

        let mut writer = FrameWriter::new(std::vec::Vec::new());
        writer.write(&record).unwrap();

        let frame = writer.sink();
        // 1 sync + 16 payload + 1 checksum
        assert_eq!(frame.len(), 18);
        assert_eq!(frame[0], SYNC_MARKER);
        assert_eq!(&frame[1..5], &21.5f32.to_le_bytes());
        assert_eq!(&frame[5..9], &44.0f32.to_le_bytes());
        assert_eq!(frame[17], record.checksum());
    }

    #[test]
    fn consecutive_frames_are_independent() {
        let mut writer = FrameWriter::new(std::vec::Vec::new());
        let mut record = TelemetryRecord::<3>::new();
        record.finalize();

        writer.write(&record).unwrap();
        writer.write(&record).unwrap();

        let frame_len = 1 + TelemetryRecord::<3>::WIRE_SIZE;
        let sink = writer.sink();
        assert_eq!(sink.len(), 2 * frame_len);
        // A receiver can resync on the marker at every frame boundary
        assert_eq!(sink[0], SYNC_MARKER);
        assert_eq!(sink[frame_len], SYNC_MARKER);
    }

    #[test]
    fn write_error_propagates_without_state() {
        let mut record = TelemetryRecord::<3>::new();
        record.finalize();

        let mut writer = FrameWriter::new(FailingSink);
        assert!(writer.write(&record).is_err());
        // No buffering: the writer holds nothing a later write could resend
        assert!(writer.write(&record).is_err());
    }
}
