//! Incremental frame extraction from a raw byte stream
//!
//! The wire format has no length prefix and no escape sequences — just a
//! sync marker, `4N` payload bytes, and an XOR checksum. The deframer is a
//! two-state machine fed arbitrary byte chunks (whatever the serial read
//! returned) and yields verified records:
//!
//! ```text
//!        ┌── not 0x8A: skip ──┐
//!        ▼                    │
//!   [Scanning] ── 0x8A ──► [Collecting 4N+1 bytes] ── checksum ok ──► record
//!        ▲                    │
//!        └── checksum bad ────┘  (frame dropped, scan resumes)
//! ```
//!
//! A marker byte *inside* a payload is not special — collection is
//! byte-count driven, so float bytes that happen to equal 0x8A never split
//! a frame. Conversely, after a corrupt frame the next genuine marker
//! re-synchronizes the stream; the bytes of the dropped frame are not
//! rescanned, matching how the fielded listener consumed its input.

use airnode_core::record::TelemetryRecord;

/// Counters describing what the deframer has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeframerStats {
    /// Frames that decoded and verified.
    pub frames: u64,
    /// Frames dropped for checksum mismatch.
    pub checksum_failures: u64,
    /// Bytes skipped while scanning for a marker (noise, partial frames).
    pub skipped_bytes: u64,
}

/// Streaming decoder for `N`-slot telemetry frames.
///
/// Feed it bytes as they arrive; it hands back every complete, verified
/// [`TelemetryRecord`]. Decoded records still carry raw slot values —
/// naming them is the job of [`SlotSchema`](crate::decode::SlotSchema).
#[derive(Debug, Default)]
pub struct Deframer<const N: usize> {
    payload: Vec<u8>,
    in_frame: bool,
    stats: DeframerStats,
}

impl<const N: usize> Deframer<N> {
    /// A deframer scanning for its first marker.
    pub fn new() -> Self {
        Self {
            payload: Vec::with_capacity(TelemetryRecord::<N>::WIRE_SIZE),
            in_frame: false,
            stats: DeframerStats::default(),
        }
    }

    /// Consume a chunk of input, returning every record completed by it.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<TelemetryRecord<N>> {
        let mut decoded = Vec::new();

        for &byte in bytes {
            if !self.in_frame {
                if byte == airnode_core::constants::SYNC_MARKER {
                    self.in_frame = true;
                    self.payload.clear();
                } else {
                    self.stats.skipped_bytes += 1;
                }
                continue;
            }

            self.payload.push(byte);
            if self.payload.len() == TelemetryRecord::<N>::WIRE_SIZE {
                match TelemetryRecord::<N>::from_wire_bytes(&self.payload) {
                    Ok(record) => {
                        self.stats.frames += 1;
                        decoded.push(record);
                    }
                    Err(e) => {
                        self.stats.checksum_failures += 1;
                        log::warn!("dropping corrupt frame: {e:?}");
                    }
                }
                self.in_frame = false;
            }
        }

        decoded
    }

    /// What the deframer has seen so far.
    pub fn stats(&self) -> DeframerStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airnode_core::constants::SYNC_MARKER;

    fn frame_of(slots: [f32; 3]) -> Vec<u8> {
        let mut record = TelemetryRecord::<3>::new();
        for (i, v) in slots.iter().enumerate() {
            record.set(i, *v);
        }
        record.finalize();

        let mut bytes = vec![SYNC_MARKER];
        bytes.extend_from_slice(&record.wire_bytes());
        bytes
    }

    #[test]
    fn whole_frame_in_one_chunk() {
        let mut deframer = Deframer::<3>::new();
        let records = deframer.feed(&frame_of([21.5, 44.0, 1013.2]));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(0), 21.5);
        assert_eq!(deframer.stats().frames, 1);
    }

    #[test]
    fn frame_split_across_arbitrary_chunks() {
        let bytes = frame_of([1.0, 2.0, 3.0]);
        // Feed one byte at a time - the worst serial read pattern
        let mut deframer = Deframer::<3>::new();
        let mut records = Vec::new();
        for b in &bytes {
            records.extend(deframer.feed(std::slice::from_ref(b)));
        }
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(2), 3.0);
    }

    #[test]
    fn leading_noise_is_skipped() {
        let mut bytes = vec![0x00, 0xFF, 0x42];
        bytes.extend_from_slice(&frame_of([9.0, 8.0, 7.0]));

        let mut deframer = Deframer::<3>::new();
        let records = deframer.feed(&bytes);
        assert_eq!(records.len(), 1);
        assert_eq!(deframer.stats().skipped_bytes, 3);
    }

    #[test]
    fn corrupt_frame_dropped_stream_resyncs() {
        let mut bytes = frame_of([1.5, 2.5, 3.5]);
        bytes[3] ^= 0x80; // flip a payload bit
        bytes.extend_from_slice(&frame_of([4.5, 5.5, 6.5]));

        let mut deframer = Deframer::<3>::new();
        let records = deframer.feed(&bytes);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(0), 4.5);
        assert_eq!(deframer.stats().checksum_failures, 1);
        assert_eq!(deframer.stats().frames, 1);
    }

    #[test]
    fn marker_byte_inside_payload_does_not_split() {
        // Find a slot value whose encoding contains 0x8A
        let tricky = f32::from_le_bytes([0x8A, 0x8A, 0x8A, 0x3F]);
        let bytes = frame_of([tricky, 1.0, 2.0]);

        let mut deframer = Deframer::<3>::new();
        let records = deframer.feed(&bytes);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(0).to_bits(), tricky.to_bits());
    }

    #[test]
    fn back_to_back_frames() {
        let mut bytes = frame_of([1.0, 1.0, 1.0]);
        bytes.extend_from_slice(&frame_of([2.0, 2.0, 2.0]));
        bytes.extend_from_slice(&frame_of([3.0, 3.0, 3.0]));

        let mut deframer = Deframer::<3>::new();
        let records = deframer.feed(&bytes);
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].get(0), 3.0);
    }
}
