//! Fixed-Layout Telemetry Record
//!
//! ## Overview
//!
//! One acquisition cycle produces one [`TelemetryRecord`]: `N` 32-bit float
//! slots plus a trailing XOR checksum byte. The slot count is a compile-time
//! constant of the deployment (fielded layouts use 3, 4, 7, or 8 slots) and
//! the meaning of each index — which one is temperature, which is dose rate —
//! is a contract negotiated out of band with the receiver.
//!
//! ## Wire Layout
//!
//! The record owns the payload portion of a frame; the sync marker is added
//! by [`FrameWriter`](crate::frame::FrameWriter):
//!
//! ```text
//! bytes 0..4N:  N little-endian IEEE-754 float32 slots, packed, no padding
//! byte  4N:     checksum = XOR of all 4N preceding bytes
//! ```
//!
//! ## Invariants
//!
//! - Slots never read in a cycle hold `0.0` — a defined default, never
//!   uninitialized memory.
//! - `checksum` is the XOR of every raw byte of the packed little-endian
//!   slots. [`verify`](TelemetryRecord::verify) re-derives it; for every
//!   finalized record the two agree (the round-trip property).
//! - Wire size is exactly `4 * N + 1` bytes.

use heapless::Vec;

/// Index of a slot within a record. Deployment constants, not runtime data.
pub type SlotIndex = usize;

/// Largest slot count among the fielded layouts.
pub const MAX_SLOTS: usize = 8;

/// Payload bytes for the largest layout: `4 * MAX_SLOTS + 1`.
pub const MAX_WIRE_SIZE: usize = 4 * MAX_SLOTS + 1;

/// Why a byte sequence failed to parse back into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    /// Payload was not exactly `4N + 1` bytes.
    Length {
        /// Bytes expected for this layout.
        expected: usize,
        /// Bytes provided.
        got: usize,
    },
    /// Stored checksum did not match the recomputed one.
    Checksum {
        /// Checksum carried in the payload.
        stored: u8,
        /// Checksum recomputed over the slot bytes.
        computed: u8,
    },
}

/// An ordered, fixed-length record of `N` float slots plus checksum.
///
/// Exclusively owned by the assembler while being filled; handed immutably
/// to the frame writer once [`finalize`](Self::finalize)d.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TelemetryRecord<const N: usize> {
    slots: [f32; N],
    checksum: u8,
}

impl<const N: usize> Default for TelemetryRecord<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TelemetryRecord<N> {
    /// Exact size of this record on the wire (excluding the sync marker).
    pub const WIRE_SIZE: usize = 4 * N + 1;

    /// A record with every slot at the defined default of `0.0`.
    pub const fn new() -> Self {
        Self {
            slots: [0.0; N],
            checksum: 0,
        }
    }

    /// Write `value` into `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= N`. Slot indices come from deployment constants,
    /// so an out-of-range index is a wiring bug, not a runtime condition.
    pub fn set(&mut self, slot: SlotIndex, value: f32) {
        self.slots[slot] = value;
    }

    /// Read one slot.
    pub fn get(&self, slot: SlotIndex) -> f32 {
        self.slots[slot]
    }

    /// All slots in order.
    pub fn slots(&self) -> &[f32; N] {
        &self.slots
    }

    /// The stored checksum byte.
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// XOR of every little-endian byte of the packed slots.
    pub fn compute_checksum(&self) -> u8 {
        let mut cs = 0u8;
        for value in &self.slots {
            for byte in value.to_le_bytes() {
                cs ^= byte;
            }
        }
        cs
    }

    /// Compute and store the checksum, completing the record.
    pub fn finalize(&mut self) {
        self.checksum = self.compute_checksum();
    }

    /// Round-trip property: stored checksum equals the recomputed one.
    pub fn verify(&self) -> bool {
        self.checksum == self.compute_checksum()
    }

    /// Pack the record into its exact wire layout.
    ///
    /// Returns the payload as a bounded vector of `4N + 1` bytes; infallible
    /// because `N <= MAX_SLOTS` for every fielded layout.
    pub fn wire_bytes(&self) -> Vec<u8, MAX_WIRE_SIZE> {
        let mut out = Vec::new();
        for value in &self.slots {
            // Capacity is MAX_WIRE_SIZE and N <= MAX_SLOTS; pushes cannot fail
            let _ = out.extend_from_slice(&value.to_le_bytes());
        }
        let _ = out.push(self.checksum);
        out
    }

    /// Parse a `4N + 1` byte payload back into a record, verifying the
    /// checksum. Used by receivers; the node itself only serializes.
    pub fn from_wire_bytes(payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != Self::WIRE_SIZE {
            return Err(WireError::Length {
                expected: Self::WIRE_SIZE,
                got: payload.len(),
            });
        }

        let mut record = Self::new();
        for (i, chunk) in payload[..4 * N].chunks_exact(4).enumerate() {
            // chunks_exact(4) yields 4-byte chunks; the conversion is infallible
            let bytes: [u8; 4] = chunk.try_into().unwrap_or([0; 4]);
            record.slots[i] = f32::from_le_bytes(bytes);
        }
        record.checksum = payload[4 * N];

        let computed = record.compute_checksum();
        if record.checksum != computed {
            return Err(WireError::Checksum {
                stored: record.checksum,
                computed,
            });
        }
        Ok(record)
    }
}

#[cfg(feature = "defmt")]
impl<const N: usize> defmt::Format for TelemetryRecord<N> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "record[{}] cs={}", N, self.checksum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_is_zero_filled() {
        let record = TelemetryRecord::<4>::new();
        assert_eq!(record.slots(), &[0.0; 4]);
        // XOR over all-zero bytes is zero, so a fresh record verifies
        assert!(record.verify());
    }

    #[test]
    fn checksum_matches_manual_xor() {
        let mut record = TelemetryRecord::<3>::new();
        record.set(0, 21.5);
        record.set(1, 44.0);
        record.set(2, 1013.25);
        record.finalize();

        let mut expected = 0u8;
        for v in [21.5f32, 44.0, 1013.25] {
            for b in v.to_le_bytes() {
                expected ^= b;
            }
        }
        assert_eq!(record.checksum(), expected);
        assert!(record.verify());
    }

    #[test]
    fn wire_layout_is_packed_little_endian() {
        let mut record = TelemetryRecord::<4>::new();
        record.set(0, 21.5);
        record.set(3, 0.78);
        record.finalize();

        let wire = record.wire_bytes();
        assert_eq!(wire.len(), TelemetryRecord::<4>::WIRE_SIZE);
        assert_eq!(wire.len(), 17);
        assert_eq!(&wire[0..4], &21.5f32.to_le_bytes());
        assert_eq!(&wire[4..8], &0.0f32.to_le_bytes());
        assert_eq!(wire[16], record.checksum());
    }

    #[test]
    fn wire_round_trip() {
        let mut record = TelemetryRecord::<4>::new();
        record.set(0, -7.25);
        record.set(1, 63.0);
        record.set(2, 998.4);
        record.set(3, 0.12);
        record.finalize();

        let wire = record.wire_bytes();
        let parsed = TelemetryRecord::<4>::from_wire_bytes(&wire).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn corrupted_payload_is_rejected() {
        let mut record = TelemetryRecord::<3>::new();
        record.set(0, 20.0);
        record.finalize();

        let mut wire = record.wire_bytes();
        wire[2] ^= 0x40;
        assert!(matches!(
            TelemetryRecord::<3>::from_wire_bytes(&wire),
            Err(WireError::Checksum { .. })
        ));

        assert!(matches!(
            TelemetryRecord::<3>::from_wire_bytes(&wire[..5]),
            Err(WireError::Length { expected: 13, got: 5 })
        ));
    }
}
