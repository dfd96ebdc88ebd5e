//! Property tests for the core invariants
//!
//! The core's guarantees are universally quantified, so they get proptest
//! coverage rather than example-based tests:
//! - checksum round-trip over arbitrary slot values
//! - pulse-window partition: every pulse in exactly one window
//! - scheduler invocation count independent of polling pattern

use proptest::prelude::*;

use airnode_core::pulse::PulseCounter;
use airnode_core::record::TelemetryRecord;
use airnode_core::scheduler::SampleScheduler;

proptest! {
    /// For every finalized record, the stored checksum equals the XOR of
    /// the packed slot bytes, and the wire image parses back to the same
    /// slots.
    #[test]
    fn checksum_round_trips(slots in prop::array::uniform4(any::<f32>())) {
        let mut record = TelemetryRecord::<4>::new();
        for (i, v) in slots.iter().enumerate() {
            record.set(i, *v);
        }
        record.finalize();
        prop_assert!(record.verify());

        let wire = record.wire_bytes();
        prop_assert_eq!(wire.len(), 17);

        let mut expected = 0u8;
        for byte in &wire[..16] {
            expected ^= byte;
        }
        prop_assert_eq!(wire[16], expected);

        // Compare bit patterns, not float values: NaN slots must survive
        // the wire byte-exactly too
        let parsed = TelemetryRecord::<4>::from_wire_bytes(&wire).unwrap();
        for i in 0..4 {
            prop_assert_eq!(parsed.get(i).to_bits(), record.get(i).to_bits());
        }
    }

    /// Any interleaving of pulse bursts and snapshots attributes every
    /// pulse to exactly one window.
    #[test]
    fn pulse_windows_partition_the_stream(bursts in prop::collection::vec(0u32..10_000, 1..50)) {
        let counter = PulseCounter::new();
        let mut windows = Vec::new();

        for burst in &bursts {
            for _ in 0..*burst {
                counter.on_pulse();
            }
            windows.push(counter.snapshot_and_reset());
        }

        let sent: u64 = bursts.iter().map(|&b| b as u64).sum();
        let seen: u64 = windows.iter().map(|&w| w as u64).sum();
        prop_assert_eq!(sent, seen);
        // And nothing is left behind for a phantom window
        prop_assert_eq!(counter.snapshot_and_reset(), 0);
    }

    /// However irregularly the loop polls — including overrun-length gaps —
    /// the number of acquisitions equals floor(elapsed / period).
    #[test]
    fn scheduler_count_matches_elapsed(
        start in 0u64..1_000_000,
        period in 1u64..100_000,
        gaps in prop::collection::vec(0u64..500_000, 1..40),
    ) {
        let mut sched = SampleScheduler::with_period(start, period);
        let mut fired: u64 = 0;
        let mut now = start;

        for gap in &gaps {
            now += gap;
            fired += sched.tick(now, || {}) as u64;
        }

        prop_assert_eq!(fired, (now - start) / period);
    }
}
