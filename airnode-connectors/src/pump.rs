//! Driving a byte source through the deframer, with liveness policy
//!
//! USB serial adapters fail without closing: the device file stays readable
//! while no bytes (or pure noise) arrive. The fielded listener treated
//! "no valid frame for three minutes" as a dead link and reopened the
//! device; the pump reproduces that policy over any [`std::io::Read`].
//!
//! The pump does not own reconnection — opening serial devices is the
//! caller's concern (and where the retry/backoff loop lives). One call to
//! [`FramePump::run`] corresponds to one session on one open device:
//!
//! ```no_run
//! use airnode_connectors::pump::{FramePump, PumpConfig, PumpError};
//!
//! let mut pump = FramePump::<4>::new(PumpConfig::default());
//! loop {
//!     let device = match std::fs::File::open("/dev/ttyUSB0") {
//!         Ok(f) => f,
//!         Err(_) => {
//!             std::thread::sleep(std::time::Duration::from_secs(2));
//!             continue;
//!         }
//!     };
//!     match pump.run(device, |record| println!("{:?}", record.slots())) {
//!         Ok(()) => break, // source ended cleanly
//!         Err(PumpError::Stale { .. }) | Err(PumpError::Io(_)) => continue,
//!     }
//! }
//! ```

use std::io::Read;
use std::time::{Duration, Instant};

use airnode_core::record::TelemetryRecord;
use thiserror::Error;

use crate::deframe::{Deframer, DeframerStats};

/// Why a pump session ended abnormally.
#[derive(Error, Debug)]
pub enum PumpError {
    /// No valid frame arrived within the stale window; the link is
    /// presumed dead even though reads still "succeed".
    #[error("no valid frame for {elapsed:?}, link presumed dead")]
    Stale {
        /// Time since the last verified frame.
        elapsed: Duration,
    },

    /// The source itself failed.
    #[error("source io: {0}")]
    Io(#[from] std::io::Error),
}

/// Tuning for one pump session.
#[derive(Debug, Clone, Copy)]
pub struct PumpConfig {
    /// Declare the link dead after this long without a valid frame.
    pub stale_after: Duration,
    /// Pause between reads when the source has nothing (timeout path).
    pub idle_sleep: Duration,
    /// Read buffer size per call.
    pub chunk_size: usize,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            // The node emits once a minute; three missed frames means the
            // link, not the schedule
            stale_after: Duration::from_secs(180),
            idle_sleep: Duration::from_millis(50),
            chunk_size: 256,
        }
    }
}

/// Pulls bytes from a source and dispatches verified records.
pub struct FramePump<const N: usize> {
    deframer: Deframer<N>,
    config: PumpConfig,
}

impl<const N: usize> FramePump<N> {
    /// A pump with the given liveness tuning.
    pub fn new(config: PumpConfig) -> Self {
        Self {
            deframer: Deframer::new(),
            config,
        }
    }

    /// Decoder counters across all sessions of this pump.
    pub fn stats(&self) -> DeframerStats {
        self.deframer.stats()
    }

    /// Read `source` until it ends, fails, or goes stale.
    ///
    /// `on_record` runs for every verified frame, in arrival order.
    /// Returns `Ok(())` on clean end-of-stream (useful for files and
    /// tests); serial devices normally only leave via an error.
    pub fn run<R: Read>(
        &mut self,
        mut source: R,
        mut on_record: impl FnMut(TelemetryRecord<N>),
    ) -> Result<(), PumpError> {
        let mut buf = vec![0u8; self.config.chunk_size.max(1)];
        let mut last_good = Instant::now();

        loop {
            let n = match source.read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(n) => n,
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::TimedOut
                            | std::io::ErrorKind::WouldBlock
                            | std::io::ErrorKind::Interrupted
                    ) =>
                {
                    self.check_stale(last_good)?;
                    std::thread::sleep(self.config.idle_sleep);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let records = self.deframer.feed(&buf[..n]);
            if records.is_empty() {
                // Bytes without frames count toward staleness: garbage
                // keeps a link exactly as dead as silence
                self.check_stale(last_good)?;
            } else {
                last_good = Instant::now();
                for record in records {
                    on_record(record);
                }
            }
        }
    }

    fn check_stale(&self, last_good: Instant) -> Result<(), PumpError> {
        let elapsed = last_good.elapsed();
        if elapsed > self.config.stale_after {
            log::warn!("stream stale for {elapsed:?}");
            return Err(PumpError::Stale { elapsed });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airnode_core::constants::SYNC_MARKER;
    use std::io::Cursor;

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
    fn pumps_every_frame_to_the_handler() {
        let mut stream = Vec::new();
        for i in 0..5 {
            stream.extend_from_slice(&frame_of([i as f32, 0.0, 0.0]));
        }

        let mut pump = FramePump::<3>::new(PumpConfig::default());
        let mut seen = Vec::new();
        pump.run(Cursor::new(stream), |r| seen.push(r.get(0)))
            .unwrap();

        assert_eq!(seen, [0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(pump.stats().frames, 5);
    }

    #[test]
    fn noise_between_frames_is_tolerated() {
        let mut stream = vec![0xDE, 0xAD];
        stream.extend_from_slice(&frame_of([7.0, 8.0, 9.0]));
        stream.extend_from_slice(&[0xBE, 0xEF]);
        stream.extend_from_slice(&frame_of([1.0, 2.0, 3.0]));

        let mut pump = FramePump::<3>::new(PumpConfig::default());
        let mut count = 0;
        pump.run(Cursor::new(stream), |_| count += 1).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn stale_source_is_reported() {
        // A source that always times out, never delivering a byte
        struct TimedOutForever;
        impl Read for TimedOutForever {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(std::io::ErrorKind::TimedOut))
            }
        }

        let config = PumpConfig {
            stale_after: Duration::from_millis(10),
            idle_sleep: Duration::from_millis(2),
            chunk_size: 64,
        };
        let mut pump = FramePump::<3>::new(config);
        let result = pump.run(TimedOutForever, |_| {});
        assert!(matches!(result, Err(PumpError::Stale { .. })));
    }

    #[test]
    fn io_errors_end_the_session() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
            }
        }

        let mut pump = FramePump::<3>::new(PumpConfig::default());
        assert!(matches!(
            pump.run(Broken, |_| {}),
            Err(PumpError::Io(_))
        ));
    }
}
