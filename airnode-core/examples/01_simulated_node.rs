//! Simulated Acquisition Node Example
//!
//! Runs the full acquisition path against simulated sensors: a steady
//! climate sensor, a flaky particulate sensor behind the fault recovery
//! controller, and a synthetic pulse source standing in for the Geiger
//! interrupt.
//!
//! ## What You'll Learn
//!
//! - Wiring sensor bindings to record slots
//! - Attaching fault recovery to a known-flaky sensor
//! - Reading the emitted frames off the sink
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_simulated_node
//! ```

use airnode_core::errors::{SensorError, SensorResult};
use airnode_core::node::{Node, PulseBinding, SensorBinding};
use airnode_core::pulse::PulseCounter;
use airnode_core::recovery::FaultRecoveryController;
use airnode_core::time::MonotonicTime;
use airnode_core::traits::{Measurements, SensorDriver, ThreadDelay};

static PULSES: PulseCounter = PulseCounter::new();

/// Pretends to be a BME280: slowly drifting climate values.
struct SimClimate {
    cycle: u32,
}

impl SensorDriver for SimClimate {
    fn init(&mut self) -> SensorResult<()> {
        Ok(())
    }

    fn read(&mut self) -> SensorResult<Measurements> {
        self.cycle += 1;
        let mut m = Measurements::new();
        let _ = m.push(21.0 + 0.1 * self.cycle as f32); // temperature °C
        let _ = m.push(45.0 - 0.2 * self.cycle as f32); // humidity %
        let _ = m.push(1013.2); // pressure hPa
        Ok(m)
    }
}

/// Pretends to be a particulate sensor whose fan needs a few cycles to
/// spin up: fails its first reads, then delivers.
struct SimParticulate {
    reads: u32,
}

impl SensorDriver for SimParticulate {
    fn init(&mut self) -> SensorResult<()> {
        Ok(())
    }

    fn read(&mut self) -> SensorResult<Measurements> {
        self.reads += 1;
        if self.reads <= 4 {
            return Err(SensorError::ReadFailed("fan spinning up"));
        }
        let mut m = Measurements::new();
        let _ = m.push(12.0); // PM2.5 µg/m³
        Ok(m)
    }
}

fn main() {
    println!("airnode simulated node");
    println!("======================\n");

    let mut climate = SimClimate { cycle: 0 };
    let mut particulate = SimParticulate { reads: 0 };

    // Record layout: [temperature, humidity, pressure, dose_rate, pm2_5]
    let mut node =
        Node::<5, _, _, _>::builder(Vec::<u8>::new(), MonotonicTime::new(), ThreadDelay)
            .period_ms(500)
            .sensor(SensorBinding::new("climate", &mut climate, &[0, 1, 2]))
            .sensor(
                SensorBinding::new("particulate", &mut particulate, &[4])
                    .with_recovery(FaultRecoveryController::with_limits(2, 1_000)),
            )
            .pulse(PulseBinding::new(&PULSES, 3))
            .build();

    node.init().expect("simulated sensors always initialize");

    for cycle in 1..=6u32 {
        // Synthesize some radiation events for this window
        for _ in 0..cycle * 10 {
            PULSES.on_pulse();
        }

        std::thread::sleep(std::time::Duration::from_millis(510));
        node.service().expect("no fault policy configured");

        if let Some(record) = node.latest().get() {
            println!(
                "cycle {cycle}: slots {:?} checksum {:#04x}",
                record.slots(),
                record.checksum()
            );
        }
    }

    let frame_len = 1 + 5 * 4 + 1;
    println!("\nemitted {} frames:", node.sink().len() / frame_len);
    for frame in node.sink().chunks(frame_len) {
        let hex: String = frame.iter().map(|b| format!("{b:02x} ")).collect();
        println!("  {hex}");
    }
    println!("\nmetrics: {:?}", node.metrics());
}
