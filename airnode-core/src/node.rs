//! The Acquisition Node
//!
//! ## Overview
//!
//! This module ties the pieces together into one generic core: a list of
//! `(driver, slots)` bindings, an optional interrupt-fed pulse binding, the
//! drift-free scheduler, the record assembler, and the frame writer. The
//! fielded firmware variants differed only in which sensors they carried and
//! how many slots the record had; all of them are instances of [`Node`] with
//! a different binding list and `N`.
//!
//! ## Acquisition Cycle
//!
//! Per elapsed period, in order:
//!
//! 1. Start with every slot at `0.0`.
//! 2. Read each sensor binding through its guard (retry-once, and the
//!    degrade/recover state machine where attached); successful values land
//!    in the binding's designated slots, failures leave the defaults.
//! 3. Snapshot-and-reset the pulse counter and write the derived dose rate
//!    into its slot.
//! 4. Apply the impossible-reading policy — a triggered check escalates
//!    instead of emitting the record.
//! 5. Compute the checksum, hand the record to the frame writer, publish it
//!    to the latest-record snapshot.
//!
//! ## Supervision
//!
//! The std [`run`](Node::run) loop owns the restart policy: a fatal fault
//! (mandatory sensor absent, impossible reading) tears down nothing less
//! than everything — drivers re-initialized, the pulse window discarded,
//! the scheduler re-anchored. That is the explicit, top-level form of the
//! "reset the device" escape hatch the original firmware buried inside its
//! measurement path.

use heapless::Vec;

use crate::constants::{INIT_BACKOFF_MS, INIT_MAX_ATTEMPTS, MAX_SENSORS, MAX_VALUES_PER_SENSOR};
use crate::errors::{NodeError, NodeResult};
use crate::frame::FrameWriter;
use crate::pulse::{DoseCalibration, PulseCounter};
use crate::record::{SlotIndex, TelemetryRecord};
use crate::recovery::{FaultRecoveryController, GuardedDriver, SampleOutcome};
use crate::scheduler::SampleScheduler;
use crate::time::TimeSource;
use crate::traits::{Delay, OutputSink, SensorDriver};

/// One sensor wired into the record.
///
/// The driver contributes its values, in order, to the listed slots. A
/// binding is `mandatory` by default: if it cannot be initialized at boot
/// the node refuses to start (a permanently zero-filled mandatory slot is
/// garbage, not telemetry). Bindings carrying a recovery controller are
/// exempt — they may start `Down` and self-heal.
pub struct SensorBinding<'a> {
    name: &'static str,
    guarded: GuardedDriver<&'a mut dyn SensorDriver>,
    slots: Vec<SlotIndex, MAX_VALUES_PER_SENSOR>,
    mandatory: bool,
}

impl<'a> SensorBinding<'a> {
    /// Bind `driver` to the given record slots.
    ///
    /// # Panics
    ///
    /// Panics if more than [`MAX_VALUES_PER_SENSOR`] slots are listed —
    /// binding tables are deployment constants, so this is a wiring bug.
    pub fn new(name: &'static str, driver: &'a mut dyn SensorDriver, slots: &[SlotIndex]) -> Self {
        let mut bound = Vec::new();
        for &slot in slots {
            bound
                .push(slot)
                .unwrap_or_else(|_| panic!("binding '{name}' lists too many slots"));
        }
        Self {
            name,
            guarded: GuardedDriver::new(driver),
            slots: bound,
            mandatory: true,
        }
    }

    /// Allow the node to start without this sensor.
    pub fn optional(mut self) -> Self {
        self.mandatory = false;
        self
    }

    /// Attach degrade/recover tracking (implies the sensor may start
    /// `Down` instead of blocking startup).
    pub fn with_recovery(mut self, recovery: FaultRecoveryController) -> Self {
        self.guarded = GuardedDriver::with_recovery(self.guarded.into_inner(), recovery);
        self
    }

    /// Binding name, used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The guard around this binding's driver.
    pub fn guard(&self) -> &GuardedDriver<&'a mut dyn SensorDriver> {
        &self.guarded
    }
}

/// The interrupt-fed pulse source wired into its dose-rate slot.
pub struct PulseBinding<'a> {
    counter: &'a PulseCounter,
    slot: SlotIndex,
    calibration: DoseCalibration,
}

impl<'a> PulseBinding<'a> {
    /// Bind a pulse counter to a slot with the default tube calibration.
    pub fn new(counter: &'a PulseCounter, slot: SlotIndex) -> Self {
        Self {
            counter,
            slot,
            calibration: DoseCalibration::default(),
        }
    }

    /// Override the tube calibration.
    pub fn with_calibration(mut self, calibration: DoseCalibration) -> Self {
        self.calibration = calibration;
        self
    }
}

/// Configurable hard-fault policy for physically impossible cycles.
///
/// Some sensor suites treat certain readings as proof the hardware is in an
/// unknown state and prefer a loud full restart over emitting a bad record.
/// Which readings qualify is data-dependent per suite, so the checks are
/// opt-in rather than hard-coded:
///
/// - `negative_slot`: a slot whose value can never legitimately be negative
///   (absolute pressure, mass concentration). A negative value there means
///   the driver returned garbage.
/// - `fault_on_zero_pulses`: off by default. Zero counts in a window is a
///   legitimate reading at low background levels; enable only for tubes and
///   windows where silence genuinely implies a dead counting chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultPolicy {
    /// Slot that must never go negative, if any.
    pub negative_slot: Option<SlotIndex>,
    /// Treat an empty pulse window as a hard fault.
    pub fault_on_zero_pulses: bool,
}

impl FaultPolicy {
    fn check<const N: usize>(
        &self,
        record: &TelemetryRecord<N>,
        window_count: Option<u32>,
    ) -> NodeResult<()> {
        if let Some(slot) = self.negative_slot {
            if record.get(slot) < 0.0 {
                return Err(NodeError::ImpossibleReading {
                    reason: "negative value in non-negative slot",
                });
            }
        }
        if self.fault_on_zero_pulses && window_count == Some(0) {
            return Err(NodeError::ImpossibleReading {
                reason: "zero pulses in window",
            });
        }
        Ok(())
    }
}

/// Counters for node health, in the spirit of a status page.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeMetrics {
    /// Acquisition cycles completed (records assembled).
    pub cycles: u32,
    /// Frames accepted by the sink.
    pub frames_emitted: u32,
    /// Frames lost to transport errors.
    pub frames_lost: u32,
    /// Sensor reads that failed past the retry.
    pub sensor_failures: u32,
    /// Fatal faults escalated to the supervisor.
    pub faults: u32,
}

/// The generic acquisition node.
///
/// Type parameters: `N` record slots, `S` output sink, `T` time source,
/// `D` delay provider. Construction goes through [`NodeBuilder`].
pub struct Node<'a, const N: usize, S: OutputSink, T: TimeSource, D: Delay> {
    sensors: Vec<SensorBinding<'a>, MAX_SENSORS>,
    pulse: Option<PulseBinding<'a>>,
    policy: FaultPolicy,
    scheduler: SampleScheduler,
    writer: FrameWriter<S>,
    time: T,
    delay: D,
    metrics: NodeMetrics,
    #[cfg(feature = "std")]
    latest: crate::snapshot::LatestRecord<N>,
}

impl<'a, const N: usize, S: OutputSink, T: TimeSource, D: Delay> Node<'a, N, S, T, D> {
    /// Start building a node around a sink, a clock, and a delay provider.
    pub fn builder(sink: S, time: T, delay: D) -> NodeBuilder<'a, N, S, T, D> {
        NodeBuilder {
            sensors: Vec::new(),
            pulse: None,
            policy: FaultPolicy::default(),
            period_ms: crate::constants::DEFAULT_SAMPLE_INTERVAL_MS,
            sink,
            time,
            delay,
        }
    }

    /// Bring every sensor up and anchor the schedule.
    ///
    /// Mandatory bindings without recovery tracking are retried with a fixed
    /// backoff ([`INIT_BACKOFF_MS`] × [`INIT_MAX_ATTEMPTS`]); if one still
    /// fails, the node refuses to start. Recovery-tracked bindings that fail
    /// begin life `Down` and will get cooldown-gated restart attempts.
    /// Also discards any pulses accumulated before the first window opens.
    pub fn init(&mut self) -> NodeResult<()> {
        for binding in self.sensors.iter_mut() {
            let now = self.time.now();
            if binding.guarded.recovery().is_some() {
                if let Err(e) = binding.guarded.init(now) {
                    log_warn!("sensor '{}' starts down: {}", binding.name, e);
                }
                continue;
            }

            let mut attempts = 0;
            loop {
                match binding.guarded.init(self.time.now()) {
                    Ok(()) => break,
                    Err(e) => {
                        attempts += 1;
                        if attempts >= INIT_MAX_ATTEMPTS {
                            if binding.mandatory {
                                self.metrics.faults += 1;
                                return Err(NodeError::SensorInit {
                                    name: binding.name,
                                    source: e,
                                });
                            }
                            log_warn!("optional sensor '{}' unavailable: {}", binding.name, e);
                            break;
                        }
                        self.delay.delay_ms(INIT_BACKOFF_MS);
                    }
                }
            }
        }

        if let Some(pulse) = &self.pulse {
            // Pulses from before the first window belong to no window
            let _ = pulse.counter.snapshot_and_reset();
        }
        self.scheduler.rearm(self.time.now());
        Ok(())
    }

    /// Run one full acquisition cycle and return the finalized record.
    ///
    /// Does not consult the scheduler — [`service`](Self::service) does.
    pub fn acquire(&mut self) -> NodeResult<TelemetryRecord<N>> {
        let now = self.time.now();
        let mut record = TelemetryRecord::new();

        for binding in self.sensors.iter_mut() {
            match binding.guarded.sample(now, &mut self.delay) {
                SampleOutcome::Values(values) => {
                    for (&slot, &value) in binding.slots.iter().zip(values.iter()) {
                        record.set(slot, value);
                    }
                }
                SampleOutcome::Failed(e) => {
                    self.metrics.sensor_failures += 1;
                    log_warn!("sensor '{}' read failed: {}", binding.name, e);
                }
                SampleOutcome::Skipped => {}
            }
        }

        let mut window_count = None;
        if let Some(pulse) = &self.pulse {
            let count = pulse.counter.snapshot_and_reset();
            window_count = Some(count);
            let dose = pulse
                .calibration
                .dose_rate_usv_h(count, self.scheduler.period_ms());
            record.set(pulse.slot, dose);
        }

        if let Err(e) = self.policy.check(&record, window_count) {
            self.metrics.faults += 1;
            return Err(e);
        }

        record.finalize();
        self.metrics.cycles += 1;
        Ok(record)
    }

    /// Service the schedule: run one acquisition per elapsed period.
    ///
    /// Frame-write failures are logged and swallowed (that cycle's record is
    /// lost, the schedule is unaffected). Fatal faults propagate so the
    /// supervisory loop can reinitialize. Returns the number of cycles run.
    pub fn service(&mut self) -> NodeResult<u32> {
        let now = self.time.now();
        let due = self.scheduler.take_due(now);
        for _ in 0..due {
            let record = self.acquire()?;

            #[cfg(feature = "std")]
            self.latest.publish(record);

            match self.writer.write(&record) {
                Ok(()) => self.metrics.frames_emitted += 1,
                Err(e) => {
                    self.metrics.frames_lost += 1;
                    log_warn!("frame dropped: {}", e);
                }
            }
        }
        Ok(due)
    }

    /// Supervisory loop: service the schedule forever, reinitializing every
    /// component from scratch on a fatal fault.
    #[cfg(feature = "std")]
    pub fn run(&mut self) -> ! {
        loop {
            match self.init() {
                Ok(()) => {}
                Err(e) => {
                    log_warn!("init failed, retrying: {}", e);
                    self.delay.delay_ms(INIT_BACKOFF_MS);
                    continue;
                }
            }

            loop {
                match self.service() {
                    Ok(_) => {}
                    Err(e) => {
                        log_warn!("fatal fault, reinitializing: {}", e);
                        break;
                    }
                }

                let now = self.time.now();
                let sleep = self.scheduler.next_due().saturating_sub(now);
                // Cap the sleep so a stepped clock can't park the loop
                self.delay.delay_ms(sleep.min(1_000) as u32);
            }
        }
    }

    /// Handle to the latest-record snapshot for polling collaborators.
    #[cfg(feature = "std")]
    pub fn latest(&self) -> crate::snapshot::LatestRecord<N> {
        self.latest.clone()
    }

    /// Health counters.
    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    /// The output sink, for tests and teardown.
    pub fn sink(&self) -> &S {
        self.writer.sink()
    }

    /// The sensor bindings, for state inspection.
    pub fn sensors(&self) -> &[SensorBinding<'a>] {
        &self.sensors
    }
}

/// Builder for [`Node`]; see the fielded layouts in `constants` for the
/// slot conventions.
pub struct NodeBuilder<'a, const N: usize, S: OutputSink, T: TimeSource, D: Delay> {
    sensors: Vec<SensorBinding<'a>, MAX_SENSORS>,
    pulse: Option<PulseBinding<'a>>,
    policy: FaultPolicy,
    period_ms: u64,
    sink: S,
    time: T,
    delay: D,
}

impl<'a, const N: usize, S: OutputSink, T: TimeSource, D: Delay> NodeBuilder<'a, N, S, T, D> {
    /// Add a sensor binding.
    ///
    /// # Panics
    ///
    /// Panics past [`MAX_SENSORS`] bindings — the binding table is a
    /// deployment constant.
    pub fn sensor(mut self, binding: SensorBinding<'a>) -> Self {
        let name = binding.name;
        self.sensors
            .push(binding)
            .unwrap_or_else(|_| panic!("too many sensor bindings at '{name}'"));
        self
    }

    /// Wire in the pulse counter.
    pub fn pulse(mut self, binding: PulseBinding<'a>) -> Self {
        self.pulse = Some(binding);
        self
    }

    /// Set the impossible-reading policy.
    pub fn policy(mut self, policy: FaultPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the acquisition period.
    pub fn period_ms(mut self, period_ms: u64) -> Self {
        self.period_ms = period_ms;
        self
    }

    /// Finish; the schedule anchors at the current time and
    /// [`Node::init`] still needs to be called (or let [`Node::run`] do it).
    pub fn build(self) -> Node<'a, N, S, T, D> {
        let start = self.time.now();
        Node {
            sensors: self.sensors,
            pulse: self.pulse,
            policy: self.policy,
            scheduler: SampleScheduler::with_period(start, self.period_ms),
            writer: FrameWriter::new(self.sink),
            time: self.time,
            delay: self.delay,
            metrics: NodeMetrics::default(),
            #[cfg(feature = "std")]
            latest: crate::snapshot::LatestRecord::new(),
        }
    }
}
