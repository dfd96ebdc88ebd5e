//! Latest-Record Snapshot for Polling Collaborators
//!
//! Some deployments expose the most recent record on demand — an HTTP
//! handler serializing it as JSON, a status shell command. Those consumers
//! poll at their own pace and must never block or observe a half-written
//! record.
//!
//! The original firmware shared a raw global struct between the measurement
//! loop and the web handler; here the handoff is an explicit reader-writer
//! cell handing out *copies*. Records are a few dozen bytes, so copy-out is
//! cheaper than any scheme that would let a reader hold a reference into
//! the acquisition path.

use std::sync::{Arc, RwLock};

use crate::record::TelemetryRecord;

/// Cloneable handle to the most recently completed record.
///
/// The node publishes after each acquisition cycle; any number of consumer
/// threads read via [`get`](Self::get). `None` until the first cycle
/// completes — consumers distinguish "no data yet" from a zero-filled
/// record.
#[derive(Debug)]
pub struct LatestRecord<const N: usize> {
    inner: Arc<RwLock<Option<TelemetryRecord<N>>>>,
}

impl<const N: usize> Clone for LatestRecord<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<const N: usize> Default for LatestRecord<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LatestRecord<N> {
    /// An empty cell; [`get`](Self::get) returns `None` until the first
    /// publish.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    /// Replace the snapshot. Called by the node once per completed cycle.
    pub fn publish(&self, record: TelemetryRecord<N>) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(record);
        }
        // A poisoned lock means a reader panicked mid-copy; dropping this
        // cycle's snapshot is the least-bad outcome.
    }

    /// Copy out the latest record, if any cycle has completed yet.
    pub fn get(&self) -> Option<TelemetryRecord<N>> {
        self.inner.read().ok().and_then(|guard| *guard)
    }
}
