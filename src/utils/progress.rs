//! Throttled upload progress reporting
//!
//! Destination clients report the cumulative number of bytes transferred as
//! often as they like. The tracker records every value on the destination's
//! progress record, but only feeds the rate meter and appends an
//! `Uploaded: X / Y` transcript line once per reporting interval.

use crate::config::DestinationKind;
use crate::result::{BackupRunResult, UploadState};
use humansize::{format_size, BINARY};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum time between two emitted progress lines
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(1000);

/// Smoothing factor applied to each new rate sample
const RATE_ALPHA: f64 = 0.3;

/// Receives cumulative byte counts from a destination client
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, uploaded_bytes: u64);
}

/// Exponentially weighted moving upload rate
#[derive(Debug, Clone, Default)]
pub struct RateMeter {
    rate: Option<f64>,
}

impl RateMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed `bytes` transferred over `elapsed`; returns the smoothed bytes/second
    pub fn tick(&mut self, bytes: u64, elapsed: Duration) -> f64 {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return self.rate();
        }

        let sample = bytes as f64 / secs;
        let rate = match self.rate {
            Some(previous) => previous + RATE_ALPHA * (sample - previous),
            None => sample,
        };
        self.rate = Some(rate);
        rate
    }

    pub fn rate(&self) -> f64 {
        self.rate.unwrap_or(0.0)
    }
}

#[derive(Debug)]
struct TrackerState {
    last_emit: Instant,
    last_uploaded: u64,
    meter: RateMeter,
}

/// Per-destination progress sink writing into the shared run result
pub struct ProgressTracker {
    kind: DestinationKind,
    result: Arc<BackupRunResult>,
    state: Mutex<TrackerState>,
}

impl ProgressTracker {
    pub fn new(kind: DestinationKind, result: Arc<BackupRunResult>) -> Self {
        Self {
            kind,
            result,
            state: Mutex::new(TrackerState {
                last_emit: Instant::now(),
                last_uploaded: 0,
                meter: RateMeter::new(),
            }),
        }
    }

    /// Record a cumulative byte count observed at `now`
    pub fn record(&self, uploaded_bytes: u64, now: Instant) {
        let total_bytes = self.result.update_status(self.kind, |status| {
            status.progress.uploaded_bytes = uploaded_bytes;
            status.progress.advance(UploadState::Uploading);
            status.progress.total_bytes
        });

        let mut state = self.state.lock();
        let elapsed = now.saturating_duration_since(state.last_emit);
        if elapsed < PROGRESS_INTERVAL {
            return;
        }

        let delta = uploaded_bytes.saturating_sub(state.last_uploaded);
        let rate = state.meter.tick(delta, elapsed);
        state.last_uploaded = uploaded_bytes;
        state.last_emit = now;

        self.result.update_status(self.kind, |status| {
            status.progress.bytes_per_second = rate;
        });

        // Holding the tracker lock keeps this destination's lines in order
        self.result.add_info(format!(
            "Uploaded: {} / {}",
            format_size(uploaded_bytes, BINARY),
            format_size(total_bytes, BINARY)
        ));
    }
}

impl ProgressSink for ProgressTracker {
    fn on_progress(&self, uploaded_bytes: u64) {
        self.record(uploaded_bytes, Instant::now());
    }
}
