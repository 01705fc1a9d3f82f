// src/observability.rs
//
// =============================================================================
// RENDER-MANAGER: OBSERVABILITY (v 0.1)
// =============================================================================
//
// Three bounded rings (activity, error, alert) plus the derived metrics the
// Dispatch API reports alongside them. Grounded on the teacher's `LogBuffer`
// (src/logs.rs): a capacity-bounded `VecDeque` behind a mutex, oldest entry
// evicted on overflow. Here the rings live inside `CoordinatorState` instead
// of behind their own `Arc<Mutex<..>>`, since the whole state tree already
// shares one lock (see state.rs).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const ACTIVITY_LOG_CAP: usize = 200;
pub const ERROR_LOG_CAP: usize = 100;
pub const ALERT_LOG_CAP: usize = 20;

/// A single ring with a fixed capacity, oldest entry dropped on overflow.
#[derive(Debug, Default)]
pub struct BoundedRing<T> {
    cap: usize,
    entries: VecDeque<T>,
}

impl<T> BoundedRing<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            entries: VecDeque::with_capacity(cap),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.entries.len() >= self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(item);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every ring entry carries both a Unix-epoch `timestamp` and an ISO-8601
/// `datetime`, matching the original dashboard contract - some consumers
/// sort/diff on the float, others just want something human-readable.
fn unix_timestamp(at: DateTime<Utc>) -> f64 {
    at.timestamp() as f64 + at.timestamp_subsec_nanos() as f64 / 1e9
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub timestamp: f64,
    pub datetime: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    pub timestamp: f64,
    pub datetime: DateTime<Utc>,
    pub worker: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertEntry {
    pub timestamp: f64,
    pub datetime: DateTime<Utc>,
    pub level: AlertLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
}

/// Counters that accumulate for the lifetime of the process; never rolled
/// back by eviction or ring truncation.
#[derive(Debug, Default, Serialize)]
pub struct Metrics {
    pub total_jobs_completed: u64,
    pub total_render_time: f64,
    pub peak_workers: usize,
}

#[derive(Default)]
pub struct Observability {
    pub activity: BoundedRing<ActivityEntry>,
    pub errors: BoundedRing<ErrorEntry>,
    pub alerts: BoundedRing<AlertEntry>,
    pub metrics: Metrics,
}

impl Observability {
    pub fn new() -> Self {
        Self {
            activity: BoundedRing::new(ACTIVITY_LOG_CAP),
            errors: BoundedRing::new(ERROR_LOG_CAP),
            alerts: BoundedRing::new(ALERT_LOG_CAP),
            metrics: Metrics::default(),
        }
    }

    pub fn log_activity(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{message}");
        let now = Utc::now();
        self.activity.push(ActivityEntry {
            timestamp: unix_timestamp(now),
            datetime: now,
            message,
        });
    }

    /// Same ring, but stamped to stdout at `warn` level - used for the
    /// straggler/eviction events the spec calls out as warning-level.
    pub fn log_activity_warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        let now = Utc::now();
        self.activity.push(ActivityEntry {
            timestamp: unix_timestamp(now),
            datetime: now,
            message,
        });
    }

    pub fn log_error(&mut self, worker: impl Into<String>, message: impl Into<String>) {
        let worker = worker.into();
        let message = message.into();
        log::error!("[{worker}] {message}");
        let now = Utc::now();
        self.errors.push(ErrorEntry {
            timestamp: unix_timestamp(now),
            datetime: now,
            worker,
            message,
        });
    }

    pub fn add_alert(&mut self, level: AlertLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            AlertLevel::Error => log::error!("{message}"),
            AlertLevel::Warning => log::warn!("{message}"),
            AlertLevel::Info => log::info!("{message}"),
        }
        let now = Utc::now();
        self.alerts.push(AlertEntry {
            timestamp: unix_timestamp(now),
            datetime: now,
            level,
            message,
        });
    }

    pub fn note_peak_workers(&mut self, current: usize) {
        if current > self.metrics.peak_workers {
            self.metrics.peak_workers = current;
        }
    }

    pub fn record_job_completion(&mut self, duration: Duration) {
        self.metrics.total_jobs_completed += 1;
        self.metrics.total_render_time += duration.as_secs_f64();
    }
}

// ============================================================================
// PROGRESS COMPUTATION
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct JobProgress {
    pub progress_percent: f64,
    pub elapsed_seconds: f64,
    pub avg_time_per_frame: Option<f64>,
    pub estimated_remaining_seconds: Option<f64>,
}

/// Derives progress from elapsed wall time and a frame count. `total_frames
/// <= 0` yields 0% rather than dividing by zero; `completed_frames <= 0`
/// yields no rate/ETA estimate since there is nothing to extrapolate from.
pub fn compute_progress(
    total_frames: i64,
    completed_frames: i64,
    start_time: Instant,
    now: Instant,
) -> JobProgress {
    let elapsed = now.duration_since(start_time).as_secs_f64();

    let progress_percent = if total_frames > 0 {
        (completed_frames as f64 / total_frames as f64 * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let (avg_time_per_frame, estimated_remaining_seconds) = if completed_frames > 0 {
        let avg = elapsed / completed_frames as f64;
        let remaining_frames = (total_frames - completed_frames).max(0) as f64;
        (Some(avg), Some(avg * remaining_frames))
    } else {
        (None, None)
    };

    JobProgress {
        progress_percent,
        elapsed_seconds: elapsed,
        avg_time_per_frame,
        estimated_remaining_seconds,
    }
}
