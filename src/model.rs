// src/model.rs
//
// =============================================================================
// RENDER-MANAGER: CORE SCHEMA (v 0.1)
// =============================================================================
//
// The data contracts shared by the Lifecycle Engine, the Worker Registry,
// the Job Queue and the Dispatch API. Kept deliberately flat: this crate
// dispatches whole-animation jobs, it does not split frames, so there is no
// DAG here, just a FIFO of descriptors and a single active slot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

// ============================================================================
// 1. JOB DESCRIPTOR (the submitted, immutable request)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameRange {
    pub start: i64,
    pub end: i64,
}

impl Default for FrameRange {
    fn default() -> Self {
        Self { start: 1, end: 250 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resolution {
    pub x: i64,
    pub y: i64,
}

impl Default for Resolution {
    fn default() -> Self {
        Self { x: 1920, y: 1080 }
    }
}

fn default_render_engine() -> String {
    "CYCLES".to_string()
}

/// Immutable once submitted. `total_frames` is advisory against
/// `frame_range`, not enforced (spec treats the mismatch as the client's
/// problem, not ours).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobDescriptor {
    pub blend_file: String,
    #[serde(default)]
    pub output_path: String,
    #[serde(default)]
    pub total_frames: i64,
    #[serde(default)]
    pub frame_range: FrameRange,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default = "default_render_engine")]
    pub render_engine: String,
}

// ============================================================================
// 2. ACTIVE JOB (JobDescriptor + runtime progress)
// ============================================================================

/// At most one exists at any moment. Created on FREE->WORKING, cleared on
/// CONFIG->FREE. `start_time` is wall-clock-monotonic (`Instant`), not
/// serialized directly — the Dispatch API reports derived progress instead.
#[derive(Debug, Clone)]
pub struct ActiveJob {
    pub descriptor: JobDescriptor,
    pub job_id: u64,
    pub start_time: Instant,
    pub completed_frames: i64,
}

impl ActiveJob {
    pub fn new(job_id: u64, descriptor: JobDescriptor, now: Instant) -> Self {
        Self {
            descriptor,
            job_id,
            start_time: now,
            completed_frames: 0,
        }
    }
}

// ============================================================================
// 3. WORKER REGISTRY RECORDS
// ============================================================================

/// Self-reported by the worker; the Manager never force-transitions this.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Ready,
    Rendering,
    Done,
}

impl WorkerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerStatus::Ready => "ready",
            WorkerStatus::Rendering => "rendering",
            WorkerStatus::Done => "done",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SystemInfo {
    #[serde(default)]
    pub cpu_percent: Option<f64>,
    #[serde(default)]
    pub memory_percent: Option<f64>,
}

/// A record exists iff a heartbeat from `name` arrived within the last
/// timeout window. `last_seen`/`connected_at` are monotonic instants kept
/// out of the serialized form; the Dispatch API reports the fields the
/// original dashboard contract expects instead (see `registry::WorkerView`).
#[derive(Debug, Clone)]
pub struct WorkerRecord {
    pub name: String,
    pub status: WorkerStatus,
    pub current_job_id: Option<u64>,
    pub ip: String,
    pub last_seen: Instant,
    pub connected_at: Instant,
    pub connected_at_wall: DateTime<Utc>,
    pub frames_rendered: i64,
    pub jobs_completed: i64,
    pub errors: i64,
    pub system_info: Option<SystemInfo>,
    /// Always 100.0 on (re)connect. The original never recomputes this from
    /// observed errors/jobs_completed; preserved as a quirk, not derived.
    pub success_rate: f64,
}

// ============================================================================
// 4. JOB HISTORY (append-only, bounded ring)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobHistoryRecord {
    pub job_id: u64,
    pub blend_file: String,
    pub output_path: String,
    pub total_frames: i64,
    pub completed_frames: i64,
    pub duration: f64,
    pub workers_used: usize,
    pub completed_at: f64,
    pub datetime: DateTime<Utc>,
}

// ============================================================================
// 5. LIFECYCLE STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Free,
    Working,
    Config,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Free => "free",
            LifecycleState::Working => "working",
            LifecycleState::Config => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_descriptor_defaults_match_spec() {
        let json = r#"{"blend_file": "/a.blend"}"#;
        let desc: JobDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(desc.output_path, "");
        assert_eq!(desc.total_frames, 0);
        assert_eq!(desc.frame_range, FrameRange { start: 1, end: 250 });
        assert_eq!(desc.resolution, Resolution { x: 1920, y: 1080 });
        assert_eq!(desc.render_engine, "CYCLES");
    }

    #[test]
    fn worker_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&WorkerStatus::Rendering).unwrap(),
            "\"rendering\""
        );
    }

    #[test]
    fn lifecycle_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&LifecycleState::Working).unwrap(),
            "\"working\""
        );
    }
}
