// src/registry.rs
//
// =============================================================================
// RENDER-MANAGER: WORKER REGISTRY (v 0.1)
// =============================================================================
//
// The Local Scheduler's inventory, minus the scheduling: this registry only
// tracks who is alive and what they last reported. It trusts the worker's
// self-reported status completely — the Manager never force-transitions a
// worker between ready/rendering/done, it only evicts on silence.

use crate::model::{SystemInfo, WorkerRecord, WorkerStatus};
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HeartbeatInput {
    pub name: String,
    pub status: WorkerStatus,
    pub job_id: Option<u64>,
    pub ip: String,
    pub frames_rendered: i64,
    pub jobs_completed: i64,
    pub errors: i64,
    pub system_info: Option<SystemInfo>,
}

/// Returned so the caller can emit the "worker connected" activity/alert
/// pair without the registry owning the Observability rings directly.
pub struct HeartbeatOutcome {
    pub newly_connected: bool,
}

#[derive(Default)]
pub struct WorkerRegistry {
    workers: HashMap<String, WorkerRecord>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkerRecord> {
        self.workers.values()
    }

    pub fn count_with_status(&self, status: WorkerStatus) -> usize {
        self.workers
            .values()
            .filter(|w| w.status == status)
            .count()
    }

    /// Inserts on first heartbeat (a fresh connection resets counters from
    /// what the worker itself reports — eviction is idempotent and a
    /// re-appearing worker is treated as new, never merged with stale
    /// state), otherwise updates in place. Always succeeds.
    pub fn observe_heartbeat(&mut self, input: HeartbeatInput, now: Instant) -> HeartbeatOutcome {
        let newly_connected = !self.workers.contains_key(&input.name);

        let entry = self
            .workers
            .entry(input.name.clone())
            .or_insert_with(|| WorkerRecord {
                name: input.name.clone(),
                status: input.status,
                current_job_id: None,
                ip: String::new(),
                last_seen: now,
                connected_at: now,
                connected_at_wall: chrono::Utc::now(),
                frames_rendered: 0,
                jobs_completed: 0,
                errors: 0,
                system_info: None,
                success_rate: 100.0,
            });

        entry.status = input.status;
        entry.current_job_id = input.job_id;
        entry.ip = input.ip;
        entry.frames_rendered = input.frames_rendered;
        entry.jobs_completed = input.jobs_completed;
        entry.errors = input.errors;
        if input.system_info.is_some() {
            entry.system_info = input.system_info;
        }
        entry.last_seen = now;

        HeartbeatOutcome { newly_connected }
    }

    /// Removes any record silent for longer than `timeout`. Returns the
    /// names evicted so the caller can log/alert per name.
    pub fn evict_stale(&mut self, now: Instant, timeout: Duration) -> Vec<String> {
        let stale: Vec<String> = self
            .workers
            .iter()
            .filter(|(_, w)| now.duration_since(w.last_seen) > timeout)
            .map(|(name, _)| name.clone())
            .collect();

        for name in &stale {
            self.workers.remove(name);
        }

        stale
    }
}
