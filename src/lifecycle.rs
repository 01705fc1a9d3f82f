// src/lifecycle.rs
//
// =============================================================================
// RENDER-MANAGER: LIFECYCLE ENGINE (v 0.1)
// =============================================================================
//
// The FREE -> WORKING -> CONFIG -> FREE state machine, ticked at ~1 Hz by the
// background ticker in main.rs. Grounded on the teacher's `marketplace.rs`
// `MarketplaceCoordinator::tick()`, simplified from a DAG scheduler down to a
// single-active-job barrier: this Manager dispatches one whole-animation job
// at a time and waits for every connected worker to self-report "done"
// before finalizing it. There is no partial credit and no re-dispatch; a
// worker that never reports "done" stalls the barrier until it is evicted.

use crate::history::HistoryStore;
use crate::model::{ActiveJob, JobHistoryRecord, LifecycleState, WorkerStatus};
use crate::observability::{AlertLevel, Observability};
use crate::queue::JobQueue;
use crate::registry::WorkerRegistry;
use std::time::Instant;

/// Logged every 5 ticks while FREE and waiting on stragglers to drain to
/// "done", and every 10 ticks while WORKING. Counts ticks in the *current*
/// state rather than reading the wall clock modulo N, so a state change
/// always restarts the cadence instead of inheriting stale phase.
const FREE_LOG_INTERVAL: u64 = 5;
const WORKING_LOG_INTERVAL: u64 = 10;

pub struct Lifecycle {
    state: LifecycleState,
    active_job: Option<ActiveJob>,
    next_job_id: u64,
    ticks_in_state: u64,
    history_store: HistoryStore,
}

impl Lifecycle {
    pub fn new(history_store: HistoryStore) -> Self {
        Self {
            state: LifecycleState::Free,
            active_job: None,
            next_job_id: 0,
            ticks_in_state: 0,
            history_store,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn active_job(&self) -> Option<&ActiveJob> {
        self.active_job.as_ref()
    }

    /// The id the Dispatch API reports: the active job's id while one is in
    /// flight, otherwise the id the next dispatched job will receive.
    pub fn reported_job_id(&self) -> u64 {
        self.active_job
            .as_ref()
            .map(|j| j.job_id)
            .unwrap_or(self.next_job_id)
    }

    /// Re-scans the active job's output directory and recomputes progress.
    /// Returns `None` when there is no active job, or when the job has no
    /// `total_frames` to measure progress against - matching the original
    /// dashboard contract, which omits progress entirely rather than report
    /// a meaningless 0%.
    pub fn refresh_progress(&mut self, now: Instant) -> Option<crate::observability::JobProgress> {
        let job = self.active_job.as_mut()?;
        if job.descriptor.total_frames == 0 {
            return None;
        }

        if !job.descriptor.output_path.is_empty() {
            if let Some(dir) = crate::scanner::resolve_render_dir(&job.descriptor.output_path) {
                job.completed_frames = crate::scanner::count_frames(&dir);
            }
        }

        Some(crate::observability::compute_progress(
            job.descriptor.total_frames,
            job.completed_frames,
            job.start_time,
            now,
        ))
    }

    fn enter(&mut self, state: LifecycleState) {
        self.state = state;
        self.ticks_in_state = 0;
    }

    /// Runs one tick of the state machine. `history` is loaded eagerly by the
    /// caller so this function can append new records into it.
    pub fn tick(
        &mut self,
        queue: &mut JobQueue,
        registry: &WorkerRegistry,
        history: &mut Vec<JobHistoryRecord>,
        obs: &mut Observability,
        now: Instant,
    ) {
        self.ticks_in_state += 1;

        match self.state {
            LifecycleState::Free => self.tick_free(queue, registry, obs, now),
            LifecycleState::Working => self.tick_working(registry, obs),
            LifecycleState::Config => self.tick_config(registry, history, obs, now),
        }
    }

    /// FREE will not dequeue a new job while any worker still reports
    /// "done" from a previous job - that straggler has to drain into CONFIG
    /// first or the next job would dispatch onto a worker that is still
    /// reporting stale completion state.
    fn tick_free(
        &mut self,
        queue: &mut JobQueue,
        registry: &WorkerRegistry,
        obs: &mut Observability,
        now: Instant,
    ) {
        if queue.size() == 0 {
            return;
        }

        if !registry.is_empty() {
            let done_count = registry.count_with_status(WorkerStatus::Done);
            if done_count > 0 {
                if self.ticks_in_state % FREE_LOG_INTERVAL == 0 {
                    obs.log_activity(format!(
                        "Waiting for {done_count} worker(s) to drain from previous job before dispatching"
                    ));
                }
                return;
            }

            let ready_count = registry.count_with_status(WorkerStatus::Ready);
            if ready_count == 0 {
                // every connected worker is mid-render from a job this
                // Manager has no record of - wait rather than dispatch onto
                // a fleet with nothing free to take it.
                return;
            }
        }

        let descriptor = match queue.pop_head() {
            Some(d) => d,
            None => return,
        };

        let job_id = self.next_job_id;
        self.next_job_id += 1;

        obs.log_activity(format!(
            "Dispatching job {job_id} ({}) to the worker fleet",
            descriptor.blend_file
        ));
        obs.add_alert(AlertLevel::Info, format!("Starting: {}", descriptor.blend_file));
        self.active_job = Some(ActiveJob::new(job_id, descriptor, now));
        self.enter(LifecycleState::Working);
    }

    /// WORKING requires at least one connected worker before it will
    /// consider the job complete - an empty fleet can never produce "all
    /// done" and must not be confused with a finished job.
    fn tick_working(&mut self, registry: &WorkerRegistry, obs: &mut Observability) {
        if registry.is_empty() {
            return;
        }

        let done = registry.count_with_status(WorkerStatus::Done);
        let all_done = done == registry.len();

        if all_done {
            obs.log_activity("All workers report done, finalizing job".to_string());
            self.enter(LifecycleState::Config);
            return;
        }

        if self.ticks_in_state % WORKING_LOG_INTERVAL == 0 {
            if let Some(job) = &self.active_job {
                obs.log_activity(format!(
                    "Job {} in progress: {done}/{} workers done",
                    job.job_id,
                    registry.len()
                ));
            }
        }
    }

    /// CONFIG finalizes the completed job into history, rolls metrics, and
    /// clears the active slot so the next FREE tick can dispatch again. Runs
    /// synchronously within the tick since the only work is an in-memory
    /// append plus a file write the caller has already handed us.
    fn tick_config(
        &mut self,
        registry: &WorkerRegistry,
        history: &mut Vec<JobHistoryRecord>,
        obs: &mut Observability,
        now: Instant,
    ) {
        let mut job = match self.active_job.take() {
            Some(job) => job,
            None => {
                self.enter(LifecycleState::Free);
                return;
            }
        };

        if !job.descriptor.output_path.is_empty() {
            if let Some(dir) = crate::scanner::resolve_render_dir(&job.descriptor.output_path) {
                job.completed_frames = crate::scanner::count_frames(&dir);
            }
        }

        let duration = now.duration_since(job.start_time);
        let finished_at = chrono::Utc::now();
        let record = JobHistoryRecord {
            job_id: job.job_id,
            blend_file: job.descriptor.blend_file.clone(),
            output_path: job.descriptor.output_path.clone(),
            total_frames: job.descriptor.total_frames,
            completed_frames: job.completed_frames,
            duration: duration.as_secs_f64(),
            workers_used: registry.len(),
            completed_at: finished_at.timestamp() as f64
                + finished_at.timestamp_subsec_nanos() as f64 / 1e9,
            datetime: finished_at,
        };

        history.push(record);
        if history.len() > crate::history::HISTORY_CAP {
            let overflow = history.len() - crate::history::HISTORY_CAP;
            history.drain(0..overflow);
        }
        self.history_store.save(history);

        obs.record_job_completion(duration);
        obs.log_activity(format!(
            "Job {} complete in {:.1}s ({} frames)",
            job.job_id,
            duration.as_secs_f64(),
            job.completed_frames
        ));
        obs.add_alert(
            AlertLevel::Info,
            format!("Job {} ({}) finished", job.job_id, job.descriptor.blend_file),
        );

        self.enter(LifecycleState::Free);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JobDescriptor;
    use crate::registry::HeartbeatInput;
    use std::time::Duration;
    use tempfile::TempDir;

    fn descriptor(name: &str) -> JobDescriptor {
        JobDescriptor {
            blend_file: name.to_string(),
            output_path: String::new(),
            total_frames: 10,
            frame_range: Default::default(),
            resolution: Default::default(),
            render_engine: "CYCLES".into(),
        }
    }

    fn heartbeat(name: &str, status: WorkerStatus) -> HeartbeatInput {
        HeartbeatInput {
            name: name.to_string(),
            status,
            job_id: None,
            ip: "127.0.0.1".into(),
            frames_rendered: 0,
            jobs_completed: 0,
            errors: 0,
            system_info: None,
        }
    }

    fn lifecycle() -> (Lifecycle, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = HistoryStore::new(tmp.path().join("job_history.json"));
        (Lifecycle::new(store), tmp)
    }

    #[test]
    fn free_with_empty_queue_stays_free() {
        let (mut lc, _tmp) = lifecycle();
        let mut queue = JobQueue::new();
        let registry = WorkerRegistry::new();
        let mut history = Vec::new();
        let mut obs = Observability::new();

        lc.tick(&mut queue, &registry, &mut history, &mut obs, Instant::now());
        assert_eq!(lc.state(), LifecycleState::Free);
    }

    #[test]
    fn single_worker_single_job_runs_full_cycle() {
        let (mut lc, _tmp) = lifecycle();
        let mut queue = JobQueue::new();
        let mut registry = WorkerRegistry::new();
        let mut history = Vec::new();
        let mut obs = Observability::new();
        let t0 = Instant::now();

        queue.append(descriptor("a.blend"));
        registry.observe_heartbeat(heartbeat("W1", WorkerStatus::Ready), t0);

        lc.tick(&mut queue, &registry, &mut history, &mut obs, t0);
        assert_eq!(lc.state(), LifecycleState::Working);
        assert_eq!(lc.active_job().unwrap().job_id, 0);

        let t1 = t0 + Duration::from_secs(5);
        registry.observe_heartbeat(heartbeat("W1", WorkerStatus::Rendering), t1);
        lc.tick(&mut queue, &registry, &mut history, &mut obs, t1);
        assert_eq!(lc.state(), LifecycleState::Working);

        let t2 = t1 + Duration::from_secs(5);
        registry.observe_heartbeat(heartbeat("W1", WorkerStatus::Done), t2);
        lc.tick(&mut queue, &registry, &mut history, &mut obs, t2);
        assert_eq!(lc.state(), LifecycleState::Config);

        let t3 = t2 + Duration::from_millis(1);
        lc.tick(&mut queue, &registry, &mut history, &mut obs, t3);
        assert_eq!(lc.state(), LifecycleState::Free);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].blend_file, "a.blend");
    }

    #[test]
    fn two_workers_both_must_report_done() {
        let (mut lc, _tmp) = lifecycle();
        let mut queue = JobQueue::new();
        let mut registry = WorkerRegistry::new();
        let mut history = Vec::new();
        let mut obs = Observability::new();
        let t0 = Instant::now();

        queue.append(descriptor("a.blend"));
        registry.observe_heartbeat(heartbeat("W1", WorkerStatus::Ready), t0);
        registry.observe_heartbeat(heartbeat("W2", WorkerStatus::Ready), t0);
        lc.tick(&mut queue, &registry, &mut history, &mut obs, t0);
        assert_eq!(lc.state(), LifecycleState::Working);

        registry.observe_heartbeat(heartbeat("W1", WorkerStatus::Done), t0);
        lc.tick(&mut queue, &registry, &mut history, &mut obs, t0);
        assert_eq!(lc.state(), LifecycleState::Working, "W2 hasn't reported done yet");

        registry.observe_heartbeat(heartbeat("W2", WorkerStatus::Done), t0);
        lc.tick(&mut queue, &registry, &mut history, &mut obs, t0);
        assert_eq!(lc.state(), LifecycleState::Config);
    }

    #[test]
    fn free_waits_for_stragglers_to_drain_before_next_dispatch() {
        let (mut lc, _tmp) = lifecycle();
        let mut queue = JobQueue::new();
        let mut registry = WorkerRegistry::new();
        let mut history = Vec::new();
        let mut obs = Observability::new();
        let t0 = Instant::now();

        registry.observe_heartbeat(heartbeat("W1", WorkerStatus::Done), t0);
        queue.append(descriptor("b.blend"));

        lc.tick(&mut queue, &registry, &mut history, &mut obs, t0);
        assert_eq!(lc.state(), LifecycleState::Free);
        assert_eq!(queue.size(), 1, "job must not dispatch onto a stale done worker");
    }

    #[test]
    fn history_truncates_at_fifty_one_jobs() {
        let (mut lc, _tmp) = lifecycle();
        let mut queue = JobQueue::new();
        let mut registry = WorkerRegistry::new();
        let mut history = Vec::new();
        let mut obs = Observability::new();
        let t0 = Instant::now();

        registry.observe_heartbeat(heartbeat("W1", WorkerStatus::Ready), t0);

        for i in 0..51 {
            queue.append(descriptor(&format!("job_{i}.blend")));
            lc.tick(&mut queue, &registry, &mut history, &mut obs, t0);
            assert_eq!(lc.state(), LifecycleState::Working);

            registry.observe_heartbeat(heartbeat("W1", WorkerStatus::Done), t0);
            lc.tick(&mut queue, &registry, &mut history, &mut obs, t0);
            assert_eq!(lc.state(), LifecycleState::Config);

            lc.tick(&mut queue, &registry, &mut history, &mut obs, t0);
            assert_eq!(lc.state(), LifecycleState::Free);

            registry.observe_heartbeat(heartbeat("W1", WorkerStatus::Ready), t0);
        }

        assert_eq!(history.len(), crate::history::HISTORY_CAP);
        assert_eq!(history.first().unwrap().blend_file, "job_1.blend");
        assert_eq!(history.last().unwrap().blend_file, "job_50.blend");
    }
}
