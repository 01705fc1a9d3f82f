// src/state.rs
//
// =============================================================================
// RENDER-MANAGER: COORDINATOR STATE (v 0.1)
// =============================================================================
//
// One struct, one lock. Grounded on `MarketplaceCoordinator` (marketplace.rs),
// which also keeps its ledger, queue and log buffers behind a single mutex
// rather than one lock per field - the tick and every HTTP handler touch
// several of these together often enough that per-field locking would just
// move the contention, not remove it. Filesystem work (history persistence,
// output scanning) happens with the lock held here too: both are local disk
// reads/writes on a small, bounded amount of data, so the stall is
// negligible next to the cost of re-architecting around finer-grained
// locking the spec doesn't ask for.

use crate::config::ManagerConfig;
use crate::history::HistoryStore;
use crate::lifecycle::Lifecycle;
use crate::model::JobHistoryRecord;
use crate::observability::{AlertLevel, Observability};
use crate::queue::JobQueue;
use crate::registry::WorkerRegistry;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

pub struct CoordinatorState {
    pub config: ManagerConfig,
    pub lifecycle: Lifecycle,
    pub registry: WorkerRegistry,
    pub queue: JobQueue,
    pub observability: Observability,
    pub history: Vec<JobHistoryRecord>,
}

impl CoordinatorState {
    pub fn new(config: ManagerConfig) -> Self {
        let history_store = HistoryStore::new(config.history_path.clone());
        let history = history_store.load();
        Self {
            config,
            lifecycle: Lifecycle::new(history_store),
            registry: WorkerRegistry::new(),
            queue: JobQueue::new(),
            observability: Observability::new(),
            history,
        }
    }

    /// Runs the evict-then-tick pass driven by the background ticker. Stale
    /// workers are reaped before the lifecycle state machine looks at the
    /// registry so a silent worker never counts toward a "done" barrier.
    pub fn tick(&mut self, now: Instant) {
        let evicted = self.registry.evict_stale(now, self.config.worker_timeout);
        for name in evicted {
            self.observability.log_activity_warn(format!(
                "Evicted worker '{name}' after heartbeat timeout"
            ));
            self.observability.add_alert(
                AlertLevel::Error,
                format!("Worker '{name}' timed out and was evicted"),
            );
        }

        // Sampled unconditionally every tick, not just while WORKING - the
        // original updates peak_workers in its cleanup section regardless of
        // manager_state (manager.py:191-194).
        self.observability.note_peak_workers(self.registry.len());

        self.lifecycle.tick(
            &mut self.queue,
            &self.registry,
            &mut self.history,
            &mut self.observability,
            now,
        );
    }
}

pub type SharedState = Arc<Mutex<CoordinatorState>>;

pub fn new_shared_state(config: ManagerConfig) -> SharedState {
    Arc::new(Mutex::new(CoordinatorState::new(config)))
}
