// src/history.rs
//
// =============================================================================
// RENDER-MANAGER: PERSISTENCE STORE (v 0.1)
// =============================================================================
//
// A single JSON file holding the bounded history ring. Unlike the teacher's
// `checkpoint.rs` (a SQLite-backed, query-optimized store), the spec asks
// for a plain newest-last JSON array file — simplicity over query power is
// the right trade here: the only readers are `GET /history` and the ring
// itself at startup, both of which want "the whole thing" every time.

use crate::model::JobHistoryRecord;
use std::path::{Path, PathBuf};

pub const HISTORY_CAP: usize = 50;

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the file if present, keeps at most the newest `HISTORY_CAP`
    /// entries. Any parse/read error returns an empty ring rather than
    /// failing startup — history is best-effort recovery, not durability.
    pub fn load(&self) -> Vec<JobHistoryRecord> {
        match std::fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Vec<JobHistoryRecord>>(&bytes) {
                Ok(mut records) => {
                    if records.len() > HISTORY_CAP {
                        records.drain(0..records.len() - HISTORY_CAP);
                    }
                    records
                }
                Err(e) => {
                    log::error!("History file corrupt, starting empty: {e}");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                log::error!("Failed to read history file: {e}");
                Vec::new()
            }
        }
    }

    /// Overwrites the file with the full ring, pretty-printed. Best-effort:
    /// a write failure is logged, not propagated — the in-memory ring
    /// remains the source of truth for the rest of the process lifetime.
    pub fn save(&self, records: &[JobHistoryRecord]) {
        match serde_json::to_vec_pretty(records) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(&self.path, bytes) {
                    log::error!("Failed to write history file: {e}");
                }
            }
            Err(e) => log::error!("Failed to serialize history: {e}"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
