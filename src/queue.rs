// src/queue.rs
//
// =============================================================================
// RENDER-MANAGER: JOB QUEUE (v 0.1)
// =============================================================================
//
// A plain FIFO. Every submission goes through here — even when the Manager
// is FREE — so there is exactly one dispatch path (see lifecycle.rs).

use crate::model::JobDescriptor;
use std::collections::VecDeque;

#[derive(Default)]
pub struct JobQueue {
    pending: VecDeque<JobDescriptor>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the 1-based position of the newly appended job.
    pub fn append(&mut self, desc: JobDescriptor) -> usize {
        self.pending.push_back(desc);
        self.pending.len()
    }

    pub fn pop_head(&mut self) -> Option<JobDescriptor> {
        self.pending.pop_front()
    }

    pub fn size(&self) -> usize {
        self.pending.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobDescriptor> {
        self.pending.iter()
    }
}
