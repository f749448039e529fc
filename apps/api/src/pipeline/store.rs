//! In-memory job store — the single resource shared across workers.
//!
//! A cheap `Clone` handle over a lock-guarded map. Readers take cloned
//! snapshots; every mutation runs as one closure under the write lock, so a
//! poller can never observe a half-applied update (e.g. a completed state
//! with the result still unset). Nothing here awaits while holding the lock.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::pipeline::job::{Job, JobInput};

#[derive(Clone, Default)]
pub struct JobStore {
    inner: Arc<RwLock<HashMap<Uuid, Job>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an id and inserts a new queued job. Safe to call
    /// concurrently with reads and writes for other jobs.
    pub fn create(&self, input: JobInput) -> Uuid {
        let id = Uuid::new_v4();
        let job = Job::new(id, input);
        self.inner
            .write()
            .expect("job store lock poisoned")
            .insert(id, job);
        id
    }

    /// Returns a snapshot of the current record, or `None` for unknown ids.
    /// Blocks only on the store's own critical section, never on a job's
    /// pipeline execution.
    pub fn get(&self, id: Uuid) -> Option<Job> {
        self.inner
            .read()
            .expect("job store lock poisoned")
            .get(&id)
            .cloned()
    }

    /// Applies a mutation to one record under the write lock. Callers are
    /// the owning worker only; returns `false` for unknown ids.
    pub fn update(&self, id: Uuid, mutate: impl FnOnce(&mut Job)) -> bool {
        let mut jobs = self.inner.write().expect("job store lock poisoned");
        match jobs.get_mut(&id) {
            Some(job) => {
                mutate(job);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.read().expect("job store lock poisoned").len()
    }
}
