//! Worker-pool scheduler — accepts jobs without blocking the submitter.
//!
//! A fixed number of workers drain one shared queue in acceptance order.
//! Once a worker picks a job up it owns that job's store record and stage
//! context until the job is terminal; the pool size is the only bound on
//! concurrent pipeline executions (and so on concurrent collaborator load).

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use crate::pipeline::executor;
use crate::pipeline::store::JobStore;
use crate::pipeline::PipelineDeps;

/// Handle to a running worker pool. Cloning shares the same pool; the
/// workers exit when every handle is gone.
#[derive(Clone)]
pub struct Scheduler {
    tx: mpsc::UnboundedSender<Uuid>,
}

impl Scheduler {
    /// Spawns `capacity` workers (at least one) bound to the given store
    /// and collaborators.
    pub fn new(capacity: usize, store: JobStore, deps: PipelineDeps) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Uuid>();
        let rx = Arc::new(Mutex::new(rx));
        let capacity = capacity.max(1);

        for worker in 0..capacity {
            let rx = Arc::clone(&rx);
            let store = store.clone();
            let deps = deps.clone();
            tokio::spawn(async move {
                loop {
                    // The lock is held only while waiting for the next id,
                    // so dequeueing is serialized but execution is not.
                    let next = { rx.lock().await.recv().await };
                    match next {
                        Some(id) => {
                            debug!("Worker {worker} picked up job {id}");
                            executor::run_job(&store, &deps, id).await;
                        }
                        None => break,
                    }
                }
                debug!("Worker {worker} shutting down");
            });
        }

        info!("Scheduler started with {capacity} workers");
        Self { tx }
    }

    /// Enqueues a job for execution and returns immediately. Jobs are
    /// dispatched in acceptance order as workers free up.
    pub fn submit(&self, id: Uuid) -> Result<()> {
        self.tx.send(id).context("scheduler workers are gone")
    }
}
