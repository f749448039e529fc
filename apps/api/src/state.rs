use crate::config::Config;
use crate::pipeline::scheduler::Scheduler;
use crate::pipeline::store::JobStore;

/// Shared application state injected into all route handlers via Axum
/// extractors. The store and scheduler are handles; cloning the state
/// shares the same job map and worker pool.
#[derive(Clone)]
pub struct AppState {
    pub store: JobStore,
    pub scheduler: Scheduler,
    pub config: Config,
}
