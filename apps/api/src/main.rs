mod config;
mod db;
mod errors;
mod history;
mod llm_client;
mod pipeline;
mod render;
mod routes;
mod state;
mod templates;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::history::PgOutcomeRecorder;
use crate::llm_client::LlmClient;
use crate::pipeline::scheduler::Scheduler;
use crate::pipeline::store::JobStore;
use crate::pipeline::{PipelineDeps, PipelineSettings};
use crate::render::PdfLatexCompiler;
use crate::routes::build_router;
use crate::state::AppState;
use crate::templates::FileTemplateProvider;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("tailor_api={}", &config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Compiled artifacts land here; pdflatex needs it to exist up front.
    std::fs::create_dir_all(&config.output_dir)?;

    // Initialize PostgreSQL (history/usage collaborator)
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Wire the pipeline collaborators
    let deps = PipelineDeps {
        generator: Arc::new(llm),
        templates: Arc::new(FileTemplateProvider::new(&config.templates_dir)),
        compiler: Arc::new(PdfLatexCompiler::new(
            &config.pdflatex_bin,
            &config.output_dir,
        )),
        recorder: Arc::new(PgOutcomeRecorder::new(db)),
        settings: PipelineSettings {
            fallback_ats_score: config.fallback_ats_score,
        },
    };

    // Job store and worker pool
    let store = JobStore::new();
    let scheduler = Scheduler::new(config.worker_count, store.clone(), deps);

    // Build app state
    let state = AppState {
        store,
        scheduler,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
