//! The asynchronous tailoring pipeline: job records, the shared store, the
//! worker-pool scheduler, and the stage executor.
//!
//! External systems enter the pipeline only through the collaborator traits
//! below, carried as `Arc<dyn …>` in [`PipelineDeps`]. Tests swap them for
//! scripted mocks; production wires the Anthropic client, the pdflatex
//! runner, the template directory, and Postgres.

pub mod executor;
pub mod job;
pub mod prompts;
pub mod scheduler;
pub mod store;

#[cfg(test)]
pub mod testkit;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::pipeline::job::Analysis;

/// Text-generation collaborator: prompt in, prose out. May fail or return
/// malformed content; the executor decides what is recoverable.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, system: &str) -> Result<String>;
}

/// Which document template to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Cv,
    CoverLetter,
}

/// Source of the LaTeX document skeletons.
#[async_trait]
pub trait TemplateProvider: Send + Sync {
    async fn get(&self, kind: TemplateKind) -> Result<String>;
}

/// Document-compilation collaborator: LaTeX source in, PDF path out.
/// Invoked once per document per job; a failure is the executor's to log,
/// not a job failure.
#[async_trait]
pub trait DocumentCompiler: Send + Sync {
    async fn compile(&self, source: &str, basename: &str) -> Result<PathBuf>;
}

/// What the persist-outcome stage hands to the history collaborator.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub analysis: Analysis,
    pub cv_pdf: Option<String>,
    pub cl_pdf: Option<String>,
    pub message: String,
}

/// History/usage collaborator. Best-effort: callers log failures and move on.
#[async_trait]
pub trait OutcomeRecorder: Send + Sync {
    async fn record(&self, account_id: Uuid, outcome: &JobOutcome) -> Result<()>;
}

/// Tunables the executor reads at runtime.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// ATS score substituted when the analysis response carries no JSON.
    pub fallback_ats_score: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            fallback_ats_score: job::DEFAULT_ATS_SCORE,
        }
    }
}

/// The collaborator bundle each worker carries into job execution.
#[derive(Clone)]
pub struct PipelineDeps {
    pub generator: Arc<dyn TextGenerator>,
    pub templates: Arc<dyn TemplateProvider>,
    pub compiler: Arc<dyn DocumentCompiler>,
    pub recorder: Arc<dyn OutcomeRecorder>,
    pub settings: PipelineSettings,
}
