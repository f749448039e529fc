//! Scripted collaborator doubles for pipeline and scheduler tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::pipeline::job::{JobInput, Language};
use crate::pipeline::prompts;
use crate::pipeline::store::JobStore;
use crate::pipeline::{
    DocumentCompiler, JobOutcome, OutcomeRecorder, PipelineDeps, PipelineSettings, TemplateKind,
    TemplateProvider, TextGenerator,
};

/// A well-formed analysis response.
pub fn happy_analysis() -> String {
    r#"{"job_title": "Backend Engineer", "company": "Acme", "ats_score": 82,
        "missing_keywords": ["Kubernetes"], "cv_improvements": "Lead with the platform work."}"#
        .to_string()
}

/// Standard submission used across tests.
pub fn submit_input() -> JobInput {
    JobInput {
        job_description: "Backend Engineer at Acme".to_string(),
        cv_text: "Ten years of backend work in Rust and Postgres.".to_string(),
        language: Language::En,
        account_id: None,
    }
}

/// Tracks how many callers are inside a section right now and the highest
/// that count ever got.
#[derive(Default)]
pub struct ConcurrencyGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyGauge {
    pub fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    pub fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Stage-aware generator double. Answers the analyze stage with
/// `analysis_response` and every other stage with a canned body; can fail
/// one stage, stall to simulate a slow backend, record prompts, and report
/// call concurrency.
pub struct StubGenerator {
    pub analysis_response: String,
    pub fail_on_system: Option<&'static str>,
    pub delay: Option<Duration>,
    pub gauge: Option<Arc<ConcurrencyGauge>>,
    pub seen: Option<Arc<Mutex<Vec<String>>>>,
}

impl Default for StubGenerator {
    fn default() -> Self {
        StubGenerator {
            analysis_response: happy_analysis(),
            fail_on_system: None,
            delay: None,
            gauge: None,
            seen: None,
        }
    }
}

impl StubGenerator {
    /// A generator that remembers every prompt it was sent.
    pub fn recording() -> Self {
        StubGenerator {
            seen: Some(Arc::new(Mutex::new(Vec::new()))),
            ..Default::default()
        }
    }

    pub fn seen_prompts(&self) -> Arc<Mutex<Vec<String>>> {
        self.seen.clone().expect("not a recording generator")
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str, system: &str) -> Result<String> {
        if let Some(gauge) = &self.gauge {
            gauge.enter();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(seen) = &self.seen {
            seen.lock().unwrap().push(prompt.to_string());
        }

        let result = if self.fail_on_system == Some(system) {
            Err(anyhow::anyhow!("generation backend unavailable"))
        } else if system == prompts::ANALYZE_SYSTEM {
            Ok(self.analysis_response.clone())
        } else if system == prompts::MESSAGE_SYSTEM {
            Ok("Subject: Backend Engineer application\n\nHello Hiring Team, I build backends."
                .to_string())
        } else {
            Ok("\\section{Profile}\nTailored body for tests.".to_string())
        };

        if let Some(gauge) = &self.gauge {
            gauge.exit();
        }
        result
    }
}

pub const TEST_CV_TEMPLATE: &str =
    "\\documentclass{article}\n\\begin{document}\nSEED\n\\end{document}\n";
pub const TEST_CL_TEMPLATE: &str =
    "\\documentclass{letter}\n\\begin{document}\n% <BODY_CONTENT>\n\\end{document}\n";

/// Template double. `missing: true` behaves like an empty template directory.
#[derive(Default)]
pub struct StubTemplates {
    pub missing: bool,
}

#[async_trait]
impl TemplateProvider for StubTemplates {
    async fn get(&self, kind: TemplateKind) -> Result<String> {
        if self.missing {
            bail!("template file not found");
        }
        Ok(match kind {
            TemplateKind::Cv => TEST_CV_TEMPLATE.to_string(),
            TemplateKind::CoverLetter => TEST_CL_TEMPLATE.to_string(),
        })
    }
}

/// Compiler double that "produces" PDFs without running anything.
#[derive(Default)]
pub struct StubCompiler {
    pub fail_cv: bool,
    pub fail_cover_letter: bool,
}

#[async_trait]
impl DocumentCompiler for StubCompiler {
    async fn compile(&self, _source: &str, basename: &str) -> Result<PathBuf> {
        let failing = (self.fail_cv && basename.starts_with("CV_"))
            || (self.fail_cover_letter && basename.starts_with("CL_"));
        if failing {
            bail!("pdflatex exited with exit status: 1 for {basename}");
        }
        Ok(PathBuf::from("outputs").join(format!("{basename}.pdf")))
    }
}

/// Recorder double counting how often the pipeline reported an outcome.
#[derive(Default)]
pub struct StubRecorder {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubRecorder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutcomeRecorder for StubRecorder {
    async fn record(&self, _account_id: Uuid, _outcome: &JobOutcome) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("database unavailable");
        }
        Ok(())
    }
}

/// Bundles stub collaborators into pipeline deps. The recorder defaults to
/// a counting stub; swap fields after the call for special cases.
pub fn deps_with(
    generator: StubGenerator,
    compiler: StubCompiler,
    templates: StubTemplates,
) -> PipelineDeps {
    PipelineDeps {
        generator: Arc::new(generator),
        templates: Arc::new(templates),
        compiler: Arc::new(compiler),
        recorder: Arc::new(StubRecorder::default()),
        settings: PipelineSettings::default(),
    }
}

/// Polls the store until every listed job is terminal; panics past `timeout`.
pub async fn wait_until_terminal(store: &JobStore, ids: &[Uuid], timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let settled = ids.iter().all(|id| {
            store
                .get(*id)
                .map(|job| job.state.is_terminal())
                .unwrap_or(false)
        });
        if settled {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("jobs did not settle within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
