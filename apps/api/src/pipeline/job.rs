//! Job records and the state machine they move through.
//!
//! A job is created `Queued`, picked up exactly once by a worker
//! (`Processing`), and ends `Completed` or `Failed`. Terminal states are
//! final — the transition methods ignore anything that would move a job
//! backwards, so a buggy caller cannot violate the machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Language the generated documents and message are written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
}

impl Language {
    /// Two-letter code, uppercased in prompts ("Write strictly in EN").
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
        }
    }

    /// Full name, used where a prompt reads better with one.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Fr => "French",
        }
    }
}

/// Immutable inputs a job is created with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInput {
    pub job_description: String,
    pub cv_text: String,
    #[serde(default)]
    pub language: Language,
    /// Owning account, if the submitter is registered. Drives the
    /// persist-outcome stage; anonymous jobs skip it.
    pub account_id: Option<Uuid>,
}

/// ATS score substituted when the analysis response carries no usable JSON.
pub const DEFAULT_ATS_SCORE: u32 = 70;

fn default_job_title() -> String {
    "Job Application".to_string()
}

fn default_company() -> String {
    "Unknown".to_string()
}

fn default_ats_score() -> u32 {
    DEFAULT_ATS_SCORE
}

/// Structured assessment produced by the analyze stage.
///
/// Every field carries a serde default mirroring the fallback assessment,
/// so a partially well-formed model response still parses into something
/// usable instead of failing the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default = "default_job_title")]
    pub job_title: String,
    #[serde(default = "default_company")]
    pub company: String,
    #[serde(default = "default_ats_score")]
    pub ats_score: u32,
    #[serde(default)]
    pub missing_keywords: Vec<String>,
    #[serde(default)]
    pub cv_improvements: String,
}

impl Analysis {
    /// The assessment used when the model returns no JSON at all.
    /// The score is configurable; the keyword list stays empty.
    pub fn fallback(ats_score: u32) -> Self {
        Analysis {
            job_title: default_job_title(),
            company: default_company(),
            ats_score,
            missing_keywords: Vec::new(),
            cv_improvements: String::new(),
        }
    }
}

/// Final output of a completed job.
///
/// Artifact fields hold the PDF filename in the output directory and are
/// `None` when that document failed to compile — a job can complete with
/// partial artifacts, and the log says which one is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub cv_pdf: Option<String>,
    pub cl_pdf: Option<String>,
    pub message: String,
    pub analysis: Analysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// One tracked unit of work, mutated only by the worker that owns it.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub state: JobState,
    /// 0-based position in the stage sequence; non-decreasing.
    pub stage_index: usize,
    /// Append-only progress and error lines, in order of occurrence.
    pub log: Vec<String>,
    /// Present if and only if `state == Completed`.
    pub result: Option<JobResult>,
    pub input: JobInput,
    pub submitted_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: Uuid, input: JobInput) -> Self {
        Job {
            id,
            state: JobState::Queued,
            stage_index: 0,
            log: Vec::new(),
            result: None,
            input,
            submitted_at: Utc::now(),
        }
    }

    pub fn append_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    /// Queued → Processing. Happens exactly once, when a worker dequeues
    /// the job. A no-op from any other state.
    pub fn begin(&mut self) {
        if self.state == JobState::Queued {
            self.state = JobState::Processing;
        }
    }

    /// Processing → Completed. State and result change in the same
    /// mutation, so no reader can observe a completed job without one.
    pub fn complete(&mut self, result: JobResult) {
        if self.state == JobState::Processing {
            self.state = JobState::Completed;
            self.result = Some(result);
        }
    }

    /// Processing → Failed, with the error line appended. A no-op once
    /// terminal.
    pub fn fail(&mut self, error: impl Into<String>) {
        if !self.state.is_terminal() {
            self.log.push(error.into());
            self.state = JobState::Failed;
        }
    }

    /// Advances `stage_index`; never moves it backwards.
    pub fn set_stage(&mut self, index: usize) {
        self.stage_index = self.stage_index.max(index);
    }
}
