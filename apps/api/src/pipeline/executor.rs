//! Pipeline executor — runs the ordered stage sequence for one job.
//!
//! Flow: analyze → generate CV → generate cover letter → generate message →
//! compile PDFs → persist outcome. The executor owns the job's record for
//! the duration: after every stage it advances `stage_index` and appends a
//! log line through the store, so pollers watch progress live.
//!
//! Failure policy: an unusable analysis response, a missing template, a
//! per-document compile failure, and a history write failure are all
//! absorbed with a log entry — the job still completes, possibly with
//! partial artifacts. Only an error returned by a stage itself (a
//! generation call that fails outright) moves the job to Failed and stops
//! the sequence.

use anyhow::Result;
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm_client::sanitize::{clean_generated_text, extract_json};
use crate::pipeline::job::{Analysis, JobInput, JobResult};
use crate::pipeline::prompts;
use crate::pipeline::store::JobStore;
use crate::pipeline::{JobOutcome, PipelineDeps, TemplateKind};

/// Marker a cover-letter template can carry to position the letter body.
const BODY_MARKER: &str = "% <BODY_CONTENT>";

/// Working accumulator threaded through one job's stages. Owned by the
/// executing worker; nothing outside the executor reads or writes it.
struct StageContext {
    analysis: Analysis,
    cv_source: String,
    cl_source: String,
    message: String,
}

/// Entry point for workers: runs the whole pipeline for `id` and settles
/// the job into a terminal state. Never panics the worker on job failure.
pub async fn run_job(store: &JobStore, deps: &PipelineDeps, id: Uuid) {
    let Some(job) = store.get(id) else {
        warn!("Job {id} missing from the store; dropping");
        return;
    };
    let input = job.input;

    store.update(id, |job| {
        job.begin();
        job.append_log("Analyzing job description and CV...");
    });
    info!("Job {id}: pipeline started");

    match run_stages(store, deps, id, &input).await {
        Ok(result) => {
            store.update(id, |job| {
                job.complete(result);
                job.append_log("Done!");
            });
            info!("Job {id}: completed");
        }
        Err(e) => {
            warn!("Job {id}: failed: {e:#}");
            store.update(id, |job| job.fail(format!("Error: {e}")));
        }
    }
}

async fn run_stages(
    store: &JobStore,
    deps: &PipelineDeps,
    id: Uuid,
    input: &JobInput,
) -> Result<JobResult> {
    // Stage 1: analyze the JD against the CV.
    let prompt = prompts::ANALYZE_PROMPT_TEMPLATE
        .replace("{job_description}", &input.job_description)
        .replace("{cv_text}", &input.cv_text);
    let raw = deps
        .generator
        .generate(&prompt, prompts::ANALYZE_SYSTEM)
        .await?;

    let analysis = match extract_json::<Analysis>(&raw) {
        Some(analysis) => analysis,
        None => {
            // Unparseable assessment is not worth failing the job over.
            warn!("Job {id}: analysis response was not parseable JSON");
            store.update(id, |job| {
                job.append_log("Analysis response was not structured; using default assessment")
            });
            Analysis::fallback(deps.settings.fallback_ats_score)
        }
    };

    store.update(id, |job| {
        job.set_stage(1);
        job.append_log(format!("ATS score: {}%", analysis.ats_score));
    });

    let mut ctx = StageContext {
        analysis,
        cv_source: String::new(),
        cl_source: String::new(),
        message: String::new(),
    };

    // Stage 2: tailored CV body, spliced into the template.
    store.update(id, |job| job.append_log("Generating tailored CV..."));
    let cv_template = fetch_template(store, deps, id, TemplateKind::Cv).await;
    let prompt = prompts::CV_PROMPT_TEMPLATE
        .replace("{cv_text}", &input.cv_text)
        .replace("{job_description}", &input.job_description)
        .replace("{cv_template}", &cv_template)
        .replace("{language}", &input.language.code().to_uppercase());
    let body = clean_generated_text(&deps.generator.generate(&prompt, prompts::CV_SYSTEM).await?);
    ctx.cv_source = assemble_document(&cv_template, &body);
    store.update(id, |job| job.set_stage(2));

    // Stage 3: cover letter body, injected into its template.
    store.update(id, |job| job.append_log("Generating cover letter..."));
    let cl_template = fetch_template(store, deps, id, TemplateKind::CoverLetter).await;
    let prompt = prompts::COVER_LETTER_PROMPT_TEMPLATE
        .replace("{job_description}", &input.job_description)
        .replace("{cv_text}", &input.cv_text)
        .replace("{cl_template}", &cl_template)
        .replace("{language}", &input.language.code().to_uppercase());
    let body = clean_generated_text(
        &deps
            .generator
            .generate(&prompt, prompts::COVER_LETTER_SYSTEM)
            .await?,
    );
    ctx.cl_source = inject_letter_body(&cl_template, &body);
    store.update(id, |job| job.set_stage(3));

    // Stage 4: outreach message.
    store.update(id, |job| job.append_log("Generating outreach message..."));
    let prompt = prompts::MESSAGE_PROMPT_TEMPLATE
        .replace("{cv_text}", &input.cv_text)
        .replace("{job_description}", &input.job_description)
        .replace("{language_name}", input.language.display_name());
    ctx.message = clean_generated_text(
        &deps
            .generator
            .generate(&prompt, prompts::MESSAGE_SYSTEM)
            .await?,
    );
    store.update(id, |job| job.set_stage(4));

    // Stage 5: compile both documents. Either may fail on its own; the job
    // completes with whatever compiled, and the log names the casualty.
    store.update(id, |job| job.append_log("Compiling PDF documents..."));
    let cv_pdf = compile_document(store, deps, id, &ctx.cv_source, &format!("CV_{id}"), "CV").await;
    let cl_pdf = compile_document(
        store,
        deps,
        id,
        &ctx.cl_source,
        &format!("CL_{id}"),
        "Cover letter",
    )
    .await;
    store.update(id, |job| job.set_stage(5));

    // Stage 6: record the outcome for registered accounts. Best-effort.
    if let Some(account_id) = input.account_id {
        let outcome = JobOutcome {
            analysis: ctx.analysis.clone(),
            cv_pdf: cv_pdf.clone(),
            cl_pdf: cl_pdf.clone(),
            message: ctx.message.clone(),
        };
        if let Err(e) = deps.recorder.record(account_id, &outcome).await {
            warn!("Job {id}: history write failed: {e:#}");
            store.update(id, |job| job.append_log(format!("History write failed: {e}")));
        }
    }
    store.update(id, |job| job.set_stage(6));

    Ok(JobResult {
        cv_pdf,
        cl_pdf,
        message: ctx.message,
        analysis: ctx.analysis,
    })
}

/// Fetches a template, degrading to an error-marked placeholder when the
/// provider fails. The job carries on; the log says what happened.
async fn fetch_template(
    store: &JobStore,
    deps: &PipelineDeps,
    id: Uuid,
    kind: TemplateKind,
) -> String {
    let label = match kind {
        TemplateKind::Cv => "CV",
        TemplateKind::CoverLetter => "Cover letter",
    };
    match deps.templates.get(kind).await {
        Ok(template) => template,
        Err(e) => {
            warn!("Job {id}: {label} template unavailable: {e:#}");
            store.update(id, |job| {
                job.append_log(format!("{label} template unavailable; using a placeholder"))
            });
            format!("Error: {label} template not found.")
        }
    }
}

/// Compiles one document, returning the artifact filename. A failure is
/// logged per document and yields `None` — never a job failure.
async fn compile_document(
    store: &JobStore,
    deps: &PipelineDeps,
    id: Uuid,
    source: &str,
    basename: &str,
    label: &str,
) -> Option<String> {
    match deps.compiler.compile(source, basename).await {
        Ok(path) => Some(
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("{basename}.pdf")),
        ),
        Err(e) => {
            warn!("Job {id}: {label} compilation failed: {e:#}");
            store.update(id, |job| {
                job.append_log(format!("{label} compilation error: {e}"))
            });
            None
        }
    }
}

/// Splices a generated body into the template's document environment,
/// keeping the template's preamble. A template without one (including the
/// degraded placeholder) passes the body through alone.
fn assemble_document(template: &str, body: &str) -> String {
    match template.split_once("\\begin{document}") {
        Some((preamble, _)) => {
            format!("{preamble}\\begin{{document}}\n{body}\n\\end{{document}}")
        }
        None => body.to_string(),
    }
}

/// Places a letter body inside its template: an explicit body marker wins;
/// otherwise the body lands after `\begin{document}`, re-emitting
/// `\makeextraheader` for templates that use it; otherwise the body stands
/// alone.
fn inject_letter_body(template: &str, body: &str) -> String {
    if template.contains(BODY_MARKER) {
        return template.replace(BODY_MARKER, body);
    }
    match template.split_once("\\begin{document}") {
        Some((preamble, _)) => {
            let mut out = format!("{preamble}\\begin{{document}}\n");
            if template.contains("\\makeextraheader") {
                out.push_str("\\makeextraheader\n");
            }
            out.push('\n');
            out.push_str(body);
            out.push_str("\n\\end{document}");
            out
        }
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::pipeline::job::{JobState, Language};
    use crate::pipeline::testkit::{
        deps_with, submit_input, StubCompiler, StubGenerator, StubRecorder, StubTemplates,
    };
    use crate::pipeline::PipelineSettings;

    fn queued_job(store: &JobStore, account_id: Option<Uuid>) -> Uuid {
        store.create(JobInput {
            account_id,
            ..submit_input()
        })
    }

    #[tokio::test]
    async fn test_happy_path_completes_with_full_result() {
        let store = JobStore::new();
        let deps = deps_with(Default::default(), Default::default(), Default::default());
        let id = queued_job(&store, None);

        run_job(&store, &deps, id).await;

        let job = store.get(id).unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.stage_index, 6);
        let result = job.result.unwrap();
        assert_eq!(result.analysis.job_title, "Backend Engineer");
        assert_eq!(result.cv_pdf.as_deref(), Some(&*format!("CV_{id}.pdf")));
        assert_eq!(result.cl_pdf.as_deref(), Some(&*format!("CL_{id}.pdf")));
        assert!(!result.message.is_empty());
        assert_eq!(job.log.last().unwrap(), "Done!");
    }

    #[tokio::test]
    async fn test_prose_analysis_falls_back_and_still_completes() {
        let store = JobStore::new();
        let generator = StubGenerator {
            analysis_response: "I took a look and honestly this CV seems fine.".to_string(),
            ..Default::default()
        };
        let mut deps = deps_with(generator, Default::default(), Default::default());
        deps.settings = PipelineSettings {
            fallback_ats_score: 70,
        };
        let id = queued_job(&store, None);

        run_job(&store, &deps, id).await;

        let job = store.get(id).unwrap();
        assert_eq!(job.state, JobState::Completed);
        let result = job.result.unwrap();
        assert_eq!(result.analysis.ats_score, 70);
        assert_eq!(result.analysis.job_title, "Job Application");
        assert!(result.analysis.missing_keywords.is_empty());
        assert!(job
            .log
            .iter()
            .any(|line| line.contains("using default assessment")));
    }

    #[tokio::test]
    async fn test_fallback_score_is_configurable() {
        let store = JobStore::new();
        let generator = StubGenerator {
            analysis_response: "no json here".to_string(),
            ..Default::default()
        };
        let mut deps = deps_with(generator, Default::default(), Default::default());
        deps.settings = PipelineSettings {
            fallback_ats_score: 55,
        };
        let id = queued_job(&store, None);

        run_job(&store, &deps, id).await;

        let job = store.get(id).unwrap();
        assert_eq!(job.result.unwrap().analysis.ats_score, 55);
    }

    #[tokio::test]
    async fn test_partial_analysis_json_keeps_parsed_fields() {
        let store = JobStore::new();
        let generator = StubGenerator {
            analysis_response: r#"Sure! {"ats_score": 91, "company": "Acme"} — good luck!"#
                .to_string(),
            ..Default::default()
        };
        let deps = deps_with(generator, Default::default(), Default::default());
        let id = queued_job(&store, None);

        run_job(&store, &deps, id).await;

        let result = store.get(id).unwrap().result.unwrap();
        assert_eq!(result.analysis.ats_score, 91);
        assert_eq!(result.analysis.company, "Acme");
        assert_eq!(result.analysis.job_title, "Job Application");
    }

    #[tokio::test]
    async fn test_cover_letter_compile_failure_is_partial_success() {
        let store = JobStore::new();
        let compiler = StubCompiler {
            fail_cover_letter: true,
            ..Default::default()
        };
        let deps = deps_with(Default::default(), compiler, Default::default());
        let id = queued_job(&store, None);

        run_job(&store, &deps, id).await;

        let job = store.get(id).unwrap();
        assert_eq!(job.state, JobState::Completed);
        let result = job.result.unwrap();
        assert!(result.cv_pdf.is_some());
        assert!(result.cl_pdf.is_none());
        assert!(job
            .log
            .iter()
            .any(|line| line.contains("Cover letter compilation error")));
    }

    #[tokio::test]
    async fn test_both_compiles_failing_still_completes() {
        let store = JobStore::new();
        let compiler = StubCompiler {
            fail_cv: true,
            fail_cover_letter: true,
        };
        let deps = deps_with(Default::default(), compiler, Default::default());
        let id = queued_job(&store, None);

        run_job(&store, &deps, id).await;

        let job = store.get(id).unwrap();
        assert_eq!(job.state, JobState::Completed);
        let result = job.result.unwrap();
        assert!(result.cv_pdf.is_none());
        assert!(result.cl_pdf.is_none());
        assert!(job.log.iter().any(|l| l.contains("CV compilation error")));
    }

    #[tokio::test]
    async fn test_generation_error_fails_the_job() {
        let store = JobStore::new();
        let generator = StubGenerator {
            fail_on_system: Some(prompts::CV_SYSTEM),
            ..Default::default()
        };
        let deps = deps_with(generator, Default::default(), Default::default());
        let id = queued_job(&store, None);

        run_job(&store, &deps, id).await;

        let job = store.get(id).unwrap();
        assert_eq!(job.state, JobState::Failed);
        assert!(job.result.is_none());
        assert!(job.log.last().unwrap().starts_with("Error: "));
        // The failure happened in stage 2, so the index never reached 2.
        assert!(job.stage_index < 2);
    }

    #[tokio::test]
    async fn test_missing_templates_degrade_without_failing() {
        let store = JobStore::new();
        let templates = StubTemplates { missing: true };
        let deps = deps_with(Default::default(), Default::default(), templates);
        let id = queued_job(&store, None);

        run_job(&store, &deps, id).await;

        let job = store.get(id).unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert!(job
            .log
            .iter()
            .any(|line| line.contains("CV template unavailable")));
        assert!(job
            .log
            .iter()
            .any(|line| line.contains("Cover letter template unavailable")));
    }

    #[tokio::test]
    async fn test_recorder_called_for_registered_accounts_only() {
        let store = JobStore::new();
        let recorder = Arc::new(StubRecorder::default());
        let mut deps = deps_with(Default::default(), Default::default(), Default::default());
        deps.recorder = recorder.clone();

        let anonymous = queued_job(&store, None);
        run_job(&store, &deps, anonymous).await;
        assert_eq!(recorder.calls(), 0);

        let owned = queued_job(&store, Some(Uuid::new_v4()));
        run_job(&store, &deps, owned).await;
        assert_eq!(recorder.calls(), 1);
    }

    #[tokio::test]
    async fn test_history_failure_does_not_downgrade_the_job() {
        let store = JobStore::new();
        let recorder = Arc::new(StubRecorder {
            fail: true,
            ..Default::default()
        });
        let mut deps = deps_with(Default::default(), Default::default(), Default::default());
        deps.recorder = recorder;
        let id = queued_job(&store, Some(Uuid::new_v4()));

        run_job(&store, &deps, id).await;

        let job = store.get(id).unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert!(job.result.is_some());
        assert!(job
            .log
            .iter()
            .any(|line| line.contains("History write failed")));
    }

    #[tokio::test]
    async fn test_log_grows_monotonically_across_polls() {
        let store = JobStore::new();
        let deps = deps_with(Default::default(), Default::default(), Default::default());
        let id = queued_job(&store, None);

        let before = store.get(id).unwrap().log.len();
        run_job(&store, &deps, id).await;
        let after = store.get(id).unwrap().log.len();
        assert!(after >= before);
        // Polling twice in a row never shrinks the log.
        assert_eq!(store.get(id).unwrap().log.len(), after);
    }

    #[tokio::test]
    async fn test_french_jobs_ask_for_french_output() {
        let store = JobStore::new();
        let generator = StubGenerator::recording();
        let prompts_seen = generator.seen_prompts();
        let deps = deps_with(generator, Default::default(), Default::default());
        let id = store.create(JobInput {
            language: Language::Fr,
            ..submit_input()
        });

        run_job(&store, &deps, id).await;

        let seen = prompts_seen.lock().unwrap();
        assert!(seen.iter().any(|p| p.contains("strictly in FR")));
        assert!(seen.iter().any(|p| p.contains("strictly in French")));
    }

    #[test]
    fn test_assemble_document_keeps_preamble() {
        let template = "\\documentclass{article}\n\\usepackage{x}\n\\begin{document}\nOLD\n\\end{document}";
        let out = assemble_document(template, "NEW BODY");
        assert!(out.starts_with("\\documentclass{article}"));
        assert!(out.contains("\\usepackage{x}"));
        assert!(out.contains("NEW BODY"));
        assert!(!out.contains("OLD"));
        assert!(out.ends_with("\\end{document}"));
    }

    #[test]
    fn test_assemble_document_without_environment_is_body_only() {
        assert_eq!(assemble_document("Error: CV template not found.", "BODY"), "BODY");
    }

    #[test]
    fn test_inject_letter_body_prefers_marker() {
        let template = "\\documentclass{letter}\n\\begin{document}\n% <BODY_CONTENT>\n\\end{document}";
        let out = inject_letter_body(template, "Dear Hiring Team,");
        assert!(out.contains("Dear Hiring Team,"));
        assert!(!out.contains(BODY_MARKER));
        // Marker injection keeps the template's own document environment.
        assert_eq!(out.matches("\\end{document}").count(), 1);
    }

    #[test]
    fn test_inject_letter_body_heuristic_keeps_extra_header() {
        let template =
            "\\documentclass{letter}\n\\newcommand{\\makeextraheader}{}\n\\begin{document}\n\\makeextraheader\nOLD\n\\end{document}";
        let out = inject_letter_body(template, "BODY");
        assert!(out.contains("\\makeextraheader\n"));
        assert!(out.contains("BODY"));
        assert!(!out.contains("OLD"));
    }

    #[test]
    fn test_inject_letter_body_bare_template_is_body_only() {
        assert_eq!(inject_letter_body("no environment here", "BODY"), "BODY");
    }
}
