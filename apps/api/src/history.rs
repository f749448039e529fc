//! Application history and usage accounting.
//!
//! Best-effort collaborator: the pipeline records an outcome for registered
//! accounts and bumps their usage counter. A failure here is the caller's
//! to log; it never fails a job.
//!
//! Expected schema:
//! ```sql
//! applications (id uuid primary key, user_id uuid not null,
//!               job_title text, company text, ats_score int,
//!               missing_keywords jsonb, cv_path text, cl_path text,
//!               message_content text,
//!               created_at timestamptz not null default now())
//! users        (id uuid primary key, …, credits_used int not null default 0)
//! ```

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::pipeline::{JobOutcome, OutcomeRecorder};

pub struct PgOutcomeRecorder {
    pool: PgPool,
}

impl PgOutcomeRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutcomeRecorder for PgOutcomeRecorder {
    async fn record(&self, account_id: Uuid, outcome: &JobOutcome) -> Result<()> {
        let missing_keywords = serde_json::to_value(&outcome.analysis.missing_keywords)?;

        sqlx::query(
            r#"
            INSERT INTO applications
                (id, user_id, job_title, company, ats_score, missing_keywords,
                 cv_path, cl_path, message_content)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(&outcome.analysis.job_title)
        .bind(&outcome.analysis.company)
        .bind(outcome.analysis.ats_score as i32)
        .bind(&missing_keywords)
        .bind(outcome.cv_pdf.as_deref())
        .bind(outcome.cl_pdf.as_deref())
        .bind(&outcome.message)
        .execute(&self.pool)
        .await?;

        sqlx::query("UPDATE users SET credits_used = credits_used + 1 WHERE id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
