use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails fast at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Number of pipeline workers; bounds concurrent jobs.
    pub worker_count: usize,
    pub output_dir: String,
    pub templates_dir: String,
    pub pdflatex_bin: String,
    /// ATS score used when an analysis response carries no usable JSON.
    pub fallback_ats_score: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            worker_count: std::env::var("WORKER_COUNT")
                .unwrap_or_else(|_| "5".to_string())
                .parse::<usize>()
                .context("WORKER_COUNT must be a positive integer")?,
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "outputs".to_string()),
            templates_dir: std::env::var("TEMPLATES_DIR")
                .unwrap_or_else(|_| "templates".to_string()),
            pdflatex_bin: std::env::var("PDFLATEX_BIN")
                .unwrap_or_else(|_| "pdflatex".to_string()),
            fallback_ats_score: std::env::var("FALLBACK_ATS_SCORE")
                .unwrap_or_else(|_| "70".to_string())
                .parse::<u32>()
                .context("FALLBACK_ATS_SCORE must be an integer")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
