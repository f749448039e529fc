//! LaTeX template source for generated documents.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::pipeline::{TemplateKind, TemplateProvider};

pub const CV_TEMPLATE_FILE: &str = "cv.tex";
pub const COVER_LETTER_TEMPLATE_FILE: &str = "cover_letter.tex";

/// Reads document templates from a directory on disk. The repository ships
/// starter templates under `templates/`; deployments point this at their
/// own.
pub struct FileTemplateProvider {
    dir: PathBuf,
}

impl FileTemplateProvider {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl TemplateProvider for FileTemplateProvider {
    async fn get(&self, kind: TemplateKind) -> Result<String> {
        let file = match kind {
            TemplateKind::Cv => CV_TEMPLATE_FILE,
            TemplateKind::CoverLetter => COVER_LETTER_TEMPLATE_FILE,
        };
        let path = self.dir.join(file);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading template {}", path.display()))
    }
}
