//! Document rendering through the external pdflatex toolchain.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::pipeline::DocumentCompiler;

/// Runs `pdflatex` against a generated source and hands back the PDF path.
/// Invoked once per document; what a failure means is the caller's call.
pub struct PdfLatexCompiler {
    binary: PathBuf,
    output_dir: PathBuf,
}

impl PdfLatexCompiler {
    pub fn new(binary: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl DocumentCompiler for PdfLatexCompiler {
    async fn compile(&self, source: &str, basename: &str) -> Result<PathBuf> {
        let tex_path = self.output_dir.join(format!("{basename}.tex"));
        tokio::fs::write(&tex_path, source)
            .await
            .with_context(|| format!("writing {}", tex_path.display()))?;

        let output = Command::new(&self.binary)
            .arg("-interaction=nonstopmode")
            .arg("-output-directory")
            .arg(&self.output_dir)
            .arg(&tex_path)
            .output()
            .await
            .with_context(|| format!("running {}", self.binary.display()))?;

        if !output.status.success() {
            debug!(
                "pdflatex output for {basename}: {}",
                String::from_utf8_lossy(&output.stdout)
            );
            bail!("pdflatex exited with {} for {basename}", output.status);
        }

        // nonstopmode can exit zero and still produce nothing usable.
        let pdf_path = self.output_dir.join(format!("{basename}.pdf"));
        if !pdf_path.exists() {
            bail!(
                "pdflatex reported success but {} was not created",
                pdf_path.display()
            );
        }
        Ok(pdf_path)
    }
}
