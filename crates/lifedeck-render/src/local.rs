//! Out-of-process renderer invoked as `program [args..] <input.html> <output>`.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::RenderError;
use crate::backend::{RenderBackend, RenderStrategy, Rendered};
use crate::document::Document;

// Fixed names inside the temp dir; the caller's filename is only logged.
const INPUT_FILE: &str = "document.html";
const OUTPUT_FILE: &str = "document.pdf";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            program: "weasyprint".to_string(),
            args: Vec::new(),
            timeout_secs: 60,
        }
    }
}

pub struct LocalProcessBackend {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl LocalProcessBackend {
    pub fn new(config: LocalConfig) -> Self {
        Self {
            program: config.program,
            args: config.args,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    async fn run(&self, input: &Path, output: &Path) -> Result<(), RenderError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(input)
            .arg(output)
            .kill_on_drop(true)
            .output();
        let out = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| RenderError::TimedOut(self.timeout))??;
        if !out.status.success() {
            return Err(RenderError::ProcessFailed {
                program: self.program.clone(),
                status: out.status.to_string(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RenderBackend for LocalProcessBackend {
    fn strategy(&self) -> RenderStrategy {
        RenderStrategy::LocalProcess
    }

    async fn health_check(&self) -> bool {
        let probe = Command::new(&self.program)
            .arg("--version")
            .kill_on_drop(true)
            .output();
        match tokio::time::timeout(Duration::from_secs(5), probe).await {
            Ok(Ok(out)) if out.status.success() => {
                info!(program = %self.program, "local renderer available");
                true
            }
            Ok(Ok(out)) => {
                warn!(program = %self.program, status = %out.status, "local renderer probe failed");
                false
            }
            Ok(Err(e)) => {
                warn!(program = %self.program, error = %e, "local renderer not runnable");
                false
            }
            Err(_) => {
                warn!(program = %self.program, "local renderer probe timed out");
                false
            }
        }
    }

    async fn render(&self, document: &Document, filename: &str) -> Result<Rendered, RenderError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join(INPUT_FILE);
        let output = dir.path().join(OUTPUT_FILE);
        tokio::fs::write(&input, document.standalone_html()).await?;

        debug!(program = %self.program, filename, input = %input.display(), "rendering with local process");
        self.run(&input, &output).await?;

        let bytes = match tokio::fs::read(&output).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            _ => {
                return Err(RenderError::MissingOutput {
                    program: self.program.clone(),
                    path: output,
                });
            }
        };
        info!(program = %self.program, bytes = bytes.len(), "local render complete");
        Ok(Rendered::Document(bytes))
    }
}
