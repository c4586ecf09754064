//! Artifact naming, storage, and download resolution.
//!
//! Artifacts are named `{subjectNames}_{reportTypeLabel}_{timestamp}` and
//! stored as `{base}.pdf`. When the bytes live with a remote service a
//! `{base}.json` sidecar records where.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::RenderError;
use crate::backend::Rendered;
use crate::fallback::is_html;

pub const DOCUMENT_EXTENSION: &str = "pdf";
pub const SIDECAR_EXTENSION: &str = "json";

const PDF_CONTENT_TYPE: &str = "application/pdf";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// `{names}_{label}_{timestamp}`, with whitespace in each name collapsed to `_`.
pub fn artifact_base_name(subject_names: &[&str], label: &str, timestamp_ms: i64) -> String {
    let names: Vec<String> = subject_names
        .iter()
        .map(|n| n.split_whitespace().collect::<Vec<_>>().join("_"))
        .filter(|n| !n.is_empty())
        .collect();
    format!("{}_{label}_{timestamp_ms}", names.join("_"))
}

/// Split a trailing `_{digits}` timestamp off a base name.
fn split_timestamp(base: &str) -> (&str, Option<i64>) {
    match base.rsplit_once('_') {
        Some((prefix, ts)) if !ts.is_empty() && ts.chars().all(|c| c.is_ascii_digit()) => {
            (prefix, ts.parse().ok())
        }
        _ => (base, None),
    }
}

/// Base name without its timestamp segment.
pub fn strip_timestamp(base: &str) -> &str {
    split_timestamp(base).0
}

/// Written next to a document whose canonical copy is remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sidecar {
    pub external_url: String,
    pub backend: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "location", rename_all = "lowercase")]
pub enum OutputLocator {
    Local(PathBuf),
    Remote(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredArtifact {
    pub path: PathBuf,
    pub locator: OutputLocator,
    pub sidecar: Option<Sidecar>,
}

/// How a download request should be answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Download {
    Redirect(String),
    File {
        path: PathBuf,
        content_type: &'static str,
    },
}

/// Append `download=true` to a URL's query string.
pub fn with_download_flag(url: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}download=true")
}

/// Reject names that are empty or could step outside the artifact directory.
pub fn validate_name(name: &str) -> Result<(), RenderError> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(RenderError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Directory of rendered artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, base: &str) -> PathBuf {
        self.dir.join(format!("{base}.{DOCUMENT_EXTENSION}"))
    }

    fn sidecar_path(&self, base: &str) -> PathBuf {
        self.dir.join(format!("{base}.{SIDECAR_EXTENSION}"))
    }

    /// Write `{base}.pdf`, plus a sidecar when the result is remote.
    pub async fn store(&self, base: &str, rendered: &Rendered) -> Result<StoredArtifact, RenderError> {
        validate_name(base)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.document_path(base);
        tokio::fs::write(&path, rendered.bytes()).await?;

        let stored = match rendered {
            Rendered::Document(_) => StoredArtifact {
                locator: OutputLocator::Local(path.clone()),
                path,
                sidecar: None,
            },
            Rendered::Remote { url, .. } => {
                let sidecar = Sidecar {
                    external_url: url.clone(),
                    backend: "remote".to_string(),
                };
                tokio::fs::write(self.sidecar_path(base), serde_json::to_vec_pretty(&sidecar)?).await?;
                StoredArtifact {
                    locator: OutputLocator::Remote(url.clone()),
                    path,
                    sidecar: Some(sidecar),
                }
            }
        };
        info!(path = %stored.path.display(), remote = stored.sidecar.is_some(), "stored artifact");
        Ok(stored)
    }

    /// Resolve a requested filename to a redirect or a local file.
    ///
    /// Falls back to the newest artifact sharing the name minus its
    /// timestamp when the exact file is gone.
    pub async fn resolve_download(&self, requested: &str) -> Result<Download, RenderError> {
        validate_name(requested)?;
        let base = requested
            .strip_suffix(&format!(".{DOCUMENT_EXTENSION}"))
            .unwrap_or(requested);

        if let Some(download) = self.resolve_exact(base).await? {
            return Ok(download);
        }

        let prefix = strip_timestamp(base);
        if let Some(nearest) = self.newest_matching(prefix).await?
            && let Some(download) = self.resolve_exact(&nearest).await?
        {
            info!(requested, resolved = %nearest, "served nearest artifact");
            return Ok(download);
        }
        Err(RenderError::NotFound(requested.to_string()))
    }

    async fn resolve_exact(&self, base: &str) -> Result<Option<Download>, RenderError> {
        let sidecar_path = self.sidecar_path(base);
        if tokio::fs::metadata(&sidecar_path).await.is_ok() {
            let sidecar: Sidecar = serde_json::from_slice(&tokio::fs::read(&sidecar_path).await?)?;
            debug!(base, url = %sidecar.external_url, "redirecting to remote artifact");
            return Ok(Some(Download::Redirect(with_download_flag(&sidecar.external_url))));
        }

        let path = self.document_path(base);
        let mut file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut head = [0u8; 512];
        let n = file.read(&mut head).await?;
        let content_type = if is_html(&head[..n]) {
            HTML_CONTENT_TYPE
        } else {
            PDF_CONTENT_TYPE
        };
        Ok(Some(Download::File { path, content_type }))
    }

    async fn newest_matching(&self, prefix: &str) -> Result<Option<String>, RenderError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut best: Option<(i64, String)> = None;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(stem) = name.strip_suffix(&format!(".{DOCUMENT_EXTENSION}")) else {
                continue;
            };
            let (stem_prefix, ts) = split_timestamp(stem);
            if stem_prefix != prefix {
                continue;
            }
            let ts = ts.unwrap_or(i64::MIN);
            if best.as_ref().is_none_or(|(best_ts, _)| ts > *best_ts) {
                best = Some((ts, stem.to_string()));
            }
        }
        Ok(best.map(|(_, stem)| stem))
    }
}
