use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("render service returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("render service returned an empty document")]
    EmptyDocument,

    #[error("renderer {program} exited with {status}: {stderr}")]
    ProcessFailed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("renderer {program} produced no output at {path}")]
    MissingOutput { program: String, path: PathBuf },

    #[error("renderer timed out after {0:?}")]
    TimedOut(Duration),

    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("invalid artifact name: {0:?}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
