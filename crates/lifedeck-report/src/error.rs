use std::time::Duration;

use lifedeck_ai::GenerationError;
use lifedeck_core::CoreError;
use lifedeck_render::RenderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid report request: {0}")]
    Specification(String),

    #[error("card resolution failed: {0}")]
    Cards(#[from] CoreError),

    #[error("section {ordinal} ({section}) failed: {source}")]
    Generation {
        ordinal: usize,
        section: String,
        source: GenerationError,
    },

    #[error("storing rendered report failed: {0}")]
    Render(#[from] RenderError),

    #[error("report generation took longer than {0:?}")]
    TimedOut(Duration),
}

impl ReportError {
    /// Pipeline stage that failed, for user-facing error responses.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Specification(_) => "specification",
            Self::Cards(_) => "cards",
            Self::Generation { .. } => "generation",
            Self::Render(_) => "rendering",
            Self::TimedOut(_) => "timeout",
        }
    }
}
