use serde::Serialize;

use crate::RenderError;
use crate::document::Document;

/// Which kind of backend renders a document. Ordered from most to least
/// faithful; downgrading only ever moves right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStrategy {
    Remote,
    LocalProcess,
    InProcess,
}

impl RenderStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::LocalProcess => "local_process",
            Self::InProcess => "in_process",
        }
    }

    /// The next strategy down. `InProcess` is terminal.
    pub fn downgrade(self) -> Self {
        match self {
            Self::Remote => Self::LocalProcess,
            Self::LocalProcess | Self::InProcess => Self::InProcess,
        }
    }
}

/// What a backend handed back.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// The document itself.
    Document(Vec<u8>),
    /// The document lives at `url`; `cache` is a local copy of its bytes.
    Remote { url: String, cache: Vec<u8> },
}

impl Rendered {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Document(bytes) => bytes,
            Self::Remote { cache, .. } => cache,
        }
    }
}

/// An out-of-process renderer that can be health-checked and can fail.
#[async_trait::async_trait]
pub trait RenderBackend: Send + Sync {
    fn strategy(&self) -> RenderStrategy;

    async fn health_check(&self) -> bool;

    async fn render(&self, document: &Document, filename: &str) -> Result<Rendered, RenderError>;
}
