//! Document rendering: remote service, local process, or in-process HTML,
//! with downgrade on failure and on-disk artifacts with remote sidecars.

mod error;
pub use error::RenderError;

pub mod artifact;
mod backend;
pub mod document;
mod fallback;
mod local;
mod remote;
mod selector;

pub use artifact::{ArtifactStore, Download, OutputLocator, Sidecar, artifact_base_name};
pub use backend::{RenderBackend, RenderStrategy, Rendered};
pub use document::Document;
pub use fallback::{FALLBACK_MARKER, HtmlFallback, is_html};
pub use local::{LocalConfig, LocalProcessBackend};
pub use remote::{RemoteBackend, RemoteConfig};
pub use selector::{RenderJob, RenderOutcome, Renderer, RendererConfig};
