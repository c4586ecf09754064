//! Backend selection with one-step downgrade on failure.
//!
//! The selected [`RenderStrategy`] is a plain value: [`Renderer::probe`]
//! picks one at startup, each render returns the strategy it ended up on,
//! and the caller decides whether to keep the downgraded value.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::RenderError;
use crate::artifact::{ArtifactStore, OutputLocator, Sidecar};
use crate::backend::{RenderBackend, RenderStrategy, Rendered};
use crate::document::Document;
use crate::fallback::HtmlFallback;
use crate::local::{LocalConfig, LocalProcessBackend};
use crate::remote::{RemoteBackend, RemoteConfig};

/// Where artifacts go and which out-of-process backends exist.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub output_dir: PathBuf,
    pub remote: Option<RemoteConfig>,
    pub local: Option<LocalConfig>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            remote: None,
            local: None,
        }
    }
}

/// Result of rendering one document.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    pub rendered: Rendered,
    /// Strategy that produced `rendered`; the one to use next time.
    pub strategy: RenderStrategy,
    /// Backend failures that forced a downgrade, in order.
    pub failures: Vec<(RenderStrategy, String)>,
}

/// A rendered, stored document.
#[derive(Debug, Clone, Serialize)]
pub struct RenderJob {
    pub filename: String,
    pub backend: RenderStrategy,
    pub locator: OutputLocator,
    pub sidecar: Option<Sidecar>,
    #[serde(skip)]
    pub document: Document,
}

pub struct Renderer {
    remote: Option<Arc<dyn RenderBackend>>,
    local: Option<Arc<dyn RenderBackend>>,
    fallback: HtmlFallback,
    store: ArtifactStore,
}

impl Renderer {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            remote: None,
            local: None,
            fallback: HtmlFallback,
            store,
        }
    }

    pub fn from_config(config: RendererConfig) -> Self {
        let mut renderer = Self::new(ArtifactStore::new(config.output_dir));
        if let Some(remote) = config.remote.filter(|r| !r.base_url.is_empty()) {
            renderer = renderer.with_backend(Arc::new(RemoteBackend::new(remote)));
        }
        if let Some(local) = config.local.filter(|l| !l.program.is_empty()) {
            renderer = renderer.with_backend(Arc::new(LocalProcessBackend::new(local)));
        }
        renderer
    }

    /// Install `backend` in the slot its strategy names.
    pub fn with_backend(mut self, backend: Arc<dyn RenderBackend>) -> Self {
        match backend.strategy() {
            RenderStrategy::Remote => self.remote = Some(backend),
            RenderStrategy::LocalProcess => self.local = Some(backend),
            RenderStrategy::InProcess => {}
        }
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    fn backend(&self, strategy: RenderStrategy) -> Option<&Arc<dyn RenderBackend>> {
        match strategy {
            RenderStrategy::Remote => self.remote.as_ref(),
            RenderStrategy::LocalProcess => self.local.as_ref(),
            RenderStrategy::InProcess => None,
        }
    }

    /// Health-check remote, then local. Anything else selects in-process.
    pub async fn probe(&self) -> RenderStrategy {
        for strategy in [RenderStrategy::Remote, RenderStrategy::LocalProcess] {
            if let Some(backend) = self.backend(strategy)
                && backend.health_check().await
            {
                info!(strategy = strategy.as_str(), "render backend selected");
                return strategy;
            }
        }
        warn!("no render backend healthy, using in-process HTML fallback");
        RenderStrategy::InProcess
    }

    /// Render with `strategy`, stepping down one backend per failure.
    ///
    /// Never fails: the in-process fallback always produces output.
    pub async fn render_document(
        &self,
        strategy: RenderStrategy,
        document: &Document,
        filename: &str,
    ) -> RenderOutcome {
        let mut current = strategy;
        let mut failures = Vec::new();
        loop {
            let Some(backend) = self.backend(current) else {
                if current == RenderStrategy::InProcess {
                    return RenderOutcome {
                        rendered: Rendered::Document(self.fallback.render(document)),
                        strategy: current,
                        failures,
                    };
                }
                current = current.downgrade();
                continue;
            };
            match backend.render(document, filename).await {
                Ok(rendered) => {
                    return RenderOutcome {
                        rendered,
                        strategy: current,
                        failures,
                    };
                }
                Err(e) => {
                    let next = current.downgrade();
                    warn!(
                        from = current.as_str(),
                        to = next.as_str(),
                        error = %e,
                        "render backend failed, downgrading"
                    );
                    failures.push((current, e.to_string()));
                    current = next;
                }
            }
        }
    }

    /// Render and store `document` as `{base_name}.pdf`.
    ///
    /// Only storage errors surface; backend failures are absorbed by downgrade.
    pub async fn render(
        &self,
        strategy: RenderStrategy,
        document: Document,
        base_name: &str,
    ) -> Result<(RenderJob, RenderStrategy), RenderError> {
        let filename = format!("{base_name}.pdf");
        let outcome = self.render_document(strategy, &document, &filename).await;
        let stored = self.store.store(base_name, &outcome.rendered).await?;
        let job = RenderJob {
            filename,
            backend: outcome.strategy,
            locator: stored.locator,
            sidecar: stored.sidecar,
            document,
        };
        Ok((job, outcome.strategy))
    }
}
