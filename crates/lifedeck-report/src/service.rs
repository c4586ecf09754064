//! End to end: cards, sections, document, render, store, under one deadline.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lifedeck_ai::{GenerationBackend, GenerationSettings};
use lifedeck_core::ReferenceDataSource;
use lifedeck_render::{Document, RenderJob, RenderStrategy, Renderer, artifact_base_name};
use serde::Deserialize;
use tracing::{info, warn};

use crate::ReportError;
use crate::pipeline::{Report, ReportAssemblyPipeline};
use crate::reading::ReportData;
use crate::spec::ReportSpecification;

pub const DEFAULT_TIMEOUT_SECS: u64 = 110;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub report: Report,
    pub render_job: RenderJob,
    /// Strategy after any downgrade; pass it to the next request.
    pub strategy: RenderStrategy,
}

pub struct ReportService {
    data: Arc<dyn ReferenceDataSource>,
    generator: Arc<dyn GenerationBackend>,
    settings: GenerationSettings,
    renderer: Renderer,
    timeout: Duration,
}

impl ReportService {
    pub fn new(
        data: Arc<dyn ReferenceDataSource>,
        generator: Arc<dyn GenerationBackend>,
        settings: GenerationSettings,
        renderer: Renderer,
        config: ServiceConfig,
    ) -> Self {
        Self {
            data,
            generator,
            settings,
            renderer,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Generate, render, and store a report.
    ///
    /// The whole run races the configured deadline. On timeout the run is
    /// dropped, which cancels whatever generation or render call was in flight.
    pub async fn generate(
        &self,
        spec: ReportSpecification,
        strategy: RenderStrategy,
    ) -> Result<GeneratedReport, ReportError> {
        match tokio::time::timeout(self.timeout, self.run(spec, strategy)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.timeout, "report generation timed out");
                Err(ReportError::TimedOut(self.timeout))
            }
        }
    }

    async fn run(
        &self,
        spec: ReportSpecification,
        strategy: RenderStrategy,
    ) -> Result<GeneratedReport, ReportError> {
        let base_name = artifact_base_name(
            &spec.subject_names(),
            &spec.artifact_label(),
            Utc::now().timestamp_millis(),
        );
        let data = ReportData::build(spec, self.data.as_ref())?;

        let mut pipeline = ReportAssemblyPipeline::new(self.generator.as_ref(), &self.settings);
        let report = pipeline.assemble(&data).await?;

        let document = Document::from_markdown(&report.title, &report.content);
        let (render_job, strategy) = self.renderer.render(strategy, document, &base_name).await?;
        info!(
            file = %render_job.filename,
            backend = render_job.backend.as_str(),
            tokens = report.tokens_used,
            cost = report.cost,
            "report generated"
        );
        Ok(GeneratedReport {
            report,
            render_job,
            strategy,
        })
    }
}
