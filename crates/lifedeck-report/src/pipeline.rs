//! Sequential section generation.
//!
//! Sections are generated strictly in order, one backend call each. The
//! first failure fails the whole report; nothing partial is returned.

use lifedeck_ai::{GenerationBackend, GenerationSettings};
use serde::Serialize;
use tracing::{info, warn};

use crate::ReportError;
use crate::chunks::plan;
use crate::reading::ReportData;
use crate::spec::ReportKind;

pub const SECTION_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "ordinal", rename_all = "snake_case")]
pub enum ReportState {
    Pending,
    /// 1-based ordinal of the section being generated.
    ChunkInProgress(usize),
    Complete,
    /// 1-based ordinal of the section that failed.
    Failed(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportChunk {
    pub ordinal: usize,
    pub title: String,
    pub max_tokens: u32,
    #[serde(skip)]
    pub prompt: String,
    pub content: Option<String>,
    pub tokens_used: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub kind: ReportKind,
    pub title: String,
    pub chunks: Vec<ReportChunk>,
    pub content: String,
    pub tokens_used: u64,
    pub cost: f64,
}

pub struct ReportAssemblyPipeline<'a> {
    backend: &'a dyn GenerationBackend,
    settings: &'a GenerationSettings,
    state: ReportState,
}

impl<'a> ReportAssemblyPipeline<'a> {
    pub fn new(backend: &'a dyn GenerationBackend, settings: &'a GenerationSettings) -> Self {
        Self {
            backend,
            settings,
            state: ReportState::Pending,
        }
    }

    pub fn state(&self) -> ReportState {
        self.state
    }

    /// Unfilled chunks for `data`, prompts rendered.
    pub fn plan(data: &ReportData) -> Vec<ReportChunk> {
        let descriptors = plan(data.spec.kind());
        let total = descriptors.len();
        descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| ReportChunk {
                ordinal: i + 1,
                title: d.title.to_string(),
                max_tokens: d.max_tokens,
                prompt: d.prompt(data, i + 1, total),
                content: None,
                tokens_used: 0,
                cost: 0.0,
            })
            .collect()
    }

    pub async fn assemble(&mut self, data: &ReportData) -> Result<Report, ReportError> {
        let mut chunks = Self::plan(data);
        let total = chunks.len();

        for chunk in chunks.iter_mut() {
            self.state = ReportState::ChunkInProgress(chunk.ordinal);
            info!(
                backend = self.backend.name(),
                ordinal = chunk.ordinal,
                total,
                section = %chunk.title,
                max_tokens = chunk.max_tokens,
                "generating section"
            );
            let request = self.settings.request(chunk.prompt.clone(), chunk.max_tokens);
            let generation = match self.backend.generate(&request).await {
                Ok(generation) => generation,
                Err(source) => {
                    self.state = ReportState::Failed(chunk.ordinal);
                    warn!(ordinal = chunk.ordinal, section = %chunk.title, error = %source, "section failed, abandoning report");
                    return Err(ReportError::Generation {
                        ordinal: chunk.ordinal,
                        section: chunk.title.clone(),
                        source,
                    });
                }
            };
            chunk.tokens_used = generation.tokens_used;
            chunk.cost = generation.cost;
            chunk.content = Some(generation.content);
        }

        let content = chunks
            .iter()
            .filter_map(|c| c.content.as_deref())
            .collect::<Vec<_>>()
            .join(SECTION_SEPARATOR);
        let report = Report {
            kind: data.spec.kind(),
            title: data.spec.title(),
            tokens_used: chunks.iter().map(|c| c.tokens_used).sum(),
            cost: chunks.iter().map(|c| c.cost).sum(),
            content,
            chunks,
        };
        self.state = ReportState::Complete;
        info!(sections = total, tokens = report.tokens_used, cost = report.cost, "report assembled");
        Ok(report)
    }
}
