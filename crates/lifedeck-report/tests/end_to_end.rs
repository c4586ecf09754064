use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use lifedeck_ai::{Generation, GenerationBackend, GenerationError, GenerationRequest, GenerationSettings};
use lifedeck_core::{
    BirthCardResolver, BirthCardSource, Card, LookupPolicy, ReferenceData, ReferenceDataSource,
    Relationship, SpreadResolver, combine, parse_birthdate,
};
use lifedeck_render::{
    ArtifactStore, Document, Download, FALLBACK_MARKER, OutputLocator, RenderBackend, RenderError,
    RenderStrategy, Rendered, Renderer,
};
use lifedeck_report::{ReportError, ReportKind, ReportService, ReportSpecification, ServiceConfig, Subject};

struct EchoGenerator {
    calls: AtomicUsize,
    fail_on: Option<usize>,
    delay: Duration,
}

impl EchoGenerator {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: None,
            delay: Duration::ZERO,
        }
    }
}

#[async_trait::async_trait]
impl GenerationBackend for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail_on == Some(n) {
            return Err(GenerationError::Server {
                status: 502,
                body: "upstream error".into(),
            });
        }
        let heading = request.messages[1]
            .content
            .lines()
            .find(|l| l.starts_with("## Section"))
            .unwrap_or("## Section")
            .to_string();
        Ok(Generation {
            content: format!("{heading}\nGenerated text."),
            tokens_used: 250,
            cost: 0.005,
        })
    }
}

struct CountingRemote {
    fails: bool,
    renders: AtomicUsize,
}

#[async_trait::async_trait]
impl RenderBackend for CountingRemote {
    fn strategy(&self) -> RenderStrategy {
        RenderStrategy::Remote
    }

    async fn health_check(&self) -> bool {
        !self.fails
    }

    async fn render(&self, _document: &Document, _filename: &str) -> Result<Rendered, RenderError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if self.fails {
            return Err(RenderError::Server {
                status: 503,
                body: "busy".into(),
            });
        }
        Ok(Rendered::Remote {
            url: "https://render.example/pdf/42".into(),
            cache: b"%PDF-1.7".to_vec(),
        })
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn jane() -> Subject {
    Subject::new("Jane Doe", date(1974, 11, 16), date(2005, 3, 1))
}

fn john() -> Subject {
    Subject::new("John Roe", date(1980, 7, 7), date(2005, 3, 1))
}

fn service(generator: EchoGenerator, renderer: Renderer) -> ReportService {
    let data: Arc<dyn ReferenceDataSource> = Arc::new(ReferenceData::bundled().unwrap());
    ReportService::new(
        data,
        Arc::new(generator),
        GenerationSettings::default(),
        renderer,
        ServiceConfig::default(),
    )
}

fn file_count(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[test]
fn birthdate_resolves_from_table_and_age_thirty_spread_starts_with_it() {
    let data = ReferenceData::bundled().unwrap();
    let birth = BirthCardResolver::new(&data).resolve(parse_birthdate("1974-11-16").unwrap());
    assert_eq!(birth.source, BirthCardSource::Table);
    assert_eq!(birth.card.symbol(), "4♣");

    let spread = SpreadResolver::new(&data)
        .resolve(birth.card, 30, LookupPolicy::Strict)
        .unwrap();
    assert_eq!(spread.cards.len(), 13);
    assert_eq!(spread.cards[0].card.symbol(), birth.card.symbol());
    assert_eq!(spread.anchor_index, 35);
    let zero = data.spread(0).unwrap();
    assert_eq!(spread.displacing_card, zero.card_at(spread.anchor_index));
    assert_eq!(spread.displacing_card.symbol(), "10♦");
    let symbols: Vec<String> = spread.cards.iter().map(|pc| pc.card.symbol()).collect();
    assert_eq!(symbols[..4], ["4♣", "8♣", "7♠", "6♠"]);
}

#[test]
fn date_missing_from_table_uses_arithmetic() {
    let data = ReferenceData::bundled().unwrap();
    let birth = BirthCardResolver::new(&data).resolve(date(1999, 12, 31));
    assert_eq!(birth.source, BirthCardSource::Arithmetic);
    assert_eq!(birth.card.symbol(), "6♣");
}

#[test]
fn relationship_points_of_view() {
    let data = ReferenceData::bundled().unwrap();
    let resolver = BirthCardResolver::new(&data);
    let a = resolver.resolve(date(1974, 11, 16)).card;
    let b = resolver.resolve(date(1980, 7, 7)).card;
    let rel = Relationship::between(a, b);
    assert_eq!(rel.combination, combine(a, b));
    assert_eq!(rel.combination.symbol(), "Q♠");
    assert_eq!(rel.first_point_of_view, combine(a, rel.combination));
    assert_eq!(rel.second_point_of_view, combine(b, rel.combination));
    assert_eq!(rel.first_point_of_view.symbol(), "3♣");
    assert_eq!(rel.second_point_of_view.symbol(), "7♦");
    assert_ne!(rel.first_point_of_view, rel.second_point_of_view);
    assert_eq!(Card::from_index(51).unwrap(), rel.combination);
}

#[tokio::test]
async fn yearly_report_renders_through_fallback_without_backends() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Renderer::new(ArtifactStore::new(dir.path()));
    let strategy = renderer.probe().await;
    assert_eq!(strategy, RenderStrategy::InProcess);

    let svc = service(EchoGenerator::new(), renderer);
    let spec = ReportSpecification::new(ReportKind::Yearly, vec![jane()], None).unwrap();
    let generated = svc.generate(spec, strategy).await.unwrap();

    assert_eq!(generated.report.chunks.len(), 4);
    assert_eq!(generated.report.tokens_used, 1000);
    assert!(generated.report.content.contains("## Section 4 of 4: Outlooks"));
    assert_eq!(generated.strategy, RenderStrategy::InProcess);
    assert!(generated.render_job.filename.starts_with("Jane_Doe_Age30_Yearly_Report_"));
    assert!(generated.render_job.sidecar.is_none());

    let OutputLocator::Local(path) = &generated.render_job.locator else {
        panic!("expected a local artifact");
    };
    let page = std::fs::read_to_string(path).unwrap();
    assert!(page.contains(FALLBACK_MARKER));
    assert!(page.contains("Jane Doe: Yearly Report (Age 30)"));

    let download = svc
        .renderer()
        .store()
        .resolve_download(&generated.render_job.filename)
        .await
        .unwrap();
    assert!(matches!(download, Download::File { content_type, .. } if content_type.starts_with("text/html")));
}

#[tokio::test]
async fn healthy_remote_writes_sidecar_and_redirects() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(CountingRemote {
        fails: false,
        renders: AtomicUsize::new(0),
    });
    let renderer = Renderer::new(ArtifactStore::new(dir.path())).with_backend(remote.clone());
    let svc = service(EchoGenerator::new(), renderer);
    let spec = ReportSpecification::new(ReportKind::Relationship, vec![jane(), john()], None).unwrap();

    let generated = svc.generate(spec, RenderStrategy::Remote).await.unwrap();
    assert_eq!(remote.renders.load(Ordering::SeqCst), 1);
    assert_eq!(generated.strategy, RenderStrategy::Remote);
    assert_eq!(generated.report.chunks.len(), 5);
    assert!(generated.render_job.filename.starts_with("Jane_Doe_John_Roe_Relationship_Report_"));

    let download = svc
        .renderer()
        .store()
        .resolve_download(&generated.render_job.filename)
        .await
        .unwrap();
    assert_eq!(
        download,
        Download::Redirect("https://render.example/pdf/42?download=true".into())
    );
}

#[tokio::test]
async fn failing_remote_downgrades_for_the_caller() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(CountingRemote {
        fails: true,
        renders: AtomicUsize::new(0),
    });
    let renderer = Renderer::new(ArtifactStore::new(dir.path())).with_backend(remote.clone());
    let svc = service(EchoGenerator::new(), renderer);
    let spec = ReportSpecification::new(ReportKind::Life, vec![jane()], None).unwrap();

    let generated = svc.generate(spec, RenderStrategy::Remote).await.unwrap();
    assert_eq!(remote.renders.load(Ordering::SeqCst), 1);
    assert_eq!(generated.strategy, RenderStrategy::InProcess);
    assert_eq!(generated.render_job.backend, RenderStrategy::InProcess);
}

#[tokio::test]
async fn second_chunk_failure_leaves_no_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Renderer::new(ArtifactStore::new(dir.path()));
    let generator = EchoGenerator {
        fail_on: Some(2),
        ..EchoGenerator::new()
    };
    let svc = service(generator, renderer);
    let spec = ReportSpecification::new(ReportKind::Financial, vec![jane()], Some(31)).unwrap();

    let err = svc.generate(spec, RenderStrategy::InProcess).await.unwrap_err();
    assert!(matches!(err, ReportError::Generation { ordinal: 2, .. }));
    assert_eq!(err.stage(), "generation");
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn slow_generation_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Renderer::new(ArtifactStore::new(dir.path()));
    let generator = EchoGenerator {
        delay: Duration::from_secs(5),
        ..EchoGenerator::new()
    };
    let svc = service(generator, renderer).with_timeout(Duration::from_millis(50));
    let spec = ReportSpecification::new(ReportKind::Singles, vec![jane()], None).unwrap();

    let err = svc.generate(spec, RenderStrategy::InProcess).await.unwrap_err();
    assert!(matches!(err, ReportError::TimedOut(_)));
    assert_eq!(err.stage(), "timeout");
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn every_report_kind_completes() {
    for kind in ReportKind::ALL {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(EchoGenerator::new(), Renderer::new(ArtifactStore::new(dir.path())));
        let subjects = if kind.subject_count() == 2 { vec![jane(), john()] } else { vec![jane()] };
        let spec = ReportSpecification::new(kind, subjects, None).unwrap();
        let generated = svc.generate(spec, RenderStrategy::InProcess).await.unwrap();
        assert_eq!(generated.report.kind, kind);
        assert!(
            generated.render_job.filename.contains(&kind.artifact_label(30)),
            "{kind}: {}",
            generated.render_job.filename
        );
    }
}
