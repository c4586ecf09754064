use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use lifedeck_ai::{GenerationSettings, OpenRouterClient, OpenRouterConfig};
use lifedeck_core::{
    BirthCardResolver, LookupPolicy, ReferenceData, Relationship, SpreadResolver, age_on,
    metadata_for, parse_birthdate,
};
use lifedeck_render::{LocalConfig, RemoteConfig, Renderer, RendererConfig};
use lifedeck_report::{ReportKind, ReportService, ReportSpecification, ServiceConfig, Subject};

mod display;

#[derive(Parser, Debug)]
#[command(name = "lifedeck", version, about = "Birthdate card readings and reports")]
struct Cli {
    /// Directory holding birth_cards.json (or Card_Births.csv), spreads.json and cards.json.
    /// The bundled tables are used when unset.
    #[arg(long, global = true, env = "LIFEDECK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Date ages are computed against (defaults to today).
    #[arg(long, global = true)]
    as_of: Option<String>,

    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct RenderArgs {
    #[arg(long, env = "LIFEDECK_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Base URL of the remote rendering service.
    #[arg(long, env = "LIFEDECK_RENDER_URL")]
    render_url: Option<String>,

    /// Local renderer program, invoked as `program <input.html> <output.pdf>`.
    #[arg(long, env = "LIFEDECK_LOCAL_RENDERER")]
    local_renderer: Option<String>,
}

impl RenderArgs {
    fn renderer(&self) -> Renderer {
        Renderer::from_config(RendererConfig {
            output_dir: self.output_dir.clone(),
            remote: self.render_url.clone().map(|base_url| RemoteConfig {
                base_url,
                ..RemoteConfig::default()
            }),
            local: self.local_renderer.clone().map(|program| LocalConfig {
                program,
                ..LocalConfig::default()
            }),
        })
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the birth card for a date.
    BirthCard { date: String },
    /// Show the spread for a birthdate at an age.
    Spread {
        date: String,
        /// Age to read; defaults to the age on the as-of date.
        #[arg(long)]
        age: Option<u32>,
    },
    /// Show combination and point-of-view cards for two birthdates.
    Relationship { first: String, second: String },
    /// Health-check the configured render backends.
    Probe {
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Generate, render and store a report.
    Report {
        kind: ReportKind,
        /// Subject name; repeat for two-subject reports.
        #[arg(long = "name", required = true)]
        names: Vec<String>,
        /// Subject birthdate, in the same order as --name.
        #[arg(long = "date", required = true)]
        dates: Vec<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
        api_key: String,
        #[arg(long, env = "LIFEDECK_MODEL")]
        model: Option<String>,
        #[arg(long, default_value_t = lifedeck_report::service::DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Resolve a stored report filename to a file or redirect.
    Download {
        filename: String,
        #[command(flatten)]
        render: RenderArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    tracing::debug!("lifedeck v{}", env!("CARGO_PKG_VERSION"));

    let as_of = match &cli.as_of {
        Some(raw) => parse_birthdate(raw).context("parsing --as-of")?,
        None => Local::now().date_naive(),
    };

    match cli.command {
        Commands::BirthCard { date } => {
            let data = load_reference(cli.data_dir.as_deref())?;
            let birthdate = parse_date(&date)?;
            let birth = BirthCardResolver::new(&data).resolve(birthdate);
            let meta = metadata_for(&data, birth.card);
            if cli.json {
                print_json(&serde_json::json!({ "birth": birth, "metadata": meta }))?;
            } else {
                display::print_birth_card(&date, &birth, &meta);
            }
        }
        Commands::Spread { date, age } => {
            let data = load_reference(cli.data_dir.as_deref())?;
            let birthdate = parse_date(&date)?;
            let age = age.unwrap_or_else(|| age_on(birthdate, as_of));
            let birth = BirthCardResolver::new(&data).resolve(birthdate);
            let spread = SpreadResolver::new(&data)
                .resolve(birth.card, age, LookupPolicy::ArithmeticFallback)
                .with_context(|| format!("resolving age {age} spread for {}", birth.card))?;
            if cli.json {
                print_json(&serde_json::json!({
                    "birth": birth,
                    "spread": spread,
                    "correlations": spread.correlations(),
                }))?;
            } else {
                display::print_spread(
                    &format!("{} ({}) at age {age}", birth.card.name(), birth.card),
                    &spread,
                );
            }
        }
        Commands::Relationship { first, second } => {
            let data = load_reference(cli.data_dir.as_deref())?;
            let resolver = BirthCardResolver::new(&data);
            let a = resolver.resolve(parse_date(&first)?);
            let b = resolver.resolve(parse_date(&second)?);
            let relationship = Relationship::between(a.card, b.card);
            let spread = SpreadResolver::new(&data)
                .relationship_spread(relationship.combination)
                .context("resolving relationship spread")?;
            if cli.json {
                print_json(&serde_json::json!({ "relationship": relationship, "spread": spread }))?;
            } else {
                display::print_relationship(&relationship);
                display::print_spread("Relationship Spread", &spread);
            }
        }
        Commands::Probe { render } => {
            let strategy = render.renderer().probe().await;
            if cli.json {
                print_json(&serde_json::json!({ "strategy": strategy }))?;
            } else {
                println!("render backend: {}", strategy.as_str());
            }
        }
        Commands::Report {
            kind,
            names,
            dates,
            age,
            api_key,
            model,
            timeout_secs,
            render,
        } => {
            if names.len() != dates.len() {
                bail!("{} --name value(s) but {} --date value(s)", names.len(), dates.len());
            }
            let subjects = names
                .into_iter()
                .zip(&dates)
                .map(|(name, date)| Ok(Subject::new(name, parse_date(date)?, as_of)))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let spec = ReportSpecification::new(kind, subjects, age)?;

            let data = load_reference(cli.data_dir.as_deref())?;
            let generator = OpenRouterClient::new(OpenRouterConfig {
                api_key,
                ..OpenRouterConfig::default()
            });
            let mut settings = GenerationSettings::default();
            if let Some(model) = model {
                settings.model = model;
            }

            let renderer = render.renderer();
            let strategy = renderer.probe().await;
            let service = ReportService::new(
                Arc::new(data),
                Arc::new(generator),
                settings,
                renderer,
                ServiceConfig { timeout_secs },
            );
            let generated = service
                .generate(spec, strategy)
                .await
                .map_err(|e| anyhow::anyhow!("{} stage failed: {e}", e.stage()))?;
            if cli.json {
                print_json(&serde_json::json!({
                    "report": generated.report,
                    "render": generated.render_job,
                }))?;
            } else {
                display::print_generated(&generated);
            }
        }
        Commands::Download { filename, render } => {
            let renderer = render.renderer();
            let download = renderer
                .store()
                .resolve_download(&filename)
                .await
                .with_context(|| format!("resolving {filename}"))?;
            if cli.json {
                print_json(&display::download_json(&download))?;
            } else {
                display::print_download(&download);
            }
        }
    }

    Ok(())
}

fn load_reference(dir: Option<&Path>) -> anyhow::Result<ReferenceData> {
    match dir {
        Some(dir) => ReferenceData::load_dir(dir)
            .with_context(|| format!("loading reference data from {}", dir.display())),
        None => ReferenceData::bundled().context("loading bundled reference data"),
    }
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    parse_birthdate(raw).with_context(|| format!("parsing birthdate {raw:?}"))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
