//! Plain-text rendering of cards, spreads and report results.

use lifedeck_core::{BirthCard, CardMetadata, PositionedSpread, Relationship};
use lifedeck_render::Download;
use lifedeck_report::GeneratedReport;

const LABEL_WIDTH: usize = 22;

// ── Cards ──

pub fn print_birth_card(date: &str, birth: &BirthCard, meta: &CardMetadata) {
    println!("=== {} ({}) ===", birth.card.name(), birth.card);
    println!("  {:<LABEL_WIDTH$} {}", "birthdate", date);
    println!("  {:<LABEL_WIDTH$} {}", "source", birth.source.as_str());
    print_metadata(meta);
}

fn print_metadata(meta: &CardMetadata) {
    if !meta.description.is_empty() {
        println!("  {:<LABEL_WIDTH$} {}", "description", meta.description);
    }
    if !meta.keywords.is_empty() {
        println!("  {:<LABEL_WIDTH$} {}", "keywords", meta.keywords.join(", "));
    }
    println!("  {:<LABEL_WIDTH$} {}", "karma", meta.karma_summary());
    println!();
}

// ── Spreads ──

pub fn print_spread(heading: &str, spread: &PositionedSpread) {
    println!("{heading}");
    println!("  {:<LABEL_WIDTH$} {}", "requested age", spread.requested_age);
    println!("  {:<LABEL_WIDTH$} {}", "spread row", spread.effective_age);
    if spread.is_fallback() {
        println!(
            "  {:<LABEL_WIDTH$} {} (stands in for {})",
            "anchor", spread.anchor, spread.subject_card
        );
    } else {
        println!("  {:<LABEL_WIDTH$} {}", "anchor", spread.anchor);
    }
    println!("  {:<LABEL_WIDTH$} {}", "displacing card", spread.displacing_card);
    println!();

    for correlation in spread.correlations() {
        let marker = if correlation.aligned { "*" } else { " " };
        println!(
            "  {marker} {:<LABEL_WIDTH$} {:<4} natural: {}",
            correlation.current.label(),
            correlation.card.symbol(),
            correlation.natural_label()
        );
    }
    println!();
}

pub fn print_relationship(relationship: &Relationship) {
    println!("Relationship");
    println!("  {:<LABEL_WIDTH$} {}", "first", relationship.first.name());
    println!("  {:<LABEL_WIDTH$} {}", "second", relationship.second.name());
    println!("  {:<LABEL_WIDTH$} {}", "combination", relationship.combination.name());
    println!(
        "  {:<LABEL_WIDTH$} {}",
        "first point of view",
        relationship.first_point_of_view.name()
    );
    println!(
        "  {:<LABEL_WIDTH$} {}",
        "second point of view",
        relationship.second_point_of_view.name()
    );
    println!();
}

// ── Reports ──

pub fn print_generated(generated: &GeneratedReport) {
    let report = &generated.report;
    println!("=== {} ===", report.title);
    for chunk in &report.chunks {
        println!(
            "  {:>2}. {:<40} {:>6} tokens",
            chunk.ordinal, chunk.title, chunk.tokens_used
        );
    }
    println!();
    println!("  {:<LABEL_WIDTH$} {}", "tokens", report.tokens_used);
    println!("  {:<LABEL_WIDTH$} ${:.4}", "cost", report.cost);
    println!("  {:<LABEL_WIDTH$} {}", "backend", generated.render_job.backend.as_str());
    println!("  {:<LABEL_WIDTH$} {}", "file", generated.render_job.filename);
    if let Some(sidecar) = &generated.render_job.sidecar {
        println!("  {:<LABEL_WIDTH$} {}", "remote url", sidecar.external_url);
    }
}

/// `{"redirect": url}` or `{"path": ..., "content_type": ...}`.
pub fn download_json(download: &Download) -> serde_json::Value {
    match download {
        Download::Redirect(url) => serde_json::json!({ "redirect": url }),
        Download::File { path, content_type } => {
            serde_json::json!({ "path": path, "content_type": content_type })
        }
    }
}

pub fn print_download(download: &Download) {
    match download {
        Download::Redirect(url) => println!("redirect {url}"),
        Download::File { path, content_type } => {
            println!("file {} ({content_type})", path.display())
        }
    }
}
