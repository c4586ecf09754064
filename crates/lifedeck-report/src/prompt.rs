//! Card data formatted for generation prompts.

use std::fmt::Write;

use lifedeck_core::{Card, PositionCorrelation, PositionedCard};

use crate::reading::ReportData;

/// `**{label}**: {name} ({symbol})` followed by keywords, description, karma.
pub fn card_entry(data: &ReportData, label: &str, card: Card) -> String {
    let meta = data.metadata(card);
    let keywords = if meta.keywords.is_empty() {
        "None listed".to_string()
    } else {
        meta.keywords.join(", ")
    };
    format!(
        "**{label}**: {} ({})\n- **Keywords**: {keywords}\n- **Description**: {}\n- **Karma**: {}\n",
        card.name(),
        card.symbol(),
        meta.description,
        meta.karma_summary()
    )
}

pub fn positioned_entries(data: &ReportData, cards: &[PositionedCard]) -> String {
    cards
        .iter()
        .map(|pc| card_entry(data, pc.position.label(), pc.card))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Positioned entries extended with natural position and its implication.
pub fn correlation_entries(data: &ReportData, cards: &[PositionedCard]) -> String {
    cards
        .iter()
        .map(|pc| {
            let correlation = PositionCorrelation::from(pc);
            let mut entry = card_entry(data, pc.position.label(), pc.card);
            let _ = writeln!(entry, "- **Natural Position**: {}", correlation.natural_label());
            let _ = writeln!(entry, "- **Position Correlation**: {}", correlation.implication());
            entry
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per position: `Sun: 4♣ (Four of Clubs)`.
pub fn spread_overview(cards: &[PositionedCard]) -> String {
    cards
        .iter()
        .map(|pc| format!("- {}: {} ({})", pc.position.label(), pc.card.symbol(), pc.card.name()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Who the report is for, and their birth cards.
pub fn subject_header(data: &ReportData) -> String {
    let mut out = String::new();
    for reading in &data.readings {
        let _ = writeln!(
            out,
            "- **{}**, born {}, age {}: birth card {} ({})",
            reading.subject.name,
            reading.subject.birthdate.format("%B %-d, %Y"),
            reading.subject.age,
            reading.birth.card.name(),
            reading.birth.card.symbol()
        );
    }
    if data.spec.kind().is_age_specific() {
        let _ = writeln!(out, "- **Report age**: {}", data.spec.report_age());
    }
    if data.spread.is_fallback() {
        let _ = writeln!(
            out,
            "- **Spread anchor**: {} (stand-in for the birth card in this year's spread)",
            data.spread.anchor.symbol()
        );
    }
    out
}
