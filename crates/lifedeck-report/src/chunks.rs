//! Declarative section plans, one static list per report kind.
//!
//! Each [`ChunkDescriptor`] names a section, picks the card data that feeds
//! it, and caps its generation budget. One generic executor runs them all.

use lifedeck_core::{PositionCorrelation, Position, PositionedCard, Suit};

use crate::prompt::{card_entry, correlation_entries, positioned_entries, spread_overview, subject_header};
use crate::reading::ReportData;
use crate::spec::ReportKind;

pub type Selector = fn(&ReportData) -> String;

pub struct ChunkDescriptor {
    pub title: &'static str,
    pub instruction: &'static str,
    pub select: Selector,
    pub max_tokens: u32,
}

impl ChunkDescriptor {
    /// Full user prompt for this section.
    pub fn prompt(&self, data: &ReportData, ordinal: usize, total: usize) -> String {
        format!(
            "# {}\n\n{}\n## Section {ordinal} of {total}: {}\n\n{}\n\n{}",
            data.spec.title(),
            subject_header(data),
            self.title,
            self.instruction,
            (self.select)(data)
        )
    }
}

pub fn plan(kind: ReportKind) -> &'static [ChunkDescriptor] {
    match kind {
        ReportKind::Yearly => &YEARLY,
        ReportKind::Life => &LIFE,
        ReportKind::Relationship => &RELATIONSHIP,
        ReportKind::Financial => &FINANCIAL,
        ReportKind::Singles => &SINGLES,
        ReportKind::ChildrensLife => &CHILDRENS_LIFE,
    }
}

// ── Selectors ──

fn birth_card(data: &ReportData) -> String {
    card_entry(data, "Birth Card", data.primary().birth.card)
}

fn intro_with_displacing(data: &ReportData) -> String {
    format!(
        "{}\n{}\n### Spread\n{}",
        birth_card(data),
        card_entry(data, "Displacing Card", data.spread.displacing_card),
        spread_overview(&data.spread.cards)
    )
}

fn intro_with_life_spread(data: &ReportData) -> String {
    format!("{}\n### Life Spread\n{}", birth_card(data), spread_overview(&data.spread.cards))
}

fn inner_positions(data: &ReportData) -> String {
    positioned_entries(data, data.spread.range(Position::Sun, Position::Jupiter))
}

fn outer_positions(data: &ReportData) -> String {
    positioned_entries(data, data.spread.range(Position::Saturn, Position::Earth))
}

fn whole_spread(data: &ReportData) -> String {
    positioned_entries(data, &data.spread.cards)
}

fn whole_spread_with_correlations(data: &ReportData) -> String {
    correlation_entries(data, &data.spread.cards)
}

fn intro_with_correlations(data: &ReportData) -> String {
    format!(
        "{}\n{}\n### Position Correlations\n{}",
        birth_card(data),
        card_entry(data, "Displacing Card", data.spread.displacing_card),
        whole_spread_with_correlations(data)
    )
}

fn saturn_focus(data: &ReportData) -> String {
    correlation_entries(data, data.spread.range(Position::Saturn, Position::Saturn))
}

fn inner_positions_with_correlations(data: &ReportData) -> String {
    correlation_entries(data, data.spread.range(Position::Sun, Position::Jupiter))
}

fn outer_positions_with_correlations(data: &ReportData) -> String {
    correlation_entries(data, data.spread.range(Position::Saturn, Position::Earth))
}

/// Displaced cards, spades, and whatever sits in Saturn or Pluto.
fn challenges(data: &ReportData) -> String {
    let flagged: Vec<PositionedCard> = data
        .spread
        .cards
        .iter()
        .filter(|pc| {
            !PositionCorrelation::from(*pc).aligned
                || pc.card.suit() == Suit::Spades
                || matches!(pc.position, Position::Saturn | Position::Pluto)
        })
        .copied()
        .collect();
    if flagged.is_empty() {
        return "Every card sits in its natural position this year.".to_string();
    }
    correlation_entries(data, &flagged)
}

fn relationship_intro(data: &ReportData) -> String {
    let mut out: Vec<String> = data
        .readings
        .iter()
        .map(|r| card_entry(data, &format!("{}'s Birth Card", r.subject.name), r.birth.card))
        .collect();
    if let Some(rel) = &data.relationship {
        out.push(card_entry(data, "Combination Card", rel.combination));
    }
    out.join("\n")
}

fn points_of_view(data: &ReportData) -> String {
    let Some(rel) = &data.relationship else {
        return String::new();
    };
    let povs = [rel.first_point_of_view, rel.second_point_of_view];
    data.readings
        .iter()
        .zip(povs)
        .map(|(r, pov)| card_entry(data, &format!("{}'s Point of View", r.subject.name), pov))
        .collect::<Vec<_>>()
        .join("\n")
}

fn relationship_first_half(data: &ReportData) -> String {
    positioned_entries(data, data.spread.range(Position::Sun, Position::Uranus))
}

fn relationship_second_half(data: &ReportData) -> String {
    positioned_entries(data, data.spread.range(Position::Neptune, Position::Earth))
}

/// The positions that carry the most weight between two people, then the
/// combination card itself.
fn deeper_analysis(data: &ReportData) -> String {
    let focus = [
        Position::Saturn,
        Position::Venus,
        Position::Neptune,
        Position::Moon,
        Position::Mars,
        Position::Pluto,
    ];
    let mut out: Vec<String> = focus
        .iter()
        .filter_map(|p| data.spread.card_at(*p))
        .map(|pc| card_entry(data, pc.position.label(), pc.card))
        .collect();
    if let Some(rel) = &data.relationship {
        out.push(card_entry(data, "Combination Card", rel.combination));
    }
    out.join("\n")
}

// ── Plans ──

static YEARLY: [ChunkDescriptor; 4] = [
    ChunkDescriptor {
        title: "Introduction and Displacing Card",
        instruction: "Introduce the year ahead through the birth card, then interpret the displacing card as the year's overarching influence.",
        select: intro_with_displacing,
        max_tokens: 4000,
    },
    ChunkDescriptor {
        title: "Sun through Jupiter",
        instruction: "Interpret each card below in its position for the coming year, with practical guidance for each.",
        select: inner_positions,
        max_tokens: 4500,
    },
    ChunkDescriptor {
        title: "Saturn through Earth/Transformation",
        instruction: "Interpret each card below in its position for the coming year, covering lessons, turning points, and outcomes.",
        select: outer_positions,
        max_tokens: 7000,
    },
    ChunkDescriptor {
        title: "Outlooks",
        instruction: "Summarise the year's outlook for love, work, money, and health, drawing on the whole spread.",
        select: whole_spread,
        max_tokens: 4500,
    },
];

static LIFE: [ChunkDescriptor; 4] = [
    ChunkDescriptor {
        title: "Introduction",
        instruction: "Introduce the birth card as the core of this person's character and life path.",
        select: intro_with_life_spread,
        max_tokens: 2000,
    },
    ChunkDescriptor {
        title: "Sun through Jupiter",
        instruction: "Interpret each life-spread card below as a lifelong influence in its position.",
        select: inner_positions,
        max_tokens: 4500,
    },
    ChunkDescriptor {
        title: "Saturn through Earth/Transformation",
        instruction: "Interpret each life-spread card below as a lifelong lesson or destination in its position.",
        select: outer_positions,
        max_tokens: 7000,
    },
    ChunkDescriptor {
        title: "Life Outlooks",
        instruction: "Summarise strengths, challenges, and communication style across the whole life spread.",
        select: whole_spread,
        max_tokens: 4500,
    },
];

static RELATIONSHIP: [ChunkDescriptor; 5] = [
    ChunkDescriptor {
        title: "Introduction and Combination Card",
        instruction: "Introduce both people through their birth cards, then interpret the combination card as the relationship's own identity.",
        select: relationship_intro,
        max_tokens: 2000,
    },
    ChunkDescriptor {
        title: "Points of View",
        instruction: "Describe how each person experiences the relationship through their point-of-view card.",
        select: points_of_view,
        max_tokens: 3000,
    },
    ChunkDescriptor {
        title: "Relationship Spread: Sun through Uranus",
        instruction: "Interpret each card below in its position within the relationship spread.",
        select: relationship_first_half,
        max_tokens: 3000,
    },
    ChunkDescriptor {
        title: "Relationship Spread: Neptune through Earth/Transformation",
        instruction: "Interpret each card below in its position within the relationship spread.",
        select: relationship_second_half,
        max_tokens: 3000,
    },
    ChunkDescriptor {
        title: "Deeper Analysis",
        instruction: "Go deeper on commitment, affection, ideals, emotional needs, conflict, and transformation using the cards below.",
        select: deeper_analysis,
        max_tokens: 3000,
    },
];

static FINANCIAL: [ChunkDescriptor; 5] = [
    ChunkDescriptor {
        title: "Financial Overview",
        instruction: "Introduce the year's financial picture and explain what the position correlations below mean for money decisions.",
        select: intro_with_correlations,
        max_tokens: 6000,
    },
    ChunkDescriptor {
        title: "Saturn Analysis",
        instruction: "Analyse the Saturn card as the year's main financial discipline and limitation.",
        select: saturn_focus,
        max_tokens: 2000,
    },
    ChunkDescriptor {
        title: "Sun through Jupiter",
        instruction: "Interpret each card below for investment, income, and business outcomes.",
        select: inner_positions_with_correlations,
        max_tokens: 4500,
    },
    ChunkDescriptor {
        title: "Saturn through Earth/Transformation",
        instruction: "Interpret each card below for investment, income, and business outcomes.",
        select: outer_positions_with_correlations,
        max_tokens: 4500,
    },
    ChunkDescriptor {
        title: "Financial Challenges",
        instruction: "Identify the financial challenges these cards point to and give concrete strategies for each.",
        select: challenges,
        max_tokens: 6000,
    },
];

static SINGLES: [ChunkDescriptor; 4] = [
    ChunkDescriptor {
        title: "Romantic Overview",
        instruction: "Introduce the year's romantic picture and explain what the position correlations below mean for dating.",
        select: intro_with_correlations,
        max_tokens: 6000,
    },
    ChunkDescriptor {
        title: "Sun through Jupiter",
        instruction: "Interpret each card below for dating prospects and the kind of connections it favours.",
        select: inner_positions,
        max_tokens: 4500,
    },
    ChunkDescriptor {
        title: "Saturn through Earth/Transformation",
        instruction: "Interpret each card below for emotional growth and relationship wisdom.",
        select: outer_positions,
        max_tokens: 4500,
    },
    ChunkDescriptor {
        title: "Relationship Prospects",
        instruction: "Draw the whole spread together into prospects, challenges, and strategies for the year.",
        select: whole_spread_with_correlations,
        max_tokens: 6000,
    },
];

static CHILDRENS_LIFE: [ChunkDescriptor; 4] = [
    ChunkDescriptor {
        title: "Introduction",
        instruction: "Introduce the child's birth card for a parent, in warm and encouraging language.",
        select: intro_with_life_spread,
        max_tokens: 2000,
    },
    ChunkDescriptor {
        title: "Sun through Jupiter",
        instruction: "Interpret each card below as a gift or tendency the child will grow into.",
        select: inner_positions,
        max_tokens: 4500,
    },
    ChunkDescriptor {
        title: "Saturn through Earth/Transformation",
        instruction: "Interpret each card below as a lesson the child will meet, with guidance for supporting them.",
        select: outer_positions,
        max_tokens: 7000,
    },
    ChunkDescriptor {
        title: "Development Guidance",
        instruction: "Give parents practical guidance on learning, friendships, and emotional development across the whole spread.",
        select: whole_spread,
        max_tokens: 4500,
    },
];
