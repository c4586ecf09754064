//! What a report request asks for: its kind, its subjects, and the age.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use lifedeck_core::age_on;
use lifedeck_render::artifact::validate_name;
use serde::{Deserialize, Serialize};

use crate::ReportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Yearly,
    Life,
    Relationship,
    Financial,
    Singles,
    ChildrensLife,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::Yearly,
        ReportKind::Life,
        ReportKind::Relationship,
        ReportKind::Financial,
        ReportKind::Singles,
        ReportKind::ChildrensLife,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yearly => "yearly",
            Self::Life => "life",
            Self::Relationship => "relationship",
            Self::Financial => "financial",
            Self::Singles => "singles",
            Self::ChildrensLife => "childrens_life",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Yearly => "Yearly Report",
            Self::Life => "Life Report",
            Self::Relationship => "Relationship Report",
            Self::Financial => "Financial Report",
            Self::Singles => "Singles Report",
            Self::ChildrensLife => "Children's Life Report",
        }
    }

    pub fn subject_count(&self) -> usize {
        match self {
            Self::Relationship => 2,
            _ => 1,
        }
    }

    /// Whether the report reads the spread for a specific age.
    pub fn is_age_specific(&self) -> bool {
        matches!(self, Self::Yearly | Self::Financial | Self::Singles)
    }

    /// Report-type segment of the artifact name.
    pub fn artifact_label(&self, age: u32) -> String {
        match self {
            Self::Yearly => format!("Age{age}_Yearly_Report"),
            Self::Life => "Life_Report".to_string(),
            Self::Relationship => "Relationship_Report".to_string(),
            Self::Financial => format!("Age{age}_Financial_Report"),
            Self::Singles => format!("Age{age}_Singles_Report"),
            Self::ChildrensLife => "Childrens_Life_Report".to_string(),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == normalised || (normalised == "childrens" && *k == Self::ChildrensLife))
            .ok_or_else(|| ReportError::Specification(format!("unknown report type {s:?}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub name: String,
    pub birthdate: NaiveDate,
    /// Age on the request date.
    pub age: u32,
}

impl Subject {
    pub fn new(name: impl Into<String>, birthdate: NaiveDate, as_of: NaiveDate) -> Self {
        Self {
            name: name.into(),
            birthdate,
            age: age_on(birthdate, as_of),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSpecification {
    kind: ReportKind,
    subjects: Vec<Subject>,
    age_override: Option<u32>,
}

impl ReportSpecification {
    pub fn new(
        kind: ReportKind,
        subjects: Vec<Subject>,
        age_override: Option<u32>,
    ) -> Result<Self, ReportError> {
        if subjects.len() != kind.subject_count() {
            return Err(ReportError::Specification(format!(
                "{} needs {} subject(s), got {}",
                kind.title(),
                kind.subject_count(),
                subjects.len()
            )));
        }
        if let Some(blank) = subjects.iter().position(|s| s.name.trim().is_empty()) {
            return Err(ReportError::Specification(format!("subject {} has no name", blank + 1)));
        }
        for subject in &subjects {
            validate_name(&subject.name).map_err(|_| {
                ReportError::Specification(format!(
                    "subject name {:?} cannot be used in an artifact name",
                    subject.name
                ))
            })?;
        }
        Ok(Self {
            kind,
            subjects,
            age_override,
        })
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    /// One subject per [`ReportKind::subject_count`], in request order.
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn age_override(&self) -> Option<u32> {
        self.age_override
    }

    pub fn primary(&self) -> &Subject {
        &self.subjects[0]
    }

    /// Age the spread is drawn for: the override, else the primary subject's age.
    pub fn report_age(&self) -> u32 {
        self.age_override.unwrap_or(self.primary().age)
    }

    pub fn subject_names(&self) -> Vec<&str> {
        self.subjects.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn artifact_label(&self) -> String {
        self.kind.artifact_label(self.report_age())
    }

    /// Heading for the rendered document.
    pub fn title(&self) -> String {
        let names = self.subject_names().join(" & ");
        if self.kind.is_age_specific() {
            format!("{names}: {} (Age {})", self.kind.title(), self.report_age())
        } else {
            format!("{names}: {}", self.kind.title())
        }
    }
}
