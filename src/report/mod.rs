//! Run report for one anonymization
//! Author: cloakdocs maintainers
//! Created: 2026-10-19

pub mod formatter;

pub use formatter::ReportFormatter;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::types::{count_lists, Category, CategoryLists};

pub const NEVER_ANONYMIZED_NOTE: &str =
    "References, introduction and acknowledgement sections are never anonymized.";

/// Report output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    PlainText,
    #[default]
    Json,
    Markdown,
}

impl ReportFormat {
    /// Picks the format from a file extension, JSON when unknown
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("txt") => ReportFormat::PlainText,
            Some("md") => ReportFormat::Markdown,
            _ => ReportFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportSeverity {
    Info,
    Warning,
}

/// A note for the human auditor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub severity: ReportSeverity,
    pub stage: String,
    pub message: String,
}

/// Per-category tallies across the stages of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub detected: usize,
    pub resolved: usize,
    pub masked: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub input: String,
    pub output: Option<String>,
    pub generated_at: Option<String>,
    pub page_count: usize,
    pub title: Option<String>,
    pub categories: BTreeMap<Category, CategoryTally>,
    pub biographies: usize,
    pub redaction_success: bool,
    pub redaction_report: String,
    pub audit_id: Option<String>,
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            generated_at: Some(chrono::Utc::now().to_rfc3339()),
            categories: Category::ALL.iter().map(|c| (*c, CategoryTally::default())).collect(),
            ..Default::default()
        }
    }

    pub fn record_detected(&mut self, raw: &CategoryLists) {
        for (category, count) in count_lists(raw) {
            self.categories.entry(category).or_default().detected = count;
        }
    }

    pub fn record_resolved(&mut self, resolved: &BTreeMap<Category, usize>) {
        for (category, count) in resolved {
            self.categories.entry(*category).or_default().resolved = *count;
        }
    }

    pub fn record_masked(&mut self, masked: &BTreeMap<Category, usize>, biographies: usize) {
        for (category, count) in masked {
            self.categories.entry(*category).or_default().masked = *count;
        }
        self.biographies = biographies;
    }

    pub fn add_info(&mut self, stage: &str, message: impl Into<String>) {
        self.entries.push(ReportEntry {
            severity: ReportSeverity::Info,
            stage: stage.to_string(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, stage: &str, message: impl Into<String>) {
        self.entries.push(ReportEntry {
            severity: ReportSeverity::Warning,
            stage: stage.to_string(),
            message: message.into(),
        });
    }

    pub fn is_degraded(&self) -> bool {
        self.entries.iter().any(|e| e.severity == ReportSeverity::Warning)
    }

    pub fn total_masked(&self) -> usize {
        self.categories.values().map(|t| t.masked).sum()
    }

    /// Writes the report in the format implied by the file extension
    pub fn write(&self, path: &Path) -> Result<()> {
        let content = ReportFormatter::format(self, ReportFormat::from_path(path))?;
        std::fs::write(path, content)?;
        info!("📝 Report written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tallies_track_each_stage() {
        let mut report = RunReport::new("paper.pdf");
        let mut raw = CategoryLists::new();
        raw.insert(Category::AuthorName, vec!["Jane Smith".into(), "Jane".into()]);
        report.record_detected(&raw);
        report.record_resolved(&BTreeMap::from([(Category::AuthorName, 1)]));
        report.record_masked(&BTreeMap::from([(Category::AuthorName, 3)]), 1);

        let tally = &report.categories[&Category::AuthorName];
        assert_eq!((tally.detected, tally.resolved, tally.masked), (2, 1, 3));
        assert_eq!(report.categories[&Category::ContactInfo], CategoryTally::default());
        assert_eq!(report.total_masked(), 3);
    }

    #[test]
    fn warnings_mark_the_run_degraded() {
        let mut report = RunReport::new("paper.pdf");
        report.add_info("detection", "3 entities");
        assert!(!report.is_degraded());
        report.add_warning("detection", "NER model unavailable");
        assert!(report.is_degraded());
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ReportFormat::from_path(Path::new("r.md")), ReportFormat::Markdown);
        assert_eq!(ReportFormat::from_path(Path::new("r.TXT")), ReportFormat::PlainText);
        assert_eq!(ReportFormat::from_path(Path::new("r")), ReportFormat::Json);
    }
}
