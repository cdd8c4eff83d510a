//! Report formatter implementation

use super::{ReportFormat, ReportSeverity, RunReport, NEVER_ANONYMIZED_NOTE};
use crate::error::Result;

/// Formats a run report into its output formats
pub struct ReportFormatter;

impl ReportFormatter {
    pub fn format(report: &RunReport, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::PlainText => Ok(Self::to_text(report)),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            ReportFormat::Markdown => Ok(Self::to_markdown(report)),
        }
    }

    fn severity_tag(severity: ReportSeverity) -> &'static str {
        match severity {
            ReportSeverity::Info => "INFO",
            ReportSeverity::Warning => "WARNING",
        }
    }

    fn to_text(report: &RunReport) -> String {
        let mut output = String::new();
        output.push_str("Anonymization Report\n");
        output.push_str("====================\n\n");
        output.push_str(&format!("Input: {}\n", report.input));
        if let Some(out) = &report.output {
            output.push_str(&format!("Output: {}\n", out));
        }
        output.push_str(&format!("Pages: {}\n", report.page_count));
        if let Some(id) = &report.audit_id {
            output.push_str(&format!("Audit record: {}\n", id));
        }
        output.push('\n');

        output.push_str("Category            detected  resolved  masked\n");
        for (category, tally) in &report.categories {
            output.push_str(&format!(
                "{:<18} {:>9} {:>9} {:>7}\n",
                category.as_str(),
                tally.detected,
                tally.resolved,
                tally.masked
            ));
        }
        if report.biographies > 0 {
            output.push_str(&format!("({} author biographies included in author_name)\n", report.biographies));
        }
        output.push('\n');

        for entry in &report.entries {
            output.push_str(&format!("[{}] {}: {}\n", Self::severity_tag(entry.severity), entry.stage, entry.message));
        }
        output.push_str(NEVER_ANONYMIZED_NOTE);
        output.push('\n');
        output
    }

    fn to_markdown(report: &RunReport) -> String {
        let mut md = String::new();
        md.push_str("# Anonymization Report\n\n");
        md.push_str(&format!("- **Input**: `{}`\n", report.input));
        if let Some(out) = &report.output {
            md.push_str(&format!("- **Output**: `{}`\n", out));
        }
        md.push_str(&format!("- **Pages**: {}\n", report.page_count));
        md.push_str(&format!("- **Masked regions**: {}\n\n", report.total_masked()));

        md.push_str("| Category | Detected | Resolved | Masked |\n");
        md.push_str("|----------|----------|----------|--------|\n");
        for (category, tally) in &report.categories {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                category, tally.detected, tally.resolved, tally.masked
            ));
        }

        if !report.entries.is_empty() {
            md.push_str("\n## Notes\n\n");
            for entry in &report.entries {
                md.push_str(&format!(
                    "- **{}** ({}): {}\n",
                    Self::severity_tag(entry.severity),
                    entry.stage,
                    entry.message
                ));
            }
        }
        md.push_str(&format!("\n_{}_\n", NEVER_ANONYMIZED_NOTE));
        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use crate::types::Category;

    #[test]
    fn text_report_lists_categories_and_warnings() {
        let mut report = RunReport::new("paper.pdf");
        report.record_masked(&BTreeMap::from([(Category::ContactInfo, 2)]), 0);
        report.add_warning("redaction", "pages 2 could not be rewritten");
        let text = ReportFormatter::format(&report, ReportFormat::PlainText).unwrap();
        assert!(text.contains("contact_info"));
        assert!(text.contains("[WARNING] redaction"));
        assert!(text.ends_with(&format!("{}\n", NEVER_ANONYMIZED_NOTE)));
    }

    #[test]
    fn json_report_parses_back() {
        let report = RunReport::new("paper.pdf");
        let json = ReportFormatter::format(&report, ReportFormat::Json).unwrap();
        let parsed: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.input, "paper.pdf");
        assert_eq!(parsed.categories.len(), 3);
    }
}
