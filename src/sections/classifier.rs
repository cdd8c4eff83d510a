use tracing::{debug, info, instrument};

use super::{is_title_marker, SectionTracker, AUTHOR_CONTEXT};
use crate::config::SectionConfig;
use crate::error::{ExtractionError, Result};
use crate::pdf::PageLayout;
use crate::types::{DocumentText, Zone, Zones};

/// Splits extracted page text into policy zones
#[derive(Debug, Clone, Default)]
pub struct SectionClassifier {
    config: SectionConfig,
}

impl SectionClassifier {
    pub fn new(config: SectionConfig) -> Self {
        Self { config }
    }

    /// Classifies reconstructed page layouts
    #[instrument(skip(self, pages), fields(pages = pages.len()))]
    pub fn classify(&self, pages: &[PageLayout]) -> Result<DocumentText> {
        if pages.is_empty() {
            return Err(ExtractionError::NoPages.into());
        }
        let texts: Vec<&str> = pages.iter().map(PageLayout::text).collect();
        Ok(self.classify_pages(&texts))
    }

    /// Classifies plain page texts, one entry per page
    pub fn classify_pages<S: AsRef<str>>(&self, pages: &[S]) -> DocumentText {
        let mut full_text = String::new();
        let mut zones = Zones::default();
        let mut tracker = SectionTracker::new(self.config.max_header_words);
        let mut references_page = None;

        for (page_num, page) in pages.iter().enumerate() {
            let page_text = page.as_ref();
            full_text.push_str(page_text);
            full_text.push('\n');
            let lines: Vec<&str> = page_text.split('\n').collect();

            if page_num == 0 {
                zones.first_page = format!("{}\n", page_text);
                self.capture_header_sections(&lines, &mut zones);
            }

            if tracker.in_references() {
                zones.push_line(Zone::ExcludedSections, page_text);
                continue;
            }

            for line in &lines {
                let zone = tracker.observe(line);
                if tracker.in_references() && references_page.is_none() {
                    references_page = Some(page_num);
                    info!("📚 Reference section detected on page {}", page_num + 1);
                }
                zones.push_line(zone, line);
            }
        }

        if !zones.excluded_sections.is_empty() {
            debug!(
                "Excluded sections hold {} characters",
                zones.excluded_sections.chars().count()
            );
        }

        DocumentText {
            full_text,
            zones,
            page_count: pages.len(),
            references_page,
        }
    }

    /// Collects author-context and title-marker neighbourhoods of page one
    fn capture_header_sections(&self, lines: &[&str], zones: &mut Zones) {
        let radius = self.config.author_context_radius;
        for (i, line) in lines.iter().enumerate() {
            if AUTHOR_CONTEXT.is_match(line) {
                let start = i.saturating_sub(radius);
                let end = (i + radius + 1).min(lines.len());
                zones.push_line(Zone::HeaderSections, &lines[start..end].join("\n"));
            }
        }
        for (i, line) in lines.iter().enumerate() {
            if is_title_marker(line) {
                let end = (i + self.config.title_marker_lines).min(lines.len());
                zones.push_line(Zone::HeaderSections, &lines[i..end].join("\n"));
            }
        }
    }
}
