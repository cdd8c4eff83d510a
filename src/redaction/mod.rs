//! Redaction engine
//! Author: cloakdocs maintainers
//! Created: 2026-10-19
//!
//! Planning walks every page layout once, with the same section state
//! machine the classifier uses, and proposes one record per occurrence
//! fragment. Applying a plan rewrites each touched page exactly once.

pub mod apply;
pub mod biography;
pub mod metadata;
pub mod plan;

pub use biography::{find_biographies, Biography};
pub use plan::{PagePlan, RecordKind, RedactionPlan, RedactionRecord};

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::config::{RedactionConfig, SectionConfig};
use crate::error::RedactionError;
use crate::pdf::text::page_operations;
use crate::pdf::{PageLayout, Rect, RectKey};
use crate::pdf_document::PdfDocument;
use crate::sections::{is_excluded_header, SectionTracker};
use crate::types::{Category, ReplacementMap, Zone};

const MIN_ENTITY_CHARS: usize = 4;
const DEFAULT_COLOR: [f64; 3] = [0.0, 0.0, 0.0];

/// Whether masks can be burned into the PDF, decided once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedactionCapability {
    Available,
    Unavailable(String),
}

impl RedactionCapability {
    pub fn detect(config: &RedactionConfig) -> Self {
        if config.burn_in {
            RedactionCapability::Available
        } else {
            RedactionCapability::Unavailable("burn-in redaction disabled by configuration".into())
        }
    }
}

/// What the engine did with one document
#[derive(Debug, Clone, Default, Serialize)]
pub struct RedactionOutcome {
    pub success: bool,
    pub report: String,
    /// Reason the output is an unmodified copy, if it is one
    pub degraded: Option<String>,
    /// Masked regions per category; biographies count as `author_name`
    pub counts: BTreeMap<Category, usize>,
    pub biographies: usize,
    /// Pages left unmodified because their rewrite failed
    pub failed_pages: Vec<usize>,
    pub metadata_entries_removed: usize,
    #[serde(skip)]
    pub regions: BTreeSet<(usize, RectKey)>,
}

impl RedactionOutcome {
    fn failure(error: RedactionError) -> Self {
        warn!("❌ Redaction failed: {}", error);
        Self {
            success: false,
            report: error.to_string(),
            ..Default::default()
        }
    }
}

fn relates_to_title(text: &str, title: Option<&str>) -> bool {
    match title.map(str::trim) {
        Some(title) if !title.is_empty() => title.contains(text) || text.contains(title),
        _ => false,
    }
}

pub struct RedactionEngine {
    config: RedactionConfig,
    max_header_words: usize,
    capability: RedactionCapability,
}

impl RedactionEngine {
    pub fn new(config: RedactionConfig, sections: &SectionConfig) -> Self {
        let capability = RedactionCapability::detect(&config);
        Self {
            config,
            max_header_words: sections.max_header_words,
            capability,
        }
    }

    pub fn with_capability(mut self, capability: RedactionCapability) -> Self {
        self.capability = capability;
        self
    }

    pub fn capability(&self) -> &RedactionCapability {
        &self.capability
    }

    fn style_for(&self, layout: &PageLayout, rect: &Rect) -> (f64, [f64; 3]) {
        layout
            .style_at(rect)
            .unwrap_or((self.config.fallback_font_size, DEFAULT_COLOR))
    }

    fn label_size(&self, source_size: f64) -> f64 {
        (source_size * self.config.label_scale).max(self.config.min_font_size)
    }

    /// Proposes every record for the document; performs no I/O
    pub fn plan(&self, layouts: &[PageLayout], replacements: &ReplacementMap, title: Option<&str>) -> RedactionPlan {
        let mut plan = RedactionPlan::new();

        if self.config.detect_biographies {
            if let Some(last) = layouts.last() {
                self.plan_biographies(last, &mut plan);
            }
        }

        let mut entries: Vec<_> = replacements
            .iter()
            .filter(|r| r.text.chars().count() >= MIN_ENTITY_CHARS && !relates_to_title(&r.text, title))
            .collect();
        entries.sort_by(|a, b| b.text.chars().count().cmp(&a.text.chars().count()));

        let mut tracker = SectionTracker::new(self.max_header_words);
        for layout in layouts {
            let zones: Vec<Zone> = layout.lines.iter().map(|line| tracker.observe(&line.text)).collect();
            if !zones.is_empty() && zones.iter().all(|z| *z == Zone::ExcludedSections) {
                debug!("Page {} lies in excluded sections, skipping", layout.index + 1);
                continue;
            }

            let page_plan = plan.page_mut(layout.index);
            for entry in &entries {
                for occurrence in layout.search(&entry.text) {
                    let excluded_line = layout
                        .line_of(occurrence.chars.start)
                        .and_then(|li| zones.get(li))
                        .map_or(false, |z| *z == Zone::ExcludedSections);
                    if excluded_line {
                        continue;
                    }
                    let near_excluded_header = layout
                        .lines_near(&occurrence.chars, self.config.context_chars)
                        .any(|line| is_excluded_header(&line.text, self.max_header_words));
                    if near_excluded_header {
                        debug!("'{}' sits next to an excluded header, skipping", entry.text);
                        continue;
                    }

                    for rect in &occurrence.rects {
                        if page_plan.is_claimed(rect) {
                            continue;
                        }
                        let glyphs: Vec<usize> = occurrence
                            .glyphs
                            .iter()
                            .copied()
                            .filter(|gi| {
                                let (x, y) = layout.glyphs[*gi].bbox.center();
                                rect.contains_point(x, y)
                            })
                            .collect();
                        let (size, color) = self.style_for(layout, rect);
                        page_plan.propose(RedactionRecord {
                            page: layout.index,
                            rect: *rect,
                            label: entry.token.clone(),
                            font_size: self.label_size(size),
                            color,
                            kind: RecordKind::Entity(entry.category),
                            glyphs,
                        });
                    }
                }
            }
        }
        plan
    }

    fn plan_biographies(&self, layout: &PageLayout, plan: &mut RedactionPlan) {
        let biographies = find_biographies(layout);
        if biographies.is_empty() {
            return;
        }
        info!("👤 {} author biographies found on page {}", biographies.len(), layout.index + 1);
        let page_plan = plan.page_mut(layout.index);
        for (n, bio) in biographies.into_iter().enumerate() {
            let (_, color) = self.style_for(layout, &bio.rect);
            page_plan.propose(RedactionRecord {
                page: layout.index,
                rect: bio.rect,
                label: format!("[AUTHOR-BIOGRAPHY-{} SANSURLENDI]", n + 1),
                font_size: self.config.biography_font_size,
                color,
                kind: RecordKind::Biography,
                glyphs: bio.glyphs,
            });
        }
    }

    /// Writes an anonymized copy of `input` to `output`.
    ///
    /// Only unreadable input and unwritable output yield `success = false`;
    /// missing capability or an encrypted input produce an unmodified copy.
    #[instrument(skip(self, replacements), fields(entities = replacements.len()))]
    pub fn redact(
        &self,
        input: &Path,
        output: &Path,
        replacements: &ReplacementMap,
        title: Option<&str>,
    ) -> RedactionOutcome {
        let bytes = match fs::read(input) {
            Ok(bytes) => bytes,
            Err(e) => return RedactionOutcome::failure(RedactionError::UnreadableInput(e.to_string())),
        };
        let mut pdf = match PdfDocument::from_bytes(&bytes) {
            Ok(pdf) => pdf,
            Err(e) => return RedactionOutcome::failure(RedactionError::UnreadableInput(e.to_string())),
        };

        let degraded_reason = match &self.capability {
            RedactionCapability::Unavailable(reason) => Some(reason.clone()),
            RedactionCapability::Available if pdf.is_encrypted() => {
                Some("input is encrypted and cannot be rewritten".to_string())
            }
            RedactionCapability::Available => None,
        };
        if let Some(reason) = degraded_reason {
            return self.copy_unmodified(&bytes, output, reason);
        }

        let layouts = pdf.layouts();
        let plan = self.plan(&layouts, replacements, title);

        let mut failed_pages = Vec::new();
        let mut applied = RedactionPlan::new();
        for page_plan in plan.pages().filter(|p| !p.is_empty()) {
            match self.apply_page(&mut pdf, &layouts[page_plan.page], page_plan) {
                Ok(()) => {
                    *applied.page_mut(page_plan.page) = page_plan.clone();
                }
                Err(e) => {
                    warn!("⚠️ {}; page left unmodified", e);
                    failed_pages.push(page_plan.page);
                }
            }
        }

        let metadata_entries_removed = metadata::scrub_metadata(&mut pdf.document, replacements);
        pdf.document.prune_objects();
        pdf.document.compress();
        if let Err(e) = pdf.document.save(output) {
            return RedactionOutcome::failure(RedactionError::UnwritableOutput(format!(
                "{}: {}",
                output.display(),
                e
            )));
        }

        let counts = applied.counts();
        let biographies = applied.biography_count();
        let report = render_report(&counts, biographies, &failed_pages, None);
        info!("🖊️ Redaction complete: {} regions masked", counts.values().sum::<usize>());
        RedactionOutcome {
            success: true,
            report,
            degraded: None,
            counts,
            biographies,
            failed_pages,
            metadata_entries_removed,
            regions: applied.region_keys(),
        }
    }

    fn apply_page(&self, pdf: &mut PdfDocument, layout: &PageLayout, page_plan: &PagePlan) -> Result<(), RedactionError> {
        let page_number = page_plan.page as u32 + 1;
        let page_id = pdf
            .page_id(page_plan.page)
            .ok_or_else(|| RedactionError::Rewrite(page_number, "no such page".into()))?;
        let content = page_operations(&pdf.document, page_id)
            .map_err(|e| RedactionError::Rewrite(page_number, e.to_string()))?;
        apply::apply_page_plan(
            &mut pdf.document,
            page_id,
            &content.operations,
            &layout.glyphs,
            page_plan,
            self.config.fill_color,
        )
    }

    fn copy_unmodified(&self, bytes: &[u8], output: &Path, reason: String) -> RedactionOutcome {
        warn!("⚠️ Degraded mode: {}", reason);
        if let Err(e) = fs::write(output, bytes) {
            return RedactionOutcome::failure(RedactionError::UnwritableOutput(format!(
                "{}: {}",
                output.display(),
                e
            )));
        }
        let counts: BTreeMap<Category, usize> = Category::ALL.iter().map(|c| (*c, 0)).collect();
        RedactionOutcome {
            success: true,
            report: render_report(&counts, 0, &[], Some(&reason)),
            degraded: Some(reason),
            counts,
            ..Default::default()
        }
    }
}

fn render_report(
    counts: &BTreeMap<Category, usize>,
    biographies: usize,
    failed_pages: &[usize],
    degraded: Option<&str>,
) -> String {
    let mut lines = Vec::new();
    if let Some(reason) = degraded {
        lines.push(format!(
            "DEGRADED MODE: {}. The output is an unmodified copy of the input; nothing was masked.",
            reason
        ));
    }
    let total: usize = counts.values().sum();
    lines.push(format!("Masked regions: {}", total));
    for (category, count) in counts {
        if *category == Category::AuthorName && biographies > 0 {
            lines.push(format!("  {}: {} (including {} biographies)", category, count, biographies));
        } else {
            lines.push(format!("  {}: {}", category, count));
        }
    }
    if !failed_pages.is_empty() {
        let pages: Vec<String> = failed_pages.iter().map(|p| (p + 1).to_string()).collect();
        lines.push(format!(
            "WARNING: pages {} could not be rewritten and were left unmodified.",
            pages.join(", ")
        ));
    }
    lines.push("References, introduction and acknowledgement sections are never anonymized.".into());
    lines.join("\n")
}
