//! Entity detection
//! Author: cloakdocs maintainers
//! Created: 2026-10-19
//!
//! Each requested category is detected independently: the header, first-page
//! and main-content zones are swept in that order, every chunk feeds the
//! model signal and the pattern signal into one [`CandidateTable`], context
//! boosts are added, and the accepted candidates are ranked. The ranked lists
//! then go through [`resolve::resolve`] once.

pub mod author;
pub mod candidates;
pub mod contact;
pub mod institution;
pub mod patterns;
pub mod resolve;

pub use candidates::{CandidateKey, CandidateTable};
pub use resolve::{keyword_blocks, ResolutionContext};

use std::collections::HashSet;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::DetectionConfig;
use crate::error::DetectionError;
use crate::model::{ModelStatus, NerLabel, NerModel};
use crate::types::{Category, CategoryLists, DocumentText, Provenance, ResolvedEntities};
use patterns::{chunk_text, context_window, is_common_word, is_valid_person_name};

lazy_static! {
    static ref AUTHOR_TRIGGERS: Regex =
        Regex::new(r"(?i)corresponding author|authors?\b|e-?mail|prepared by|written by").unwrap();
    static ref CONTACT_TRIGGERS: Regex =
        Regex::new(r"(?i)e-?mail|phone|\btel\b|contact|orcid|iletişim").unwrap();
    static ref INSTITUTION_TRIGGERS: Regex =
        Regex::new(r"(?i)university|institute|department|faculty|affiliation|address").unwrap();
}

const TRIGGER_BOOST: f64 = 0.5;
const MIN_MAIN_CONTENT_CHARS: usize = 10;
const INSTITUTION_KEYWORDS: &[&str] = &["university", "institute", "department", "college", "school", "laboratory"];

/// Texts handed to the detector
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectionRequest<'a> {
    pub main_content: &'a str,
    pub excluded_text: &'a str,
    pub first_page: &'a str,
    pub header_sections: &'a str,
    pub title: Option<&'a str>,
}

impl<'a> DetectionRequest<'a> {
    pub fn from_document(document: &'a DocumentText, title: Option<&'a str>) -> Self {
        Self {
            main_content: document.main_content(),
            excluded_text: document.excluded_text(),
            first_page: document.first_page(),
            header_sections: document.header_sections(),
            title,
        }
    }
}

/// Raw ranked lists, the resolved entities, and any absorbed degradations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionOutcome {
    pub raw: CategoryLists,
    pub resolved: ResolvedEntities,
    pub degraded: Vec<String>,
}

pub struct EntityDetector {
    config: DetectionConfig,
    model: Option<Arc<dyn NerModel>>,
    unavailable_reason: Option<String>,
}

impl EntityDetector {
    pub fn new(config: DetectionConfig, model: &ModelStatus) -> Self {
        let (model, unavailable_reason) = match model {
            ModelStatus::Loaded(model) => (Some(Arc::clone(model)), None),
            ModelStatus::Unavailable(reason) => (None, Some(reason.clone())),
        };
        Self {
            config,
            model,
            unavailable_reason,
        }
    }

    /// Detects and resolves the requested categories
    #[instrument(skip(self, request), fields(main_chars = request.main_content.len()))]
    pub fn detect(&self, request: &DetectionRequest<'_>, categories: &[Category]) -> DetectionOutcome {
        let mut degraded = Vec::new();
        if let Some(reason) = &self.unavailable_reason {
            warn!("⚠️ NER model unavailable, pattern signals only: {}", reason);
            degraded.push(DetectionError::ModelUnavailable(reason.clone()).to_string());
        }

        let mut raw = CategoryLists::new();
        for category in Category::ALL {
            if !categories.contains(&category) {
                continue;
            }
            info!("🔍 Detecting {}", category);
            let found = self.detect_category(category, request, &mut degraded);
            log_entity_stats(category, &found);
            raw.insert(category, found);
        }

        let context = ResolutionContext {
            main_content: request.main_content,
            excluded_text: request.excluded_text,
            title: request.title,
        };
        let resolved = resolve::resolve(&raw, &context);
        DetectionOutcome {
            raw,
            resolved,
            degraded,
        }
    }

    /// Ranked candidate strings of one category, before cross-category resolution
    pub fn detect_category(
        &self,
        category: Category,
        request: &DetectionRequest<'_>,
        degraded: &mut Vec<String>,
    ) -> Vec<String> {
        if request.main_content.trim().chars().count() < MIN_MAIN_CONTENT_CHARS {
            debug!("Main content too short, skipping {}", category);
            return Vec::new();
        }

        let mut table = CandidateTable::new();
        let mut boosted = HashSet::new();
        let zones = [
            (request.header_sections, Provenance::Header),
            (request.first_page, Provenance::FirstPage),
            (request.main_content, Provenance::MainContent),
        ];
        for (text, provenance) in zones {
            if text.trim().is_empty() {
                continue;
            }
            for chunk in chunk_text(text, self.config.chunk_threshold, self.config.chunk_size) {
                self.model_signal(category, chunk, provenance, &mut table, degraded);
                pattern_signal(category, chunk, provenance, &mut table);
                self.trigger_boost(category, chunk, provenance, &mut table, &mut boosted);
                if category == Category::AuthorName {
                    author::boost_author_contexts(chunk, self.config.author_context_window, &mut table);
                }
            }
            if provenance.is_front_matter() {
                header_signal(category, text, provenance, &mut table);
            }
        }

        let threshold = self.config.min_score;
        let author_threshold = threshold + self.config.author_bonus;
        table.ranked(|key, score| match category {
            Category::AuthorName => score >= author_threshold || key.provenance.is_front_matter(),
            _ => score >= threshold,
        })
    }

    fn model_signal(
        &self,
        category: Category,
        chunk: &str,
        provenance: Provenance,
        table: &mut CandidateTable,
        degraded: &mut Vec<String>,
    ) {
        let Some(model) = &self.model else { return };
        if category == Category::ContactInfo {
            return;
        }
        let spans = match model.recognize(chunk) {
            Ok(spans) => spans,
            Err(e) => {
                warn!("⚠️ NER model '{}' failed, signal skipped: {}", model.name(), e);
                let note = e.to_string();
                if !degraded.contains(&note) {
                    degraded.push(note);
                }
                return;
            }
        };

        let front = provenance.is_front_matter();
        let header = provenance == Provenance::Header;
        for span in spans {
            let text = span.text.trim();
            match category {
                Category::AuthorName if span.label == NerLabel::Person => {
                    if !is_valid_person_name(text) {
                        continue;
                    }
                    let mut score = 1.0;
                    if front {
                        score += 1.0;
                    }
                    if header {
                        score += 2.0;
                    }
                    table.offer(text, provenance, score);
                }
                Category::InstitutionInfo if span.label.is_institutional() => {
                    if text.chars().count() <= 3 || is_common_word(text) {
                        continue;
                    }
                    let mut score = 1.0;
                    if front {
                        score += 1.0;
                    }
                    if header {
                        score += 1.0;
                    }
                    let lower = text.to_lowercase();
                    if INSTITUTION_KEYWORDS.iter().any(|k| lower.contains(k)) {
                        score += 1.0;
                    }
                    table.offer(text, provenance, score);
                }
                _ => {}
            }
        }
    }

    /// +0.5, once per detection run, for each candidate of this zone whose
    /// neighbourhood in the chunk holds a trigger word
    fn trigger_boost(
        &self,
        category: Category,
        chunk: &str,
        provenance: Provenance,
        table: &mut CandidateTable,
        boosted: &mut HashSet<CandidateKey>,
    ) {
        let triggers: &Regex = match category {
            Category::AuthorName => &*AUTHOR_TRIGGERS,
            Category::ContactInfo => &*CONTACT_TRIGGERS,
            Category::InstitutionInfo => &*INSTITUTION_TRIGGERS,
        };
        let window = self.config.context_window;
        table.boost_where(TRIGGER_BOOST, |key| {
            key.provenance == provenance
                && chunk.contains(key.text.as_str())
                && triggers.is_match(context_window(chunk, &key.text, window))
                && boosted.insert(key.clone())
        });
    }
}

fn pattern_signal(category: Category, chunk: &str, provenance: Provenance, table: &mut CandidateTable) {
    match category {
        Category::AuthorName => author::extract(chunk, provenance, table),
        Category::ContactInfo => contact::extract(chunk, provenance, table),
        Category::InstitutionInfo => institution::extract(chunk, provenance, table),
    }
}

fn header_signal(category: Category, text: &str, provenance: Provenance, table: &mut CandidateTable) {
    match category {
        Category::AuthorName => author::extract_header(text, provenance, table),
        Category::ContactInfo => contact::extract_header(text, provenance, table),
        Category::InstitutionInfo => institution::extract_header(text, provenance, table),
    }
}

/// Logs the count of a category with a few examples
pub fn log_entity_stats(category: Category, entities: &[String]) {
    if entities.is_empty() {
        info!("📭 No {} candidates found", category);
        return;
    }
    let examples: Vec<&str> = entities.iter().take(3).map(String::as_str).collect();
    info!("📊 {} {} candidates, e.g. {:?}", entities.len(), category, examples);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NerSpan;

    struct FailingModel;

    impl NerModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        fn recognize(&self, _text: &str) -> Result<Vec<NerSpan>, DetectionError> {
            Err(DetectionError::ModelFailure("boom".into()))
        }
    }

    fn request(main: &str) -> DetectionRequest<'_> {
        DetectionRequest {
            main_content: main,
            ..Default::default()
        }
    }

    #[test]
    fn titled_name_above_email_is_detected_with_its_title() {
        let detector = EntityDetector::new(DetectionConfig::default(), &ModelStatus::Unavailable("off".into()));
        let main = "Dr. Jane Smith\njane.smith@university.edu";
        let outcome = detector.detect(&request(main), &[Category::AuthorName]);
        assert_eq!(outcome.raw[&Category::AuthorName][0], "Dr. Jane Smith");
        assert_eq!(outcome.resolved.for_category(Category::AuthorName), ["Dr. Jane Smith"]);
        assert_eq!(outcome.degraded.len(), 1);
    }

    #[test]
    fn model_failure_is_absorbed() {
        let status = ModelStatus::from_model(Arc::new(FailingModel));
        let detector = EntityDetector::new(DetectionConfig::default(), &status);
        let main = "Contact us at jane.smith@university.edu for details.";
        let outcome = detector.detect(&request(main), &[Category::ContactInfo, Category::InstitutionInfo]);
        assert_eq!(
            outcome.resolved.for_category(Category::ContactInfo),
            ["jane.smith@university.edu"]
        );
        assert!(outcome.degraded.iter().any(|d| d.contains("boom")));
    }

    #[test]
    fn trigger_boost_applies_once_per_run() {
        let detector = EntityDetector::new(DetectionConfig::default(), &ModelStatus::Unavailable("off".into()));
        let mut table = CandidateTable::new();
        let mut boosted = HashSet::new();
        table.offer("jane@kocaeli.edu.tr", Provenance::MainContent, 1.0);
        for chunk in ["E-mail: jane@kocaeli.edu.tr", "Contact jane@kocaeli.edu.tr again"] {
            detector.trigger_boost(Category::ContactInfo, chunk, Provenance::MainContent, &mut table, &mut boosted);
        }
        assert_eq!(table.score("jane@kocaeli.edu.tr", Provenance::MainContent), Some(1.5));
    }

    #[test]
    fn unavailable_model_is_noted_once() {
        let detector = EntityDetector::new(DetectionConfig::default(), &ModelStatus::Unavailable("off".into()));
        let outcome = detector.detect(&request("Write to jane@kocaeli.edu.tr today"), &Category::ALL);
        assert_eq!(outcome.degraded, ["NER model unavailable: off"]);
    }

    #[test]
    fn short_main_content_yields_nothing() {
        let detector = EntityDetector::new(DetectionConfig::default(), &ModelStatus::Unavailable("off".into()));
        let outcome = detector.detect(&request("tiny"), &Category::ALL);
        assert!(outcome.resolved.replacements.is_empty());
    }

    #[test]
    fn unrequested_categories_are_absent() {
        let detector = EntityDetector::new(DetectionConfig::default(), &ModelStatus::Unavailable("off".into()));
        let outcome = detector.detect(&request("Write to jane@kocaeli.edu.tr today"), &[Category::ContactInfo]);
        assert!(!outcome.raw.contains_key(&Category::AuthorName));
        assert!(outcome.raw.contains_key(&Category::ContactInfo));
    }
}
