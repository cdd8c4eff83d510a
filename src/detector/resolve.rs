//! Cross-category resolution
//!
//! Runs once after every requested category has its ranked list. The steps
//! are applied in a fixed order:
//!
//! 1. normalize (newlines to spaces, trim) and drop strings under 4 chars
//! 2. within a category, keep a string only if no longer kept string contains it
//! 3. assign each string to the first category, in priority order, listing it
//! 4. drop strings related to the document title
//! 5. drop strings found in excluded sections or keyword blocks
//! 6. drop author names on the abbreviation deny list
//! 7. number the survivors per category

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use super::patterns::{ceil_boundary, floor_boundary};
use crate::error::DetectionError;
use crate::types::{Category, CategoryLists, Replacement, ReplacementMap, ResolvedEntities};

lazy_static! {
    /// A keyword marker line plus the three lines after it
    static ref KEYWORD_BLOCK: Regex =
        Regex::new(r"(?im)^.*(?:index[ \t]+terms|keywords?)\b[^\n]*(?:\n[^\n]*){0,3}").unwrap();
}

/// Abbreviations that name-shaped patterns keep mistaking for authors
const ABBREVIATION_DENY_LIST: &[&str] = &[
    "CNN", "RNN", "LSTM", "GRU", "DNN", "SVM", "PCA", "LDA", "DEAP", "DENS", "EEG", "ECG", "EMG",
    "MRI", "SEED", "GPU", "CPU", "API", "IOT", "NLP", "OCR", "RSS",
];

const MIN_ENTITY_CHARS: usize = 4;
const KEYWORD_RECHECK_WINDOW: usize = 200;

/// Text the resolver checks candidates against
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionContext<'a> {
    pub main_content: &'a str,
    pub excluded_text: &'a str,
    pub title: Option<&'a str>,
}

/// Keyword/index-term blocks of `text`, each as the marker line and three more lines
pub fn keyword_blocks(text: &str) -> Vec<&str> {
    KEYWORD_BLOCK.find_iter(text).map(|m| m.as_str()).collect()
}

fn normalize(value: &str) -> String {
    value.replace(['\r', '\n'], " ").trim().to_string()
}

/// Longest first; a string contained in an already kept one is dropped
fn absorb_substrings(values: Vec<String>) -> Vec<String> {
    let mut sorted = values;
    sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    let mut kept: Vec<String> = Vec::with_capacity(sorted.len());
    for value in sorted {
        if !kept.iter().any(|k| k.contains(value.as_str())) {
            kept.push(value);
        }
    }
    kept
}

fn relates_to_title(value: &str, title: Option<&str>) -> bool {
    match title.map(str::trim) {
        Some(title) if !title.is_empty() => title.contains(value) || value.contains(title),
        _ => false,
    }
}

/// Whether `value` sits inside a keyword list of `main_content`
fn in_keyword_context(value: &str, main_content: &str) -> bool {
    let recheck = match Regex::new(&format!(
        r"(?is)(?:INDEX\s+TERMS|KEYWORDS)[\s:\-]*.*{}",
        regex::escape(value)
    )) {
        Ok(recheck) => recheck,
        Err(e) => {
            warn!("⚠️ Keyword recheck skipped for '{}': {}", value, DetectionError::Pattern(e.to_string()));
            return false;
        }
    };
    main_content.match_indices(value).any(|(pos, _)| {
        let lo = floor_boundary(main_content, pos.saturating_sub(KEYWORD_RECHECK_WINDOW));
        let hi = ceil_boundary(main_content, pos + value.len() + KEYWORD_RECHECK_WINDOW);
        recheck.is_match(&main_content[lo..hi])
    })
}

/// Resolves ranked per-category lists into disjoint entities and mask tokens
pub fn resolve(raw: &CategoryLists, context: &ResolutionContext<'_>) -> ResolvedEntities {
    let blocks = keyword_blocks(context.main_content);
    let mut excluded = context.excluded_text.to_string();
    for block in &blocks {
        excluded.push('\n');
        excluded.push_str(block);
    }
    if !blocks.is_empty() {
        debug!("Added {} keyword blocks to the exclusion text", blocks.len());
    }

    let mut claimed: HashSet<String> = HashSet::new();
    let mut entities = CategoryLists::new();
    let mut entries = Vec::new();

    for category in Category::ALL {
        let Some(values) = raw.get(&category) else { continue };

        let mut normalized: Vec<String> = Vec::new();
        for value in values.iter().map(|v| normalize(v)) {
            if value.chars().count() >= MIN_ENTITY_CHARS && !normalized.contains(&value) {
                normalized.push(value);
            }
        }

        let mut kept = Vec::new();
        for value in absorb_substrings(normalized) {
            // First category listing a string owns it, even if it is dropped below
            if !claimed.insert(value.clone()) {
                debug!("'{}' already assigned to a higher-priority category", value);
                continue;
            }
            if relates_to_title(&value, context.title) {
                debug!("Skipping '{}': related to the document title", value);
                continue;
            }
            if excluded.contains(value.as_str()) || in_keyword_context(&value, context.main_content) {
                debug!("Skipping '{}': found in excluded sections or keywords", value);
                continue;
            }
            if category == Category::AuthorName
                && ABBREVIATION_DENY_LIST.contains(&value.to_uppercase().as_str())
            {
                debug!("Skipping '{}': scientific abbreviation", value);
                continue;
            }
            kept.push(value);
        }

        for (i, value) in kept.iter().enumerate() {
            entries.push(Replacement {
                text: value.clone(),
                token: category.mask_token(i + 1),
                category,
            });
        }
        info!("✅ {}: {} entities after resolution", category, kept.len());
        entities.insert(category, kept);
    }

    ResolvedEntities {
        entities,
        replacements: ReplacementMap::from_entries(entries),
    }
}
