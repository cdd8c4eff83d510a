//! Shared patterns and text helpers for the extractors

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    pub static ref EMAIL: Regex =
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
    pub static ref EMAIL_LINE: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    /// Two or more capitalized words filling a whole line
    pub static ref NAME_LINE: Regex =
        Regex::new(r"^[A-Z][a-zA-Z\-]+(?:\s+[A-Z][a-zA-Z\-]+)+$").unwrap();
    pub static ref SINGLE_NAME_LINE: Regex = Regex::new(r"^[A-Z][a-zA-Z\-]+$").unwrap();
    /// Initial plus surname, e.g. "S. Indu"
    pub static ref INITIAL_NAME: Regex = Regex::new(r"^[A-Z]\.\s+[A-Z][a-zA-Z\-]+$").unwrap();
    pub static ref AFFILIATION_LINE: Regex = Regex::new(r"Department|Faculty|Institute|School").unwrap();
    static ref NAME_CHARS: Regex = Regex::new(r"[0-9@#$%^&*()_+=\[\]{}|\\<>/]").unwrap();
    static ref PUNCTUATION: Regex = Regex::new(r"[.,;:!?]").unwrap();
    static ref CAPITALIZED_WORDS: Regex =
        Regex::new(r"^[A-Z][a-zÀ-ÿ\-]+(?:\s+[A-Z][a-zÀ-ÿ\-]+)+$").unwrap();
    static ref CAPITALIZED_WORDS_OR_ONE: Regex =
        Regex::new(r"^[A-Z][a-zÀ-ÿ\-]+(?:\s+[A-Z][a-zÀ-ÿ\-]+)*$").unwrap();
    static ref ACADEMIC_TITLE_PREFIX: Regex = Regex::new(
        r"^(?:Dr\.?|Prof\.?|Professor|Assoc\.? Prof\.?|Assistant Prof\.?|Asst\.? Prof\.?|PhD|Ph\.D\.?|M\.?Sc\.?|B\.?Sc\.?|MD|M\.?D\.?|M\.?Tech\.?|B\.?Tech\.?|Er\.?|Engr\.?)\s+"
    )
    .unwrap();
}

const STOP_WORDS: &[&str] = &["the", "and", "or", "in", "at", "on", "by", "to", "for", "with", "about"];

const IEEE_ROLES: &[&str] = &[
    "member",
    "senior member",
    "fellow",
    "student member",
    "associate member",
    "ieee",
];

const SCIENTIFIC_TERMS: &[&str] = &[
    "figure", "table", "section", "equation", "theorem", "corollary", "proof", "algorithm",
];

const COMMON_WORDS: &[&str] = &[
    "table", "figure", "abstract", "introduction", "methodology", "results", "discussion",
    "conclusion", "references", "appendix", "example", "analysis", "method", "section",
    "equation", "value",
];

/// Heuristic check that `name` can be a person's name.
///
/// Title-prefixed names (`Dr. Jane Smith`, `Er. Rahul Kumar`) are accepted
/// when the remainder is a run of capitalized words.
pub fn is_valid_person_name(name: &str) -> bool {
    if name.chars().count() < 3 {
        return false;
    }
    if NAME_CHARS.is_match(name) {
        return false;
    }
    if PUNCTUATION.find_iter(name).count() > 2 {
        return false;
    }
    let lower = name.to_lowercase();
    if STOP_WORDS.contains(&lower.as_str()) || IEEE_ROLES.contains(&lower.as_str()) {
        return false;
    }
    if INITIAL_NAME.is_match(name) {
        return true;
    }
    if name.chars().count() > 5 && CAPITALIZED_WORDS.is_match(name) {
        return true;
    }
    if name.starts_with("Er.") && name.chars().count() > 5 {
        return CAPITALIZED_WORDS_OR_ONE.is_match(name[3..].trim());
    }
    if let Some(prefix) = ACADEMIC_TITLE_PREFIX.find(name) {
        return CAPITALIZED_WORDS_OR_ONE.is_match(name[prefix.end()..].trim());
    }
    !SCIENTIFIC_TERMS.contains(&lower.as_str())
}

/// Words that look like entities to a model but never are
pub fn is_common_word(text: &str) -> bool {
    COMMON_WORDS.contains(&text.to_lowercase().as_str())
}

/// Largest char boundary not above `index`
pub fn floor_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest char boundary not below `index`
pub fn ceil_boundary(text: &str, index: usize) -> usize {
    let mut i = index.min(text.len());
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Slice of `text` around the byte range `start..end`, widened by `window` bytes
pub fn window_around(text: &str, start: usize, end: usize, window: usize) -> &str {
    let lo = floor_boundary(text, start.saturating_sub(window));
    let hi = ceil_boundary(text, end.saturating_add(window));
    &text[lo..hi]
}

/// Context around the first occurrence of `target`; empty when absent
pub fn context_window<'a>(text: &'a str, target: &str, window: usize) -> &'a str {
    match text.find(target) {
        Some(pos) => window_around(text, pos, pos + target.len(), window),
        None => "",
    }
}

/// Splits `text` into pieces of at most `chunk_chars` characters.
///
/// Texts up to `threshold` characters are returned whole. A match spanning a
/// seam may be missed.
pub fn chunk_text(text: &str, threshold: usize, chunk_chars: usize) -> Vec<&str> {
    if text.chars().count() <= threshold || chunk_chars == 0 {
        return vec![text];
    }
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (i, _) in text.char_indices() {
        if count == chunk_chars {
            chunks.push(&text[start..i]);
            start = i;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}
