//! Section detection shared by text classification and page redaction
//! Author: cloakdocs maintainers
//! Created: 2026-10-19
//!
//! Both consumers walk lines through the same [`SectionTracker`], so a line
//! excluded from detection is also never redacted.

pub mod classifier;

pub use classifier::SectionClassifier;

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::Zone;

lazy_static! {
    static ref SECTION_HEADER: Regex =
        Regex::new(r"^\s*(?:\d+\.)*\s*([A-Za-z\s]+)$").unwrap();
    static ref EXCLUDED_SECTION: Regex = Regex::new(
        r"(?i)INTRODUCTION|RELATED\s+WORKS?|REFERENCES|BIBLIOGRAPHY|ACKNOWLEDGEMENTS?|CITED\s+REFERENCES"
    )
    .unwrap();
    static ref REFERENCE_SECTION: Regex = Regex::new(
        r"(?i)^\s*(?:REFERENCES|BIBLIOGRAPHY|CITED\s+REFERENCES|REFERANSLAR|KAYNAKLAR|KAYNAKÇA|REFERENCES\s+AND\s+CITATIONS)\s*$"
    )
    .unwrap();
    /// Phrases that signal author information nearby
    pub(crate) static ref AUTHOR_CONTEXT: Regex = Regex::new(
        r"(?i)corresponding author|authors?:?|prepared by|written by|submitted by|affiliation|department of|faculty of|school of|university of|institute of|contact:?"
    )
    .unwrap();
    static ref TITLE_MARKER: Regex = Regex::new(r"(?i)^\s*(?:ABSTRACT|TITLE:?|KEYWORDS:?)").unwrap();
}

/// Header words that never change the section state
const NEUTRAL_HEADERS: [&str; 2] = ["TABLE", "FIGURE"];

/// Upper-cased header text when `line` looks like a section header
pub fn section_header(line: &str, max_words: usize) -> Option<String> {
    let caps = SECTION_HEADER.captures(line.trim())?;
    let title = caps.get(1)?.as_str().trim().to_uppercase();
    let words = title.split_whitespace().count();
    (words > 0 && words <= max_words).then_some(title)
}

/// A line consisting only of a reference-section heading
pub fn is_reference_header(line: &str) -> bool {
    REFERENCE_SECTION.is_match(line)
}

/// A header line that opens a section never anonymized
pub fn is_excluded_header(line: &str, max_words: usize) -> bool {
    is_reference_header(line)
        || section_header(line, max_words)
            .map(|title| EXCLUDED_SECTION.is_match(&title))
            .unwrap_or(false)
}

pub(crate) fn is_title_marker(line: &str) -> bool {
    TITLE_MARKER.is_match(line)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    Main,
    Excluded,
    /// Entered on a reference heading; never left
    References,
}

/// Line-by-line section state machine
#[derive(Debug, Clone)]
pub struct SectionTracker {
    state: SectionState,
    max_header_words: usize,
}

impl SectionTracker {
    pub fn new(max_header_words: usize) -> Self {
        Self {
            state: SectionState::Main,
            max_header_words,
        }
    }

    pub fn state(&self) -> SectionState {
        self.state
    }

    pub fn in_references(&self) -> bool {
        self.state == SectionState::References
    }

    /// Feeds one line and returns the zone it belongs to
    pub fn observe(&mut self, line: &str) -> Zone {
        if self.state != SectionState::References {
            if is_reference_header(line) {
                self.state = SectionState::References;
            } else if let Some(title) = section_header(line, self.max_header_words) {
                if title.chars().count() >= 4 && !NEUTRAL_HEADERS.contains(&title.as_str()) {
                    self.state = if EXCLUDED_SECTION.is_match(&title) {
                        SectionState::Excluded
                    } else {
                        SectionState::Main
                    };
                }
            }
        }
        match self.state {
            SectionState::Main => Zone::MainContent,
            SectionState::Excluded | SectionState::References => Zone::ExcludedSections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_headers_are_recognized() {
        assert_eq!(section_header("2. Related Work", 8).as_deref(), Some("RELATED WORK"));
        assert_eq!(section_header("Results: 95%", 8), None);
        assert!(is_excluded_header("1. Introduction", 8));
        assert!(!is_excluded_header("Methods", 8));
    }

    #[test]
    fn excluded_state_is_sticky_until_a_new_header() {
        let mut tracker = SectionTracker::new(8);
        assert_eq!(tracker.observe("Acknowledgements"), Zone::ExcludedSections);
        assert_eq!(tracker.observe("We thank the reviewers."), Zone::ExcludedSections);
        assert_eq!(tracker.observe("TABLE"), Zone::ExcludedSections);
        assert_eq!(tracker.observe("Methods"), Zone::MainContent);
    }

    #[test]
    fn reference_state_is_terminal() {
        let mut tracker = SectionTracker::new(8);
        tracker.observe("REFERENCES");
        assert!(tracker.in_references());
        assert_eq!(tracker.observe("Appendix"), Zone::ExcludedSections);
    }
}
