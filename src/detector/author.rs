//! `author_name` extractors

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::candidates::CandidateTable;
use super::patterns::{
    is_valid_person_name, window_around, AFFILIATION_LINE, EMAIL_LINE, INITIAL_NAME, NAME_LINE,
    SINGLE_NAME_LINE,
};
use crate::types::Provenance;

lazy_static! {
    static ref ER_NAME: Regex =
        Regex::new(r"Er\.\s+([A-Z][a-zA-Z\-]+(?:\s+[A-Z][a-zA-Z\-]+)+)").unwrap();
    static ref NAME_THEN_EMAIL: Regex = Regex::new(
        r"([A-Z][a-zA-Z\-]+(?:\s+[A-Z][a-zA-Z\-]+)+)[\s,]*[\(\{]?([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})[\)\}]?"
    )
    .unwrap();
    static ref INITIAL_THEN_EMAIL: Regex = Regex::new(
        r"([A-Z]\.\s+[A-Z][a-zA-Z\-]+)\s*([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})"
    )
    .unwrap();
    static ref TITLED_NAME_LINE: Regex = Regex::new(
        r"^(?:Dr\.?|Prof\.?|Professor|Assoc\.? Prof\.?|Asst\.? Prof\.?|Er\.)\s+[A-Z][a-zA-Z\-]+(?:\s+[A-Z][a-zA-Z\-]+)+$"
    )
    .unwrap();
    static ref CONTACT_NAME: Regex = Regex::new(
        r"(?i:Contact|Corresponding Author|For correspondence):?\s*([A-Z][a-zA-Z\-]+(?:\s+[A-Z][a-zA-Z\-]+)+)"
    )
    .unwrap();
    static ref IEEE_NAME: Regex = Regex::new(
        r"([A-Z][a-zA-Z\-]+(?:\s+[A-Z][a-zA-Z\-]+)+),\s+(?:Member|Senior Member|Fellow|Student Member|Associate Member),\s+IEEE"
    )
    .unwrap();

    // Front-matter patterns never join words across a line break
    static ref HEADER_IEEE: Vec<Regex> = [
        r"([A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3})[ \t]*,[ \t]*(?:Member|Senior Member|Fellow|Student Member|Graduate Student Member)[ \t]*,[ \t]*IEEE",
        r"([A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3}),[ \t]*([A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3}),[ \t]*(?:Member|Senior Member|Fellow|Student Member|Graduate Student Member),[ \t]*IEEE",
        r"([A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3})\r?\n[ \t]*(?:Member|Senior Member|Fellow|Student Member|Graduate Student Member),[ \t]*IEEE",
        r"([A-Z][a-zÀ-ÿ]+(?:[ -][A-Z][a-zÀ-ÿ]+){1,3}),[ \t]*([A-Z][a-zÀ-ÿ]+(?:[ -][A-Z][a-zÀ-ÿ]+){1,3})",
        r"([A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3}),[ \t]*([A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3}),[ \t]*([A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3})",
        r"([A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3})[ \t]+(?:AND|Ve|and)[ \t]+([A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
    static ref PARENTHESIZED: Regex = Regex::new(r"\([^)\n]+\)").unwrap();
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").unwrap();

    static ref CAPS_BLOCKS: Vec<Regex> = [
        r"\b[A-Z]{2,}(?:[ \t]+[A-Z]{2,})+\b",
        r"[A-Z]{2,}(?:[ \t]+[A-Z]{2,})?,[ \t]*(?:AND[ \t]+)?[A-Z]{2,}(?:[ \t]+[A-Z]{2,})?",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
    static ref CAPS_LINES: Vec<Regex> = [
        r"(?m)^([A-Z]{2,}(?:[ \t]+[A-Z]{2,})+)[ \t,]*$",
        r"(?m)^([A-Z]{2,}(?:[ \t]+[A-Z]{2,})+),[ \t]*(?:AND|And|and|VE|Ve|ve)?[ \t]*([A-Z]{2,}(?:[ \t]+[A-Z]{2,})+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();

    static ref NAME_AFTER_TITLE: Regex = Regex::new(
        r"([A-Z][A-Za-zÀ-ÿ0-9 \t:\-]{20,150}?)\r?\n([A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3})"
    )
    .unwrap();
    static ref ACADEMIC_TITLED: Vec<Regex> = [
        r"((?:Dr|Prof|Asst|Assoc|Professor|Ph\.D)\.?[ \t]+[A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3})",
        r"([A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3}),[ \t]*(?:Ph\.D|M\.D|B\.Sc|M\.Sc|M\.A|B\.A)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
    static ref CORRESPONDING: Vec<Regex> = [
        r"(?:Corresponding|Contact)[ \t]+[Aa]uthors?[: \t]+([A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3})",
        r"(?:Corresponding|Contact)[ \t]+[Aa]uthors?[: \t]+[^,\n]+,[ \t]*([A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3})",
        r"([A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3})(?:[ \t]+\([^)\n]+\))?(?:[ \t]*,[ \t]*|[ \t]+and[ \t]+|[ \t]*;[ \t]*)([A-Z][a-zÀ-ÿ]+(?:[ \t]+[A-Z][a-zÀ-ÿ]+){1,3})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();

    /// Phrases whose neighbourhood boosts every author candidate inside it
    static ref CONTEXT_PHRASES: Vec<Regex> = [
        r"(?i)corresponding author",
        r"(?i)authors?:?",
        r"(?i)prepared by",
        r"(?i)written by",
        r"(?i)submitted by",
        r"(?i)affiliation",
        r"(?i)department of",
        r"(?i)faculty of",
        r"(?i)university of",
        r"(?i)institute of",
        r"(?i)contact:?",
        r"(?i)e-?mail:?",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
}

/// Upper-case words that open document sections rather than name people
const CAPS_STOP_WORDS: &[&str] = &[
    "TABLE", "FIGURE", "IEEE", "ABSTRACT", "KEYWORDS", "INDEX", "TERMS", "INTRODUCTION",
    "REFERENCES", "CONCLUSION", "CONCLUSIONS", "RESULTS", "METHODS", "DISCUSSION", "APPENDIX",
    "ACKNOWLEDGEMENT", "ACKNOWLEDGEMENTS", "JOURNAL", "VOLUME", "RESEARCH", "ARTICLE",
];

/// Strongest phrases; these boost by two points instead of one
const STRONG_PHRASES: &[&str] = &["corresponding author", "author:", "authors:"];

fn offer_name(table: &mut CandidateTable, name: &str, provenance: Provenance, score: f64) -> bool {
    let name = name.trim();
    if is_valid_person_name(name) {
        table.offer(name, provenance, score);
        true
    } else {
        false
    }
}

/// Pattern signal over one chunk of any zone
pub(super) fn extract(text: &str, provenance: Provenance, table: &mut CandidateTable) {
    let lines: Vec<&str> = text.split('\n').collect();
    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        let Some(next) = lines.get(i + 1) else { break };
        let next = next.trim();

        if AFFILIATION_LINE.is_match(next)
            && (SINGLE_NAME_LINE.is_match(line) || NAME_LINE.is_match(line) || INITIAL_NAME.is_match(line))
            && offer_name(table, line, provenance, 3.0)
        {
            debug!("Line-based author before affiliation: {}", line);
        }

        if (NAME_LINE.is_match(line) || INITIAL_NAME.is_match(line) || TITLED_NAME_LINE.is_match(line))
            && EMAIL_LINE.is_match(next)
            && offer_name(table, line, provenance, 4.0)
        {
            debug!("Line-based author with e-mail: {}", line);
        }
    }

    for caps in ER_NAME.captures_iter(text) {
        let full = format!("Er. {}", caps[1].trim());
        offer_name(table, &full, provenance, 3.0);
    }
    for caps in NAME_THEN_EMAIL.captures_iter(text) {
        offer_name(table, &caps[1], provenance, 2.0);
    }
    for caps in INITIAL_THEN_EMAIL.captures_iter(text) {
        offer_name(table, &caps[1], provenance, 3.0);
    }
    for caps in CONTACT_NAME.captures_iter(text) {
        offer_name(table, &caps[1], provenance, 2.0);
    }
    for caps in IEEE_NAME.captures_iter(text) {
        offer_name(table, &caps[1], provenance, 2.5);
    }
}

fn caps_block_allowed(block: &str) -> bool {
    block.chars().count() > 5
        && block
            .split_whitespace()
            .map(|w| w.trim_matches(','))
            .all(|w| !CAPS_STOP_WORDS.contains(&w))
}

/// Front-matter extraction for the header and first-page zones
pub(super) fn extract_header(text: &str, provenance: Provenance, table: &mut CandidateTable) {
    let without_parens = PARENTHESIZED.replace_all(text, " PARENMARK ");
    let cleaned = HORIZONTAL_SPACE.replace_all(&without_parens, " ");

    for search_text in [cleaned.as_ref(), text] {
        for pattern in HEADER_IEEE.iter() {
            for caps in pattern.captures_iter(search_text) {
                let full = caps[0].trim();
                let mut any_valid = false;
                for group in caps.iter().skip(1).flatten() {
                    any_valid |= offer_name(table, group.as_str(), provenance, 4.0);
                }
                if any_valid && !full.is_empty() {
                    let score = if full.contains("IEEE") || full.matches(',').count() > 1 { 4.5 } else { 4.0 };
                    table.offer(full, provenance, score);
                }
            }
        }
    }

    for pattern in CAPS_BLOCKS.iter() {
        for m in pattern.find_iter(text) {
            let block = m.as_str().trim();
            if caps_block_allowed(block) {
                table.offer(block, provenance, 4.2);
            }
        }
    }
    for pattern in CAPS_LINES.iter() {
        for caps in pattern.captures_iter(text) {
            for group in caps.iter().skip(1).flatten() {
                let name = group.as_str().trim();
                if caps_block_allowed(name) {
                    table.offer(name, provenance, 4.5);
                }
            }
        }
    }

    for caps in NAME_AFTER_TITLE.captures_iter(text) {
        if caps[1].trim().chars().count() > 20 {
            offer_name(table, &caps[2], provenance, 3.5);
        }
    }
    for pattern in ACADEMIC_TITLED.iter() {
        for caps in pattern.captures_iter(text) {
            offer_name(table, &caps[1], provenance, 3.8);
        }
    }
    for pattern in CORRESPONDING.iter() {
        for caps in pattern.captures_iter(text) {
            for group in caps.iter().skip(1).flatten() {
                offer_name(table, group.as_str(), provenance, 3.9);
            }
        }
    }
}

/// Boosts candidates lying near author-context phrases.
///
/// Every phrase occurrence boosts every candidate (of any zone) whose text
/// falls inside the phrase's window.
pub(super) fn boost_author_contexts(text: &str, window: usize, table: &mut CandidateTable) {
    for phrase in CONTEXT_PHRASES.iter() {
        for m in phrase.find_iter(text) {
            let context = window_around(text, m.start(), m.end(), window);
            let amount = if STRONG_PHRASES.contains(&m.as_str().to_lowercase().as_str()) {
                2.0
            } else {
                1.0
            };
            let boosted = table.boost_where(amount, |key| context.contains(key.text.as_str()));
            if boosted > 0 {
                debug!("Boosted {} author candidates near '{}'", boosted, m.as_str());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titled_name_above_email_scores_highest() {
        let mut table = CandidateTable::new();
        extract("Dr. Jane Smith\njane.smith@university.edu", Provenance::MainContent, &mut table);
        assert_eq!(table.score("Dr. Jane Smith", Provenance::MainContent), Some(4.0));
        assert_eq!(table.score("Jane Smith", Provenance::MainContent), Some(2.0));
    }

    #[test]
    fn ieee_lines_capture_name_and_line() {
        let mut table = CandidateTable::new();
        extract_header("John Smith, Member, IEEE", Provenance::Header, &mut table);
        assert_eq!(table.score("John Smith", Provenance::Header), Some(4.0));
        assert_eq!(table.score("John Smith, Member, IEEE", Provenance::Header), Some(4.5));
    }

    #[test]
    fn caps_blocks_skip_section_words() {
        let mut table = CandidateTable::new();
        extract_header("MAJITHIA TEJAS VINODBHAI\nINDEX TERMS", Provenance::FirstPage, &mut table);
        assert_eq!(table.score("MAJITHIA TEJAS VINODBHAI", Provenance::FirstPage), Some(4.5));
        assert!(table.score("INDEX TERMS", Provenance::FirstPage).is_none());
    }

    #[test]
    fn corresponding_author_phrase_boosts_by_two() {
        let mut table = CandidateTable::new();
        table.offer("Jane Smith", Provenance::MainContent, 1.0);
        boost_author_contexts("Corresponding author Jane Smith", 200, &mut table);
        // "corresponding author" gives 2, the bare "author" inside it gives 1
        assert_eq!(table.score("Jane Smith", Provenance::MainContent), Some(4.0));
    }
}
