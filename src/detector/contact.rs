//! `contact_info` extractors: e-mail addresses, phone numbers and ORCID iDs

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::candidates::CandidateTable;
use super::patterns::{context_window, EMAIL};
use crate::types::Provenance;

lazy_static! {
    static ref PHONES: Vec<Regex> = [
        // Number after an explicit prefix; only the number is kept
        r"(?i)(?:Tel|Phone|Telephone|Mobile|Cell|Fax)(?:\.|:|\s)+(\+?\d[\d\s().\-]{7,}\d)",
        r"(\+\d{1,3}[\s.\-]?\(?\d{1,4}\)?[\s.\-]?\d{3,4}[\s.\-]?\d{2,4}(?:[\s.\-]?\d{2,4})?)",
        r"\b(\(\d{3}\)\s?\d{3}[\s.\-]?\d{4})\b",
        r"\b(\d{3}[\s.\-]\d{3}[\s.\-]\d{4})\b",
        r"\b(0\d{3}[\s.\-]?\d{3}[\s.\-]?\d{2}[\s.\-]?\d{2})\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
    static ref PHONE_INDICATOR: Regex =
        Regex::new(r"(?i)phone|tel|telefon|iletişim|contact|call|telephone|number|numara").unwrap();
    static ref PHONE_PREFIX: Regex = Regex::new(r"(?i)(?:phone|tel)(?:ephone)?(?:\.|:|\s)+").unwrap();
    static ref ORCID: Regex =
        Regex::new(r"(?i)ORCID(?::|\s)+(?:https?://orcid\.org/)?(\d{4}-\d{4}-\d{4}-\d{3}[\dX])").unwrap();
}

/// Domains typical of scholarly correspondence addresses
const ACADEMIC_DOMAINS: &[&str] = &[".edu", ".ac.", "@university", "@faculty", "@dtu", "@ieee", "@gmail"];

fn phone_score(text: &str, number: &str) -> f64 {
    let mut score = 1.0;
    let near = context_window(text, number, 50);
    if PHONE_INDICATOR.is_match(near) {
        score += 0.5;
    }
    if PHONE_PREFIX.is_match(context_window(text, number, 100)) {
        score += 1.0;
    }
    if number.contains('(') && number.contains(')') {
        score += 0.5;
    }
    score
}

/// Pattern signal over one chunk of any zone
pub(super) fn extract(text: &str, provenance: Provenance, table: &mut CandidateTable) {
    for pattern in PHONES.iter() {
        for caps in pattern.captures_iter(text) {
            let Some(number) = caps.get(1) else { continue };
            let number = number.as_str().trim();
            let digits = number.chars().filter(|c| c.is_ascii_digit()).count();
            if digits < 7 {
                continue;
            }
            let score = phone_score(text, number);
            debug!("Phone candidate '{}' scored {}", number, score);
            table.offer(number, provenance, score);
        }
    }

    for m in EMAIL.find_iter(text) {
        table.offer(m.as_str(), provenance, 2.0);
    }

    for caps in ORCID.captures_iter(text) {
        table.offer(&format!("ORCID: {}", &caps[1]), provenance, 2.0);
    }
}

/// Front-matter e-mail extraction; academic domains score higher
pub(super) fn extract_header(text: &str, provenance: Provenance, table: &mut CandidateTable) {
    for m in EMAIL.find_iter(text) {
        let email = m.as_str();
        let lower = email.to_lowercase();
        let score = if ACADEMIC_DOMAINS.iter().any(|d| lower.contains(d)) { 3.5 } else { 3.0 };
        table.offer(email, provenance, score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_phone_keeps_only_the_number() {
        let mut table = CandidateTable::new();
        extract("Tel: +90 262 303 1000", Provenance::MainContent, &mut table);
        let score = table.score("+90 262 303 1000", Provenance::MainContent).unwrap();
        assert_eq!(score, 2.5);
        assert!(table.keys().all(|k| !k.text.starts_with("Tel")));
    }

    #[test]
    fn emails_and_orcid() {
        let mut table = CandidateTable::new();
        extract(
            "Mail jane@kocaeli.edu.tr, ORCID: 0000-0002-1825-0097",
            Provenance::MainContent,
            &mut table,
        );
        assert_eq!(table.score("jane@kocaeli.edu.tr", Provenance::MainContent), Some(2.0));
        assert_eq!(
            table.score("ORCID: 0000-0002-1825-0097", Provenance::MainContent),
            Some(2.0)
        );
    }

    #[test]
    fn academic_domains_score_higher_in_front_matter() {
        let mut table = CandidateTable::new();
        extract_header("a@example.com b@cs.ox.ac.uk", Provenance::Header, &mut table);
        assert_eq!(table.score("a@example.com", Provenance::Header), Some(3.0));
        assert_eq!(table.score("b@cs.ox.ac.uk", Provenance::Header), Some(3.5));
    }
}
