//! `institution_info` extractors: departments, universities, labs and addresses

use lazy_static::lazy_static;
use regex::Regex;

use super::candidates::CandidateTable;
use super::patterns::context_window;
use crate::types::Provenance;

lazy_static! {
    static ref INSTITUTIONS: Vec<Regex> = [
        r"(?:Department|Dept|School|Faculty|Institute)[ \t]+of[ \t]+[A-Z][^,;\n\d]{5,50}",
        r"(?:[A-Z][A-Za-z&\-]*[ \t]+){1,8}(?:University|College|Institute|School)\b",
        r"(?:University|College|Institute|School)[ \t]+of[ \t]+[A-Z][A-Za-z]*(?:[ \t]+[A-Z][A-Za-z]*){0,4}",
        r"(?:[A-Z][A-Za-z&\-]*[ \t]+){1,5}(?:Laboratory|Lab|Center|Centre|Foundation)\b",
        r"\d{1,5}[ \t]+[A-Z][A-Za-z]*(?:[ \t]+[A-Z][A-Za-z]*)*[ \t]+(?:Street|St\.|Avenue|Ave\.|Road|Rd\.|Boulevard|Blvd\.|Caddesi|Cad\.|Sokak|Sok\.)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
    static ref AFFILIATION_CONTEXT: Regex =
        Regex::new(r"(?i)affiliation|address|department|kurum|adres").unwrap();

    static ref HEADER_ADDRESSES: Vec<Regex> = [
        r"([A-Z][A-Za-z&\- ]+(?:University|Institute|College)),[ \t]*([A-Z][A-Za-z \-]+),[ \t]*([A-Z][A-Za-z \-]+)",
        r"(Department[ \t]+of[ \t]+[A-Z][A-Za-z &]+),[ \t]*([A-Z][A-Za-z &\-]+(?:University|Institute|College))",
        r"((?:School|Faculty)[ \t]+of[ \t]+[A-Z][A-Za-z &]+),[ \t]*([A-Z][A-Za-z &\-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
    static ref SPECIAL_INSTITUTIONS: Regex = Regex::new(
        r"Indian Institute of Information Technology|Indian Institute of Technology|All India Institute of Medical Sciences"
    )
    .unwrap();
    static ref POSTAL_LINE: Regex =
        Regex::new(r"(?m)^[A-Za-z, \t]+[ \t]+\d{5,6}(?:,[ \t]*[A-Za-z]+)?").unwrap();
}

const INSTITUTION_WORDS: &[&str] = &[
    "university", "institute", "department", "faculty", "school", "college", "laboratory", "center",
    "centre",
];

fn mentions_institution(text: &str) -> bool {
    let lower = text.to_lowercase();
    INSTITUTION_WORDS.iter().any(|w| lower.contains(w))
}

/// Pattern signal over one chunk of any zone
pub(super) fn extract(text: &str, provenance: Provenance, table: &mut CandidateTable) {
    for pattern in INSTITUTIONS.iter() {
        for m in pattern.find_iter(text) {
            let found = m.as_str().trim();
            if found.chars().count() > 100 {
                continue;
            }
            let mut score = 1.0;
            if mentions_institution(found) {
                score += 0.5;
            }
            if AFFILIATION_CONTEXT.is_match(context_window(text, found, 100)) {
                score += 0.5;
            }
            table.offer(found, provenance, score);
        }
    }
}

/// Front-matter extraction of affiliation lines and postal addresses
pub(super) fn extract_header(text: &str, provenance: Provenance, table: &mut CandidateTable) {
    for pattern in HEADER_ADDRESSES.iter() {
        for caps in pattern.captures_iter(text) {
            table.offer(&caps[0], provenance, 4.0);
            for group in caps.iter().skip(1).flatten() {
                let part = group.as_str();
                let score = if mentions_institution(part) { 4.0 } else { 3.0 };
                table.offer(part, provenance, score);
            }
        }
    }

    for m in SPECIAL_INSTITUTIONS.find_iter(text) {
        table.offer(m.as_str(), provenance, 4.5);
        let line_start = text[..m.start()].rfind('\n').map_or(0, |i| i + 1);
        let line_end = text[m.end()..].find('\n').map_or(text.len(), |i| m.end() + i);
        table.offer(&text[line_start..line_end], provenance, 4.5);
    }

    for m in POSTAL_LINE.find_iter(text) {
        table.offer(m.as_str(), provenance, 3.8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn departments_score_with_context() {
        let mut table = CandidateTable::new();
        extract("Affiliation: Department of Physics, Kocaeli", Provenance::MainContent, &mut table);
        assert_eq!(table.score("Department of Physics", Provenance::MainContent), Some(2.0));
    }

    #[test]
    fn header_addresses_split_into_parts() {
        let mut table = CandidateTable::new();
        extract_header("Kocaeli University, Izmit, Turkey", Provenance::Header, &mut table);
        assert_eq!(table.score("Kocaeli University, Izmit, Turkey", Provenance::Header), Some(4.0));
        assert_eq!(table.score("Kocaeli University", Provenance::Header), Some(4.0));
        assert_eq!(table.score("Izmit", Provenance::Header), Some(3.0));
    }

    #[test]
    fn special_institutions_take_their_line() {
        let mut table = CandidateTable::new();
        extract_header(
            "Jane Doe\nIndian Institute of Technology Delhi\nIndia",
            Provenance::FirstPage,
            &mut table,
        );
        assert_eq!(
            table.score("Indian Institute of Technology Delhi", Provenance::FirstPage),
            Some(4.5)
        );
    }

    #[test]
    fn postal_lines() {
        let mut table = CandidateTable::new();
        extract_header("Vadodara, Gujarat 390001, India", Provenance::Header, &mut table);
        assert_eq!(table.score("Vadodara, Gujarat 390001, India", Provenance::Header), Some(3.8));
    }
}
