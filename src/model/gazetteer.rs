//! Built-in lexicon-driven recognizer
//!
//! Persons are capitalized word runs containing a known given name; organizations
//! are runs ending in an institutional head noun; places come from a fixed
//! list. A lexicon file can extend every list.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{NerLabel, NerModel, NerSpan};
use crate::error::{DetectionError, Error, Result};

lazy_static! {
    static ref CAPITALIZED_RUN: Regex =
        Regex::new(r"\p{Lu}[\p{L}'-]*\.?(?:[ \t]+\p{Lu}[\p{L}'-]*\.?)*").unwrap();
    static ref WORD: Regex = Regex::new(r"\S+").unwrap();
    static ref ORG_RUN: Regex = Regex::new(
        r"(?:\p{Lu}[\p{L}&.-]*[ \t]+){0,4}(University|Institute|College|Laboratory|Corporation|Company|Foundation|Hospital|Academy|Center|Centre|School|Department|Faculty)(?:[ \t]+(?:of|for)(?:[ \t]+(?:the[ \t]+)?\p{Lu}[\p{L}-]*)+)?"
    )
    .unwrap();
}

const GIVEN_NAMES: &[&str] = &[
    "Aaron", "Adam", "Ahmet", "Aisha", "Alan", "Alice", "Ali", "Amit", "Amy", "Ana", "Andrea",
    "Andrew", "Anil", "Anjali", "Anna", "Anne", "Arjun", "Ayse", "Ayşe", "Barbara", "Ben",
    "Burak", "Can", "Carlos", "Caroline", "Cem", "Charles", "Chen", "Christopher", "Claire",
    "Daniel", "David", "Deepak", "Deniz", "Divya", "Ece", "Elena", "Elif", "Elizabeth", "Emily",
    "Emma", "Emre", "Eric", "Fatma", "Fatih", "Francesco", "George", "Hakan", "Hans", "Hasan",
    "Hiroshi", "Hüseyin", "Ibrahim", "Ivan", "James", "Jane", "Jennifer", "Jing", "John",
    "Jose", "Juan", "Julia", "Karen", "Kemal", "Kevin", "Laura", "Linda", "Lisa",
    "Lucas", "Maria", "Mark", "Mary", "Mehmet", "Michael", "Min", "Mohammed", "Murat",
    "Mustafa", "Nancy", "Neha", "Nikhil", "Olga", "Omar", "Oscar", "Paul", "Peter", "Pooja",
    "Priya", "Rahul", "Rajesh", "Richard", "Robert", "Rohan", "Sanjay", "Sarah", "Selin",
    "Serkan", "Sofia", "Sophie", "Stefan", "Steven", "Sunil", "Susan", "Thomas", "Vikram",
    "Wei", "William", "Xin", "Yusuf", "Zeynep",
];

const PLACES: &[&str] = &[
    "Ankara", "Australia", "Beijing", "Berlin", "Boston", "Brazil", "Canada", "China",
    "Delhi", "France", "Germany", "India", "Istanbul", "Italy", "Izmir", "Japan", "Kocaeli",
    "London", "Madrid", "Mumbai", "New Delhi", "New York", "Paris", "Russia", "Shanghai",
    "Spain", "Tokyo", "Turkey", "Türkiye", "United Kingdom", "United States", "USA",
];

/// Word lists extending the built-in gazetteer, loaded from JSON or YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    pub given_names: Vec<String>,
    pub organizations: Vec<String>,
    pub places: Vec<String>,
}

impl Lexicon {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&content)
            .or_else(|_| serde_yaml::from_str(&content))
            .map_err(|e| Error::Config(format!("Lexicon parsing error: {}", e)))
    }
}

pub struct GazetteerModel {
    given_names: HashSet<String>,
    phrases: Option<Regex>,
    organizations: HashSet<String>,
}

impl GazetteerModel {
    pub fn new(lexicon: Lexicon) -> Self {
        let given_names = GIVEN_NAMES
            .iter()
            .map(|s| s.to_string())
            .chain(lexicon.given_names)
            .collect();
        let organizations: HashSet<String> = lexicon.organizations.into_iter().collect();
        let mut phrases: Vec<String> = PLACES
            .iter()
            .map(|s| s.to_string())
            .chain(lexicon.places)
            .chain(organizations.iter().cloned())
            .collect();
        // Longest first so alternation prefers "New Delhi" over "Delhi"
        phrases.sort_by(|a, b| b.len().cmp(&a.len()));
        let pattern = phrases
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        let phrases = Regex::new(&format!(r"\b(?:{})\b", pattern)).ok();
        Self {
            given_names,
            phrases,
            organizations,
        }
    }
}

impl Default for GazetteerModel {
    fn default() -> Self {
        Self::new(Lexicon::default())
    }
}

impl NerModel for GazetteerModel {
    fn name(&self) -> &str {
        "gazetteer"
    }

    fn recognize(&self, text: &str) -> std::result::Result<Vec<NerSpan>, DetectionError> {
        let mut spans = Vec::new();

        for run in CAPITALIZED_RUN.find_iter(text) {
            let words: Vec<_> = WORD.find_iter(run.as_str()).collect();
            let Some(first) = words
                .iter()
                .position(|w| self.given_names.contains(w.as_str()))
            else {
                continue;
            };
            // A given name followed by at most two further capitalized words
            let last = (first + 2).min(words.len() - 1);
            if last == first {
                continue;
            }
            let start = words[first].start();
            let end = words[last].end();
            spans.push(NerSpan {
                text: run.as_str()[start..end].to_string(),
                label: NerLabel::Person,
                start: run.start() + start,
            });
        }

        for caps in ORG_RUN.captures_iter(text) {
            let (Some(whole), Some(head)) = (caps.get(0), caps.get(1)) else { continue };
            let label = match head.as_str() {
                "Department" | "Faculty" | "Laboratory" => NerLabel::Fac,
                _ => NerLabel::Org,
            };
            spans.push(NerSpan {
                text: whole.as_str().trim().to_string(),
                label,
                start: whole.start(),
            });
        }

        if let Some(phrases) = &self.phrases {
            for m in phrases.find_iter(text) {
                let label = if self.organizations.contains(m.as_str()) {
                    NerLabel::Org
                } else {
                    NerLabel::Gpe
                };
                spans.push(NerSpan {
                    text: m.as_str().to_string(),
                    label,
                    start: m.start(),
                });
            }
        }

        spans.sort_by_key(|s| s.start);
        debug!("Gazetteer recognized {} spans", spans.len());
        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persons_need_a_known_given_name() {
        let model = GazetteerModel::default();
        let spans = model.recognize("Jane Smith wrote Deep Learning notes.").unwrap();
        let persons: Vec<_> = spans.iter().filter(|s| s.label == NerLabel::Person).collect();
        assert_eq!(persons.len(), 1);
        assert_eq!(persons[0].text, "Jane Smith");
    }

    #[test]
    fn organizations_and_places_are_labelled() {
        let model = GazetteerModel::default();
        let spans = model
            .recognize("Department of Physics, Kocaeli University, Turkey")
            .unwrap();
        assert!(spans.iter().any(|s| s.label == NerLabel::Fac && s.text == "Department of Physics"));
        assert!(spans.iter().any(|s| s.label == NerLabel::Org && s.text == "Kocaeli University"));
        assert!(spans.iter().any(|s| s.label == NerLabel::Gpe && s.text == "Turkey"));
    }

    #[test]
    fn lexicon_extends_given_names() {
        let lexicon = Lexicon {
            given_names: vec!["Zorro".into()],
            ..Default::default()
        };
        let model = GazetteerModel::new(lexicon);
        let spans = model.recognize("Zorro Vega").unwrap();
        assert_eq!(spans[0].label, NerLabel::Person);
    }
}
