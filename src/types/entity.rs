use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Anonymization category.
///
/// The declaration order is the conflict-resolution priority:
/// `author_name > contact_info > institution_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    AuthorName,
    ContactInfo,
    InstitutionInfo,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::AuthorName,
        Category::ContactInfo,
        Category::InstitutionInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AuthorName => "author_name",
            Category::ContactInfo => "contact_info",
            Category::InstitutionInfo => "institution_info",
        }
    }

    fn mask_prefix(&self) -> &'static str {
        match self {
            Category::AuthorName => "YAZAR",
            Category::ContactInfo => "ILETISIM",
            Category::InstitutionInfo => "KURUM",
        }
    }

    /// Mask token for the `index`-th (1-based) entity of this category
    pub fn mask_token(&self, index: usize) -> String {
        format!("[{}-{}]", self.mask_prefix(), index)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "author_name" => Ok(Category::AuthorName),
            "contact_info" => Ok(Category::ContactInfo),
            "institution_info" => Ok(Category::InstitutionInfo),
            other => Err(Error::Config(format!("Unknown category: {}", other))),
        }
    }
}

/// Zone a candidate was discovered in, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Header,
    FirstPage,
    MainContent,
}

impl Provenance {
    pub fn is_front_matter(&self) -> bool {
        matches!(self, Provenance::Header | Provenance::FirstPage)
    }
}

/// Ranked entity strings per category, as produced by the detector
pub type CategoryLists = BTreeMap<Category, Vec<String>>;

/// One entry of the replacement map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub text: String,
    pub token: String,
    pub category: Category,
}

/// `entity_text -> mask_token`, built once per document.
///
/// Entries keep their assignment order: categories in priority order,
/// longer strings first within a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementMap {
    entries: Vec<Replacement>,
}

impl ReplacementMap {
    pub(crate) fn from_entries(entries: Vec<Replacement>) -> Self {
        Self { entries }
    }

    pub fn get(&self, text: &str) -> Option<&Replacement> {
        self.entries.iter().find(|r| r.text == text)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Replacement> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn counts(&self) -> BTreeMap<Category, usize> {
        let mut counts: BTreeMap<Category, usize> = Category::ALL.iter().map(|c| (*c, 0)).collect();
        for entry in &self.entries {
            *counts.entry(entry.category).or_insert(0) += 1;
        }
        counts
    }
}

/// Output of cross-category resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntities {
    pub entities: CategoryLists,
    pub replacements: ReplacementMap,
}

impl ResolvedEntities {
    pub fn for_category(&self, category: Category) -> &[String] {
        self.entities.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Count helper shared by the report and the audit summary
pub fn count_lists(lists: &CategoryLists) -> BTreeMap<Category, usize> {
    Category::ALL
        .iter()
        .map(|c| (*c, lists.get(c).map(Vec::len).unwrap_or(0)))
        .collect()
}
