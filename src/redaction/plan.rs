//! Propose-then-apply redaction plans
//!
//! A [`PagePlan`] only ever grows. The first record proposed for a physical
//! region wins; later proposals for the same rectangle key, for a region
//! already covered by a biography record, or for a region mostly overlapping
//! an accepted record, are rejected.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use crate::pdf::{Rect, RectKey};
use crate::types::Category;

/// Share of the smaller rectangle that an overlap must cover to count as the same region
const OVERLAP_RATIO: f64 = 0.5;

/// Why a record was proposed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Entity(Category),
    Biography,
}

impl RecordKind {
    /// Category the record is counted under
    pub fn category(&self) -> Category {
        match self {
            RecordKind::Entity(category) => *category,
            RecordKind::Biography => Category::AuthorName,
        }
    }
}

/// One physical region to mask
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedactionRecord {
    pub page: usize,
    pub rect: Rect,
    pub label: String,
    pub font_size: f64,
    pub color: [f64; 3],
    pub kind: RecordKind,
    /// Layout glyph indices removed from the content stream
    #[serde(skip)]
    pub glyphs: Vec<usize>,
}

impl RedactionRecord {
    pub fn key(&self) -> RectKey {
        self.rect.key()
    }
}

/// Records of one page, with their dedup keys
#[derive(Debug, Clone, Default)]
pub struct PagePlan {
    pub page: usize,
    records: Vec<RedactionRecord>,
    keys: HashSet<RectKey>,
    biography_rects: Vec<Rect>,
}

impl PagePlan {
    pub fn new(page: usize) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    /// Adds `record` unless its region is already claimed; returns whether it was added
    pub fn propose(&mut self, record: RedactionRecord) -> bool {
        if self.is_claimed(&record.rect) {
            return false;
        }
        let key = record.key();
        if record.kind == RecordKind::Biography {
            self.biography_rects.push(record.rect);
        }
        self.keys.insert(key);
        self.records.push(record);
        true
    }

    pub fn is_claimed(&self, rect: &Rect) -> bool {
        self.keys.contains(&rect.key())
            || self.biography_rects.iter().any(|b| b.contains_rect(rect))
            || self.records.iter().any(|r| mostly_overlaps(&r.rect, rect))
    }

    pub fn records(&self) -> &[RedactionRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every glyph removed by this plan
    pub fn glyphs(&self) -> BTreeSet<usize> {
        self.records.iter().flat_map(|r| r.glyphs.iter().copied()).collect()
    }

    pub fn keys(&self) -> BTreeSet<RectKey> {
        self.keys.iter().copied().collect()
    }
}

fn mostly_overlaps(a: &Rect, b: &Rect) -> bool {
    let Some(shared) = a.intersection(b) else { return false };
    let smaller = a.area().min(b.area());
    smaller > 0.0 && shared.area() >= OVERLAP_RATIO * smaller
}

/// Page plans of a whole document
#[derive(Debug, Clone, Default)]
pub struct RedactionPlan {
    pages: BTreeMap<usize, PagePlan>,
}

impl RedactionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_mut(&mut self, page: usize) -> &mut PagePlan {
        self.pages.entry(page).or_insert_with(|| PagePlan::new(page))
    }

    pub fn page(&self, page: usize) -> Option<&PagePlan> {
        self.pages.get(&page)
    }

    pub fn pages(&self) -> impl Iterator<Item = &PagePlan> {
        self.pages.values()
    }

    pub fn records(&self) -> impl Iterator<Item = &RedactionRecord> {
        self.pages.values().flat_map(|p| p.records.iter())
    }

    /// Masked regions per category; biographies count as `author_name`
    pub fn counts(&self) -> BTreeMap<Category, usize> {
        let mut counts: BTreeMap<Category, usize> = Category::ALL.iter().map(|c| (*c, 0)).collect();
        for record in self.records() {
            *counts.entry(record.kind.category()).or_insert(0) += 1;
        }
        counts
    }

    pub fn biography_count(&self) -> usize {
        self.records().filter(|r| r.kind == RecordKind::Biography).count()
    }

    /// Dedup keys of every planned region, for comparing runs
    pub fn region_keys(&self) -> BTreeSet<(usize, RectKey)> {
        self.pages
            .values()
            .flat_map(|p| p.keys.iter().map(move |k| (p.page, *k)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.values().all(PagePlan::is_empty)
    }
}
