use std::collections::HashMap;

use crate::types::Provenance;

/// Candidate identity: the same text found in two zones is two candidates
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateKey {
    pub text: String,
    pub provenance: Provenance,
}

/// Scored candidates of a single category.
///
/// Signals merge with `max`; context boosts add. Scores never decrease.
#[derive(Debug, Default)]
pub struct CandidateTable {
    scores: HashMap<CandidateKey, f64>,
    /// Insertion order, used to break score ties deterministically
    order: Vec<CandidateKey>,
}

impl CandidateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a signal; the stored score becomes `max(existing, score)`
    pub fn offer(&mut self, text: &str, provenance: Provenance, score: f64) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let key = CandidateKey {
            text: text.to_string(),
            provenance,
        };
        match self.scores.get_mut(&key) {
            Some(existing) => *existing = existing.max(score),
            None => {
                self.order.push(key.clone());
                self.scores.insert(key, score);
            }
        }
    }

    /// Adds `amount` to every candidate accepted by `filter`; returns how many
    pub fn boost_where<F>(&mut self, amount: f64, mut filter: F) -> usize
    where
        F: FnMut(&CandidateKey) -> bool,
    {
        if amount <= 0.0 {
            return 0;
        }
        let mut boosted = 0;
        for key in &self.order {
            if filter(key) {
                if let Some(score) = self.scores.get_mut(key) {
                    *score += amount;
                    boosted += 1;
                }
            }
        }
        boosted
    }

    pub fn score(&self, text: &str, provenance: Provenance) -> Option<f64> {
        self.scores
            .get(&CandidateKey {
                text: text.to_string(),
                provenance,
            })
            .copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CandidateKey> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Accepted candidate texts, highest score first.
    ///
    /// A text surviving under several provenances is listed once, at the
    /// position of its best-scoring key.
    pub fn ranked<F>(&self, accept: F) -> Vec<String>
    where
        F: Fn(&CandidateKey, f64) -> bool,
    {
        let mut accepted: Vec<(usize, &CandidateKey, f64)> = self
            .order
            .iter()
            .enumerate()
            .filter_map(|(i, key)| {
                let score = self.scores.get(key).copied()?;
                accept(key, score).then_some((i, key, score))
            })
            .collect();
        accepted.sort_by(|a, b| b.2.total_cmp(&a.2).then(a.0.cmp(&b.0)));

        let mut texts: Vec<String> = Vec::with_capacity(accepted.len());
        for (_, key, _) in accepted {
            if !texts.contains(&key.text) {
                texts.push(key.text.clone());
            }
        }
        texts
    }
}
