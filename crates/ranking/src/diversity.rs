//! Round-robin-by-category selection.
//!
//! Diversity is a soft preference; the requested count is a hard one. Rounds
//! take the r-th best item of every category (best categories first), and any
//! slots still open afterwards are filled in global score order.

use crate::types::{RankedCandidate, sort_ranked};
use model_store::{ArticleId, CategoryId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Picks the final N items so that no single category dominates
#[derive(Debug, Clone, Copy, Default)]
pub struct DiversitySelector {
    /// Stop round-robin after this many rounds; `None` runs until every
    /// category is exhausted
    max_rounds: Option<usize>,
}

impl DiversitySelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of round-robin rounds (default: unbounded)
    pub fn with_max_rounds(mut self, max_rounds: Option<usize>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Select `n_final` items from `ranked`.
    ///
    /// Items whose category is unknown to `category_of` form their own group.
    /// The output is in selection order.
    pub fn select<F>(&self, ranked: &[RankedCandidate], n_final: usize, category_of: F) -> Vec<RankedCandidate>
    where
        F: Fn(ArticleId) -> Option<CategoryId>,
    {
        let mut ordered = ranked.to_vec();
        sort_ranked(&mut ordered);

        if ordered.len() <= n_final {
            return ordered;
        }

        // Groups in order of their best item; each group stays score-sorted
        let mut group_of: HashMap<Option<CategoryId>, usize> = HashMap::new();
        let mut groups: Vec<Vec<RankedCandidate>> = Vec::new();
        for candidate in &ordered {
            let key = category_of(candidate.article_id);
            let slot = *group_of.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(*candidate);
        }

        let mut selected: Vec<RankedCandidate> = Vec::with_capacity(n_final);
        let mut selected_ids: HashSet<ArticleId> = HashSet::with_capacity(n_final);
        let deepest = groups.iter().map(Vec::len).max().unwrap_or(0);
        let rounds = self.max_rounds.map_or(deepest, |max| max.min(deepest));

        'rounds: for round in 0..rounds {
            for group in &groups {
                let Some(candidate) = group.get(round) else {
                    continue;
                };
                if selected_ids.insert(candidate.article_id) {
                    selected.push(*candidate);
                    if selected.len() == n_final {
                        break 'rounds;
                    }
                }
            }
        }

        let from_rounds = selected.len();
        if selected.len() < n_final {
            for candidate in &ordered {
                if selected.len() == n_final {
                    break;
                }
                if selected_ids.insert(candidate.article_id) {
                    selected.push(*candidate);
                }
            }
        }

        debug!(
            categories = groups.len(),
            from_rounds,
            filled = selected.len() - from_rounds,
            "Diversity selection complete"
        );
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(items: &[(ArticleId, f32)]) -> Vec<RankedCandidate> {
        items.iter().map(|&(id, score)| RankedCandidate::new(id, score)).collect()
    }

    /// Category = article_id / 100
    fn category_by_hundreds(article_id: ArticleId) -> Option<CategoryId> {
        Some(article_id / 100)
    }

    fn ids(selected: &[RankedCandidate]) -> Vec<ArticleId> {
        selected.iter().map(|c| c.article_id).collect()
    }

    #[test]
    fn test_short_input_returned_as_is() {
        let candidates = ranked(&[(101, 0.9), (102, 0.8)]);
        let selected = DiversitySelector::new().select(&candidates, 5, category_by_hundreds);
        assert_eq!(ids(&selected), vec![101, 102]);
    }

    #[test]
    fn test_round_robin_spreads_categories() {
        // Category 1 dominates the raw ranking
        let candidates = ranked(&[
            (101, 0.95),
            (102, 0.90),
            (103, 0.85),
            (201, 0.80),
            (104, 0.75),
            (301, 0.50),
            (202, 0.40),
        ]);
        let selected = DiversitySelector::new().select(&candidates, 4, category_by_hundreds);

        // Round 0: best of categories 1, 2, 3; round 1 starts with category 1
        assert_eq!(ids(&selected), vec![101, 201, 301, 102]);
    }

    #[test]
    fn test_exhausted_categories_are_skipped() {
        let candidates = ranked(&[(101, 0.9), (102, 0.8), (103, 0.7), (201, 0.6)]);
        let selected = DiversitySelector::new().select(&candidates, 3, category_by_hundreds);
        assert_eq!(ids(&selected), vec![101, 201, 102]);
    }

    #[test]
    fn test_fill_from_global_order_when_rounds_run_out() {
        let candidates = ranked(&[(101, 0.9), (102, 0.8), (103, 0.7), (201, 0.6), (202, 0.1)]);
        let selected = DiversitySelector::new()
            .with_max_rounds(Some(1))
            .select(&candidates, 4, category_by_hundreds);

        // One round yields 101 and 201; the rest comes from global order
        assert_eq!(ids(&selected), vec![101, 201, 102, 103]);
    }

    #[test]
    fn test_unknown_category_forms_its_own_group() {
        let candidates = ranked(&[(101, 0.9), (102, 0.8), (7, 0.5)]);
        let selected = DiversitySelector::new().select(&candidates, 2, |id| {
            if id < 100 { None } else { Some(id / 100) }
        });
        assert_eq!(ids(&selected), vec![101, 7]);
    }

    #[test]
    fn test_count_is_always_met_and_unique() {
        let candidates = ranked(&[
            (101, 0.9),
            (102, 0.9),
            (201, 0.3),
            (103, 0.2),
            (301, 0.1),
            (104, 0.05),
        ]);
        for n in 1..=6 {
            for max_rounds in [None, Some(0), Some(1), Some(2)] {
                let selected = DiversitySelector::new()
                    .with_max_rounds(max_rounds)
                    .select(&candidates, n, category_by_hundreds);
                let unique: HashSet<ArticleId> = selected.iter().map(|c| c.article_id).collect();
                assert_eq!(selected.len(), n);
                assert_eq!(unique.len(), n);
            }
        }
    }
}
