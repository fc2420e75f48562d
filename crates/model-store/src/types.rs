//! Core domain types for the news recommendation model.
//!
//! Everything here is produced offline and read-only at serve time.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for an article
pub type ArticleId = u32;

/// Article category (used for diversity grouping and the content boost)
pub type CategoryId = u32;

/// Article publisher
pub type PublisherId = u32;

/// Unix-epoch timestamp in milliseconds
pub type TimestampMs = i64;

/// Milliseconds in one day, used for every age computation
pub const MS_PER_DAY: f64 = 86_400_000.0;

// =============================================================================
// Interactions
// =============================================================================

/// One user-article engagement.
///
/// `weight` encodes engagement strength: a click count for the raw matrix,
/// a quality score in (0, 1] for the weighted matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub article_id: ArticleId,
    pub weight: f32,
}

/// Which interaction matrix variant backs the scorers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatrixKind {
    RawCount,
    QualityWeighted,
}

// =============================================================================
// Articles
// =============================================================================

/// Article metadata used for diversity grouping, display and age computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMeta {
    pub article_id: ArticleId,
    pub category_id: CategoryId,
    pub publisher_id: PublisherId,
    pub words_count: u32,
    pub created_at_ts: TimestampMs,
}

/// Fractional days from `created_at_ts` to `now_ts`.
///
/// Negative when `created_at_ts` is after `now_ts`. The millisecond difference
/// saturates at the `i64` bounds.
pub fn age_in_days(created_at_ts: TimestampMs, now_ts: TimestampMs) -> f64 {
    now_ts.saturating_sub(created_at_ts) as f64 / MS_PER_DAY
}

/// Offline popularity score for one article, in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopularityEntry {
    pub article_id: ArticleId,
    pub base_score: f32,
}

// =============================================================================
// User profiles
// =============================================================================

/// A user's reading history, built once per model load.
///
/// `history` keeps the offline order (oldest first). `weights` holds the
/// interaction strength per article where the active matrix knows one.
#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub user_id: UserId,
    pub history: Vec<ArticleId>,
    pub weights: HashMap<ArticleId, f32>,
    read: HashSet<ArticleId>,
}

impl UserProfile {
    pub fn new(user_id: UserId, history: Vec<ArticleId>, weights: HashMap<ArticleId, f32>) -> Self {
        let read = history.iter().copied().collect();
        Self {
            user_id,
            history,
            weights,
            read,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// O(1) membership test against the history
    pub fn has_read(&self, article_id: ArticleId) -> bool {
        self.read.contains(&article_id)
    }

    /// The set of read articles, for exclusion during scoring
    pub fn read_set(&self) -> &HashSet<ArticleId> {
        &self.read
    }

    /// Interaction weight for a history item, uniform 1.0 when unknown
    pub fn weight_of(&self, article_id: ArticleId) -> f32 {
        self.weights.get(&article_id).copied().unwrap_or(1.0)
    }

    /// Category frequency table: category -> count / history length.
    ///
    /// History items with unknown category still count toward the length.
    pub fn category_frequencies(
        &self,
        category_of: impl Fn(ArticleId) -> Option<CategoryId>,
    ) -> HashMap<CategoryId, f32> {
        if self.history.is_empty() {
            return HashMap::new();
        }

        let mut counts: HashMap<CategoryId, u32> = HashMap::new();
        for &article_id in &self.history {
            if let Some(category) = category_of(article_id) {
                *counts.entry(category).or_insert(0) += 1;
            }
        }

        let total = self.history.len() as f32;
        counts
            .into_iter()
            .map(|(category, count)| (category, count as f32 / total))
            .collect()
    }
}
