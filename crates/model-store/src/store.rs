//! The read-only in-memory model.
//!
//! A `ModelStore` is assembled once (see [`crate::ModelStoreBuilder`] and
//! [`ModelStore::load`]) and never mutated afterwards. Hosts share it as
//! `Arc<ModelStore>` and replace the whole `Arc` on reload.

use crate::matrix::{CsrMatrix, IdIndex};
use crate::types::*;
use std::collections::HashMap;

/// All artifacts the scorers read, plus the O(1) lookup indices derived at
/// build time (article -> timestamp, article -> category).
#[derive(Debug)]
pub struct ModelStore {
    // Shared index space for both interaction variants
    pub(crate) user_index: IdIndex,
    pub(crate) article_index: IdIndex,

    pub(crate) raw_counts: CsrMatrix,
    pub(crate) quality_weighted: Option<CsrMatrix>,

    pub(crate) embeddings: HashMap<ArticleId, Vec<f32>>,
    pub(crate) embedding_dim: usize,

    pub(crate) popularity: Vec<PopularityEntry>,
    pub(crate) articles: HashMap<ArticleId, ArticleMeta>,
    pub(crate) profiles: HashMap<UserId, UserProfile>,

    // Derived lookups
    pub(crate) article_timestamps: HashMap<ArticleId, TimestampMs>,
    pub(crate) article_categories: HashMap<ArticleId, CategoryId>,
}

impl ModelStore {
    pub fn user_index(&self) -> &IdIndex {
        &self.user_index
    }

    pub fn article_index(&self) -> &IdIndex {
        &self.article_index
    }

    /// The matrix the scorers use: quality-weighted when loaded, raw counts otherwise
    pub fn interactions(&self) -> &CsrMatrix {
        self.quality_weighted.as_ref().unwrap_or(&self.raw_counts)
    }

    pub fn matrix_kind(&self) -> MatrixKind {
        if self.quality_weighted.is_some() {
            MatrixKind::QualityWeighted
        } else {
            MatrixKind::RawCount
        }
    }

    pub fn raw_counts(&self) -> &CsrMatrix {
        &self.raw_counts
    }

    pub fn quality_weighted(&self) -> Option<&CsrMatrix> {
        self.quality_weighted.as_ref()
    }

    pub fn embedding(&self, article_id: ArticleId) -> Option<&[f32]> {
        self.embeddings.get(&article_id).map(|v| v.as_slice())
    }

    pub fn embeddings(&self) -> &HashMap<ArticleId, Vec<f32>> {
        &self.embeddings
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    pub fn popularity(&self) -> &[PopularityEntry] {
        &self.popularity
    }

    pub fn article(&self, article_id: ArticleId) -> Option<&ArticleMeta> {
        self.articles.get(&article_id)
    }

    pub fn article_timestamp(&self, article_id: ArticleId) -> Option<TimestampMs> {
        self.article_timestamps.get(&article_id).copied()
    }

    pub fn article_category(&self, article_id: ArticleId) -> Option<CategoryId> {
        self.article_categories.get(&article_id).copied()
    }

    pub fn profile(&self, user_id: UserId) -> Option<&UserProfile> {
        self.profiles.get(&user_id)
    }

    /// Users that have a non-empty history (warm-path candidates)
    pub fn known_users(&self) -> Vec<UserId> {
        let mut users: Vec<UserId> = self
            .profiles
            .values()
            .filter(|p| !p.is_empty())
            .map(|p| p.user_id)
            .collect();
        users.sort_unstable();
        users
    }

    /// (users, articles with metadata, stored interactions) for logging
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.user_index.len(),
            self.articles.len(),
            self.interactions().nnz(),
        )
    }
}
