//! Collaborative filtering over the sparse interaction matrix.
//!
//! "Readers who engaged with what you engaged with also read these."
//!
//! ## Algorithm
//! 1. Look up the user's row in the active interaction matrix
//! 2. Cosine similarity between that row and every other user's row
//! 3. Keep the K most similar users with similarity > 0
//! 4. For every article a neighbour touched that the user has not, add
//!    `similarity x interaction_weight`
//! 5. Sort by accumulated score, truncate

use crate::traits::Scorer;
use crate::types::{Candidate, CandidateSource, ScoreRequest, rank_candidates};
use anyhow::Result;
use model_store::{ArticleId, ModelStore, UserId};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default neighbourhood size
pub const DEFAULT_NEIGHBORS: usize = 50;

/// Scores articles from the interactions of similar users
#[derive(Clone)]
pub struct CollaborativeScorer {
    /// Shared, read-only model snapshot
    store: Arc<ModelStore>,

    /// K most similar users to aggregate over
    neighbors: usize,
}

impl CollaborativeScorer {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self {
            store,
            neighbors: DEFAULT_NEIGHBORS,
        }
    }

    /// Configure the neighbourhood size (default: 50)
    pub fn with_neighbors(mut self, neighbors: usize) -> Self {
        self.neighbors = neighbors;
        self
    }

    /// Score unseen articles for `user_id`, best first.
    ///
    /// Users absent from the matrix get an empty list; the caller decides the
    /// cold-start policy.
    #[instrument(skip(self), fields(neighbors = self.neighbors))]
    pub fn score(&self, user_id: UserId, top_n: usize) -> Vec<Candidate> {
        let Some(target) = self.store.user_index().index_of(user_id) else {
            debug!("User {} not in interaction matrix", user_id);
            return Vec::new();
        };

        let similar_users = self.find_similar_users(target);
        debug!("Found {} similar users", similar_users.len());

        let scores = self.accumulate_scores(target, &similar_users);

        let article_index = self.store.article_index();
        let mut candidates: Vec<Candidate> = scores
            .into_iter()
            .filter_map(|(col, score)| {
                let article_id: ArticleId = article_index.id_of(col)?;
                Some(Candidate::new(article_id, CandidateSource::Collaborative, score))
            })
            .collect();

        rank_candidates(&mut candidates, top_n);
        debug!("Generated {} collaborative candidates", candidates.len());
        candidates
    }

    /// The K most similar users as `(row, similarity)`, most similar first
    fn find_similar_users(&self, target: usize) -> Vec<(usize, f32)> {
        let matrix = self.store.interactions();
        let target_row = matrix.row(target);
        if target_row.is_empty() {
            return Vec::new();
        }

        let mut similarities: Vec<(usize, f32)> = (0..matrix.n_rows())
            .into_par_iter()
            .filter(|&row| row != target)
            .map(|row| (row, target_row.cosine(&matrix.row(row))))
            .filter(|&(_, similarity)| similarity > 0.0)
            .collect();

        similarities.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        similarities.truncate(self.neighbors);
        similarities
    }

    /// Accumulate `similarity x weight` per unseen article column
    fn accumulate_scores(&self, target: usize, similar_users: &[(usize, f32)]) -> HashMap<usize, f32> {
        let matrix = self.store.interactions();
        let target_row = matrix.row(target);

        // Sequential on purpose: summation order must be identical across runs
        let mut scores: HashMap<usize, f32> = HashMap::new();
        for &(row, similarity) in similar_users {
            for (col, weight) in matrix.row(row).iter() {
                if !target_row.contains(col) {
                    *scores.entry(col).or_insert(0.0) += similarity * weight;
                }
            }
        }
        scores
    }
}

impl Scorer for CollaborativeScorer {
    fn name(&self) -> &str {
        "CollaborativeScorer"
    }

    fn source(&self) -> CandidateSource {
        CandidateSource::Collaborative
    }

    fn candidates(&self, request: &ScoreRequest<'_>, limit: usize) -> Result<Vec<Candidate>> {
        Ok(self.score(request.user_id, limit))
    }
}
