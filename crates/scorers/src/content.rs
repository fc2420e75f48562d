//! Content-based filtering over article embeddings.
//!
//! ## Algorithm
//! 1. Build the user's taste vector (weighted average of history embeddings)
//! 2. Cosine similarity between the taste vector and every unread article
//!    that has an embedding
//! 3. Articles in a category the user reads get a bounded boost:
//!    `similarity x (1 + boost x category_frequency)`
//! 4. Sort, truncate

use crate::traits::Scorer;
use crate::types::{Candidate, CandidateSource, ScoreRequest, rank_candidates};
use crate::user_context::build_taste_profile;
use anyhow::Result;
use model_store::{ModelStore, UserId};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default category boost factor (at most +10% for a single-category reader)
pub const DEFAULT_CATEGORY_BOOST: f32 = 0.1;

/// Scores unread articles by similarity to the user's taste vector
#[derive(Clone)]
pub struct ContentScorer {
    store: Arc<ModelStore>,
    category_boost: f32,
}

impl ContentScorer {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self {
            store,
            category_boost: DEFAULT_CATEGORY_BOOST,
        }
    }

    /// Configure the category boost factor (default: 0.1)
    pub fn with_category_boost(mut self, boost: f32) -> Self {
        self.category_boost = boost;
        self
    }

    /// Score unread, embedded articles for `user_id`, best first
    #[instrument(skip(self))]
    pub fn score(&self, user_id: UserId, top_n: usize) -> Vec<Candidate> {
        let Some(taste) = build_taste_profile(&self.store, user_id) else {
            debug!("No usable history for user {}", user_id);
            return Vec::new();
        };

        let mut candidates: Vec<Candidate> = self
            .store
            .embeddings()
            .par_iter()
            .filter(|(article_id, _)| !taste.profile.has_read(**article_id))
            .map(|(&article_id, embedding)| {
                let mut score = cosine_similarity(&taste.taste, embedding);
                let frequency = self
                    .store
                    .article_category(article_id)
                    .and_then(|category| taste.category_frequencies.get(&category));
                if let Some(frequency) = frequency {
                    score *= 1.0 + self.category_boost * frequency;
                }
                Candidate::new(article_id, CandidateSource::Content, score)
            })
            .collect();

        rank_candidates(&mut candidates, top_n);
        debug!("Generated {} content candidates", candidates.len());
        candidates
    }
}

impl Scorer for ContentScorer {
    fn name(&self) -> &str {
        "ContentScorer"
    }

    fn source(&self) -> CandidateSource {
        CandidateSource::Content
    }

    fn candidates(&self, request: &ScoreRequest<'_>, limit: usize) -> Result<Vec<Candidate>> {
        Ok(self.score(request.user_id, limit))
    }
}

/// Dense cosine similarity; 0.0 for mismatched lengths or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
