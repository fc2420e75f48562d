//! Score fusion.
//!
//! Each source list is normalized to [0, 1] by its own maximum, then the
//! three lists are combined with caller-supplied weights that are themselves
//! normalized to sum to 1.
//!
//! ## Algorithm
//! 1. Validate and normalize the weights
//! 2. Per source: skip if empty or if its maximum is not positive, otherwise
//!    add `weight x score / max` to each article's running total
//! 3. Keep only articles with a positive combined score

use crate::error::{RankingError, Result};
use crate::types::{RankedCandidate, sort_ranked};
use model_store::ArticleId;
use scorers::Candidate;
use std::collections::HashMap;
use tracing::debug;

/// Relative weight of each signal.
///
/// Any non-negative values work; they are divided by their sum before use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub collab: f64,
    pub content: f64,
    pub trend: f64,
}

impl FusionWeights {
    pub fn new(collab: f64, content: f64, trend: f64) -> Self {
        Self {
            collab,
            content,
            trend,
        }
    }

    /// Weights scaled to sum to 1.
    ///
    /// Negative or non-finite weights, or an all-zero set, are rejected.
    pub fn normalized(&self) -> Result<Self> {
        let invalid = || RankingError::InvalidWeights {
            collab: self.collab,
            content: self.content,
            trend: self.trend,
        };

        let parts = [self.collab, self.content, self.trend];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(invalid());
        }

        let sum: f64 = parts.iter().sum();
        if sum <= 0.0 {
            return Err(invalid());
        }

        Ok(Self {
            collab: self.collab / sum,
            content: self.content / sum,
            trend: self.trend / sum,
        })
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self::new(0.4, 0.3, 0.3)
    }
}

/// Combine the three source lists into `article_id -> fused_score`.
///
/// The result is not truncated; only articles with a positive combined score
/// are kept.
pub fn fuse(
    collab: &[Candidate],
    content: &[Candidate],
    temporal: &[Candidate],
    weights: &FusionWeights,
) -> Result<HashMap<ArticleId, f32>> {
    let weights = weights.normalized()?;

    let mut fused: HashMap<ArticleId, f64> = HashMap::new();
    for (candidates, weight) in [
        (collab, weights.collab),
        (content, weights.content),
        (temporal, weights.trend),
    ] {
        add_normalized(&mut fused, candidates, weight);
    }

    let fused: HashMap<ArticleId, f32> = fused
        .into_iter()
        .filter(|&(_, score)| score > 0.0)
        .map(|(article_id, score)| (article_id, score as f32))
        .collect();

    debug!(
        collab = collab.len(),
        content = content.len(),
        temporal = temporal.len(),
        fused = fused.len(),
        "Fused candidate lists"
    );
    Ok(fused)
}

fn add_normalized(fused: &mut HashMap<ArticleId, f64>, candidates: &[Candidate], weight: f64) {
    let max = candidates
        .iter()
        .map(|c| c.score)
        .fold(f32::NEG_INFINITY, f32::max);
    if candidates.is_empty() || max <= 0.0 || !max.is_finite() {
        return;
    }

    let max = max as f64;
    for candidate in candidates {
        *fused.entry(candidate.article_id).or_insert(0.0) += weight * (candidate.score as f64 / max);
    }
}

/// Fused scores as a best-first list
pub fn rank(fused: &HashMap<ArticleId, f32>) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = fused
        .iter()
        .map(|(&article_id, &score)| RankedCandidate::new(article_id, score))
        .collect();
    sort_ranked(&mut ranked);
    ranked
}

/// Candidates from a single source, best first, without fusion.
///
/// Used by the cold-start path where the temporal list is the only input.
pub fn rank_single(candidates: &[Candidate]) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .map(|c| RankedCandidate::new(c.article_id, c.score))
        .collect();
    sort_ranked(&mut ranked);
    ranked
}
