//! Candidate types shared by every scorer.

use model_store::{ArticleId, TimestampMs, UserId};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Which signal produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    /// Similar users' interactions
    Collaborative,
    /// Embedding similarity to the user's taste vector
    Content,
    /// Popularity decayed by article age
    Temporal,
}

/// One scored article from a single source.
///
/// `score` is the raw, source-specific value; it is only comparable with
/// other candidates from the same source until fusion normalizes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub article_id: ArticleId,
    pub source: CandidateSource,
    pub score: f32,
}

impl Candidate {
    pub fn new(article_id: ArticleId, source: CandidateSource, score: f32) -> Self {
        Self {
            article_id,
            source,
            score,
        }
    }
}

/// Everything a scorer may need for one request
#[derive(Debug, Clone, Copy)]
pub struct ScoreRequest<'a> {
    pub user_id: UserId,
    /// Articles that must not be returned (the user's history)
    pub exclude: &'a HashSet<ArticleId>,
    pub now_ts: TimestampMs,
    pub max_age_days: f64,
    pub half_life_days: f64,
}

/// Descending score, ties broken by ascending article id.
///
/// Total and independent of input order, so hash-map iteration and parallel
/// collection never change a ranking.
pub fn compare_scores(a_score: f32, a_id: ArticleId, b_score: f32, b_id: ArticleId) -> Ordering {
    b_score
        .partial_cmp(&a_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a_id.cmp(&b_id))
}

/// Sort candidates best-first and keep the top `limit`
pub fn rank_candidates(candidates: &mut Vec<Candidate>, limit: usize) {
    candidates.sort_by(|a, b| compare_scores(a.score, a.article_id, b.score, b.article_id));
    candidates.truncate(limit);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_creation() {
        let candidate = Candidate::new(1, CandidateSource::Collaborative, 0.85);
        assert_eq!(candidate.article_id, 1);
        assert_eq!(candidate.source, CandidateSource::Collaborative);
        assert_eq!(candidate.score, 0.85);
    }

    #[test]
    fn test_rank_breaks_ties_by_article_id() {
        let mut candidates = vec![
            Candidate::new(9, CandidateSource::Temporal, 0.5),
            Candidate::new(3, CandidateSource::Temporal, 0.5),
            Candidate::new(4, CandidateSource::Temporal, 0.9),
            Candidate::new(1, CandidateSource::Temporal, 0.1),
        ];
        rank_candidates(&mut candidates, 3);

        let ids: Vec<ArticleId> = candidates.iter().map(|c| c.article_id).collect();
        assert_eq!(ids, vec![4, 3, 9]);
    }
}
