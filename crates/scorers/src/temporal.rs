//! Temporal / popularity scoring with a bounded hype window.
//!
//! `score = base_score x exp(-age_days x ln 2 / half_life_days)`
//!
//! Articles older than `max_age_days` are excluded outright. Articles dated
//! after the reference timestamp count as age 0. Popularity entries without a
//! known timestamp keep their undecayed base score and are reported in a
//! single warning per call.

use crate::traits::Scorer;
use crate::types::{Candidate, CandidateSource, ScoreRequest, rank_candidates};
use anyhow::{Result, ensure};
use model_store::{ArticleId, ModelStore, TimestampMs, age_in_days};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Default half-life of the recency decay
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 7.0;

/// Default hype window
pub const DEFAULT_MAX_AGE_DAYS: f64 = 14.0;

/// Multiplier applied to a score after `age_days` of decay
pub fn decay_factor(age_days: f64, half_life_days: f64) -> f64 {
    (-age_days * std::f64::consts::LN_2 / half_life_days).exp()
}

/// Scores the popularity table by recency
#[derive(Clone)]
pub struct TemporalScorer {
    store: Arc<ModelStore>,
}

impl TemporalScorer {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self { store }
    }

    /// Decayed popularity for every entry not in `exclude`, best first
    #[instrument(skip(self, exclude), fields(excluded = exclude.len()))]
    pub fn score(
        &self,
        top_n: usize,
        exclude: &HashSet<ArticleId>,
        now_ts: TimestampMs,
        max_age_days: f64,
        half_life_days: f64,
    ) -> Result<Vec<Candidate>> {
        ensure!(
            max_age_days >= 0.0 && !max_age_days.is_nan(),
            "max_age_days must be >= 0, got {}",
            max_age_days
        );
        ensure!(
            half_life_days > 0.0 && half_life_days.is_finite(),
            "half_life_days must be > 0, got {}",
            half_life_days
        );

        let mut missing_timestamps = 0usize;
        let mut candidates = Vec::new();

        for entry in self.store.popularity() {
            if exclude.contains(&entry.article_id) {
                continue;
            }

            let score = match self.store.article_timestamp(entry.article_id) {
                Some(created_at_ts) => {
                    let age_days = age_in_days(created_at_ts, now_ts).max(0.0);
                    if age_days > max_age_days {
                        continue;
                    }
                    (entry.base_score as f64 * decay_factor(age_days, half_life_days)) as f32
                }
                None => {
                    missing_timestamps += 1;
                    entry.base_score
                }
            };

            candidates.push(Candidate::new(entry.article_id, CandidateSource::Temporal, score));
        }

        if missing_timestamps > 0 {
            warn!(
                missing_timestamps,
                "Popularity entries without a timestamp scored at undecayed base score"
            );
        }

        rank_candidates(&mut candidates, top_n);
        debug!("Generated {} temporal candidates", candidates.len());
        Ok(candidates)
    }
}

impl Scorer for TemporalScorer {
    fn name(&self) -> &str {
        "TemporalScorer"
    }

    fn source(&self) -> CandidateSource {
        CandidateSource::Temporal
    }

    fn candidates(&self, request: &ScoreRequest<'_>, limit: usize) -> Result<Vec<Candidate>> {
        self.score(
            limit,
            request.exclude,
            request.now_ts,
            request.max_age_days,
            request.half_life_days,
        )
    }
}
