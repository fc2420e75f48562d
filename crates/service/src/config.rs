//! Engine configuration.
//!
//! Every tunable of the scoring path lives here with its default. Hosts load
//! it from JSON; any field left out keeps its default.

use crate::error::{RecommendError, Result};
use ranking::FusionWeights;
use scorers::collaborative::DEFAULT_NEIGHBORS;
use scorers::content::DEFAULT_CATEGORY_BOOST;
use scorers::temporal::{DEFAULT_HALF_LIFE_DAYS, DEFAULT_MAX_AGE_DAYS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// K most similar users for collaborative filtering
    pub collaborative_neighbors: usize,
    /// Category boost factor for content scoring
    pub category_boost: f32,
    pub half_life_days: f64,
    /// Hype window used when a request does not set one
    pub max_article_age_days: f64,
    /// Cold path fetches `n x cold_start_headroom` temporal candidates
    pub cold_start_headroom: usize,
    /// Warm path fetches `n x warm_headroom` candidates from each source
    pub warm_headroom: usize,
    pub max_recommendations: usize,
    /// Optional cap on diversity round-robin rounds
    pub diversity_max_rounds: Option<usize>,
    /// Weights hosts use when the caller supplies none
    pub default_weights: WeightsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    pub collab: f64,
    pub content: f64,
    pub trend: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            collab: 0.4,
            content: 0.3,
            trend: 0.3,
        }
    }
}

impl From<WeightsConfig> for FusionWeights {
    fn from(weights: WeightsConfig) -> Self {
        FusionWeights::new(weights.collab, weights.content, weights.trend)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            collaborative_neighbors: DEFAULT_NEIGHBORS,
            category_boost: DEFAULT_CATEGORY_BOOST,
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
            max_article_age_days: DEFAULT_MAX_AGE_DAYS,
            cold_start_headroom: 3,
            warm_headroom: 10,
            max_recommendations: 50,
            diversity_max_rounds: None,
            default_weights: WeightsConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Read and validate a JSON config file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| RecommendError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let config: EngineConfig = serde_json::from_str(&contents)
            .map_err(|e| RecommendError::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| Err(RecommendError::Config(reason));

        if !(self.half_life_days > 0.0 && self.half_life_days.is_finite()) {
            return fail(format!("half_life_days must be > 0, got {}", self.half_life_days));
        }
        if !(self.max_article_age_days >= 0.0) {
            return fail(format!(
                "max_article_age_days must be >= 0, got {}",
                self.max_article_age_days
            ));
        }
        if self.cold_start_headroom == 0 || self.warm_headroom == 0 {
            return fail("headroom multipliers must be >= 1".to_string());
        }
        if self.max_recommendations == 0 {
            return fail("max_recommendations must be >= 1".to_string());
        }
        if !(self.category_boost >= 0.0 && self.category_boost.is_finite()) {
            return fail(format!("category_boost must be >= 0, got {}", self.category_boost));
        }
        FusionWeights::from(self.default_weights)
            .normalized()
            .map_err(|e| RecommendError::Config(format!("default_weights: {}", e)))?;
        Ok(())
    }
}
