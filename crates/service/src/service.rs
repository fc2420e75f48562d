//! # Recommendation Service
//!
//! Coordinates one recommendation request:
//! 1. Validate the request
//! 2. Take a snapshot of the current model store
//! 3. Cold start (no history): temporal candidates only
//!    Warm: collaborative, content and temporal in parallel, then fusion
//! 4. Drop candidates without article metadata
//! 5. Diversity selection (or plain truncation)
//! 6. Materialize `RecommendationItem`s
//!
//! A failing scorer contributes an empty list and is logged; only caller
//! errors and a missing model store reach the caller.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use model_store::{ArticleId, CategoryId, ModelStore, PublisherId, TimestampMs, UserId};
use ranking::{DiversitySelector, FusionWeights, RankedCandidate, fuse, rank, rank_single};
use scorers::{Candidate, CollaborativeScorer, ContentScorer, ScoreRequest, Scorer, TemporalScorer};

use crate::config::EngineConfig;
use crate::error::{RecommendError, Result};
use crate::handle::ModelHandle;

/// Default number of recommendations per request
pub const DEFAULT_RECOMMENDATIONS: usize = 5;

/// One recommended article, ready to hand to a presentation layer.
///
/// `score` is the fused (or temporal, on the cold path) value and is not
/// comparable across different weight configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub article_id: ArticleId,
    pub score: f32,
    pub category_id: CategoryId,
    pub publisher_id: PublisherId,
    pub words_count: u32,
    pub created_at_ts: TimestampMs,
}

/// Parameters of a single `recommend` call
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendRequest {
    pub user_id: UserId,
    pub n_recommendations: usize,
    pub weights: FusionWeights,
    pub use_diversity: bool,
    /// Reference "now" in epoch milliseconds; wall clock when `None`
    pub reference_timestamp: Option<TimestampMs>,
    /// Hype window; the configured default when `None`
    pub max_article_age_days: Option<f64>,
}

impl RecommendRequest {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            n_recommendations: DEFAULT_RECOMMENDATIONS,
            weights: FusionWeights::default(),
            use_diversity: true,
            reference_timestamp: None,
            max_article_age_days: None,
        }
    }

    pub fn with_count(mut self, n: usize) -> Self {
        self.n_recommendations = n;
        self
    }

    pub fn with_weights(mut self, collab: f64, content: f64, trend: f64) -> Self {
        self.weights = FusionWeights::new(collab, content, trend);
        self
    }

    pub fn with_diversity(mut self, use_diversity: bool) -> Self {
        self.use_diversity = use_diversity;
        self
    }

    pub fn at(mut self, reference_timestamp: TimestampMs) -> Self {
        self.reference_timestamp = Some(reference_timestamp);
        self
    }

    pub fn with_max_age_days(mut self, max_age_days: f64) -> Self {
        self.max_article_age_days = Some(max_age_days);
        self
    }
}

/// Stateless orchestrator over a swappable model snapshot
#[derive(Debug)]
pub struct RecommendationService {
    handle: ModelHandle,
    config: EngineConfig,
}

impl RecommendationService {
    /// A service with no model installed yet
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            handle: ModelHandle::new(),
            config,
        })
    }

    pub fn with_store(store: Arc<ModelStore>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            handle: ModelHandle::with_store(store),
            config,
        })
    }

    /// Load the store from `model_dir` and build a service around it
    pub fn load(model_dir: &Path, config: EngineConfig) -> Result<Self> {
        let service = Self::new(config)?;
        service.reload_from(model_dir)?;
        Ok(service)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    /// Current model snapshot
    pub fn store(&self) -> Result<Arc<ModelStore>> {
        self.handle.snapshot()
    }

    pub fn install(&self, store: Arc<ModelStore>) {
        self.handle.install(store);
    }

    /// Reload from disk and swap atomically; the old store stays on failure
    pub fn reload_from(&self, model_dir: &Path) -> Result<()> {
        self.handle.reload_from(model_dir).map(|_| ())
    }

    /// Main entry point: ranked, optionally diversified recommendations
    #[instrument(skip(self, request), fields(user_id = request.user_id, n = request.n_recommendations))]
    pub fn recommend(&self, request: &RecommendRequest) -> Result<Vec<RecommendationItem>> {
        let start = Instant::now();
        let n = self.validate_count(request.n_recommendations)?;
        request.weights.normalized()?;
        let max_age_days = self.resolve_max_age(request.max_article_age_days)?;
        let now_ts = request.reference_timestamp.unwrap_or_else(now_millis);

        let store = self.handle.snapshot()?;

        let no_history = HashSet::new();
        let history = store
            .profile(request.user_id)
            .filter(|profile| !profile.is_empty())
            .map(|profile| profile.read_set());

        let ranked = match history {
            None => {
                debug!("Cold start for user {}", request.user_id);
                let score_request = self.score_request(request.user_id, &no_history, now_ts, max_age_days);
                self.cold_candidates(&store, &score_request, n)
            }
            Some(history) => {
                let score_request = self.score_request(request.user_id, history, now_ts, max_age_days);
                self.warm_candidates(&store, &score_request, &request.weights, n)?
            }
        };

        let selected = self.select(&store, ranked, n, request.use_diversity);
        let items = materialize(&store, &selected);

        info!(
            "Recommended {} items for user {} in {:.2?}",
            items.len(),
            request.user_id,
            start.elapsed()
        );
        Ok(items)
    }

    /// Non-personalized feed: the cold-start temporal list
    #[instrument(skip(self))]
    pub fn trending(
        &self,
        n: usize,
        reference_timestamp: Option<TimestampMs>,
        max_article_age_days: Option<f64>,
    ) -> Result<Vec<RecommendationItem>> {
        let n = self.validate_count(n)?;
        let max_age_days = self.resolve_max_age(max_article_age_days)?;
        let now_ts = reference_timestamp.unwrap_or_else(now_millis);
        let store = self.handle.snapshot()?;

        let no_history = HashSet::new();
        let score_request = self.score_request(0, &no_history, now_ts, max_age_days);
        let ranked = self.cold_candidates(&store, &score_request, n);
        let selected = self.select(&store, ranked, n, false);
        Ok(materialize(&store, &selected))
    }

    fn validate_count(&self, n: usize) -> Result<usize> {
        let max = self.config.max_recommendations;
        if n == 0 || n > max {
            return Err(RecommendError::InvalidParameter {
                name: "n_recommendations".to_string(),
                reason: format!("must be in 1..={}, got {}", max, n),
            });
        }
        Ok(n)
    }

    fn resolve_max_age(&self, requested: Option<f64>) -> Result<f64> {
        let max_age_days = requested.unwrap_or(self.config.max_article_age_days);
        if !(max_age_days >= 0.0) {
            return Err(RecommendError::InvalidParameter {
                name: "max_article_age_days".to_string(),
                reason: format!("must be >= 0, got {}", max_age_days),
            });
        }
        Ok(max_age_days)
    }

    fn score_request<'a>(
        &self,
        user_id: UserId,
        exclude: &'a HashSet<ArticleId>,
        now_ts: TimestampMs,
        max_age_days: f64,
    ) -> ScoreRequest<'a> {
        ScoreRequest {
            user_id,
            exclude,
            now_ts,
            max_age_days,
            half_life_days: self.config.half_life_days,
        }
    }

    /// Temporal candidates only, `n x cold_start_headroom` of them
    fn cold_candidates(&self, store: &Arc<ModelStore>, request: &ScoreRequest<'_>, n: usize) -> Vec<RankedCandidate> {
        let temporal = TemporalScorer::new(Arc::clone(store));
        let limit = n.saturating_mul(self.config.cold_start_headroom);
        let candidates = servable_candidates(store, &temporal, request, limit);
        rank_single(&candidates)
    }

    /// All three scorers in parallel at `n x warm_headroom` each, then fusion
    fn warm_candidates(
        &self,
        store: &Arc<ModelStore>,
        request: &ScoreRequest<'_>,
        weights: &FusionWeights,
        n: usize,
    ) -> Result<Vec<RankedCandidate>> {
        let limit = n.saturating_mul(self.config.warm_headroom);
        let collaborative =
            CollaborativeScorer::new(Arc::clone(store)).with_neighbors(self.config.collaborative_neighbors);
        let content = ContentScorer::new(Arc::clone(store)).with_category_boost(self.config.category_boost);
        let temporal = TemporalScorer::new(Arc::clone(store));

        let ((collab, content), trend) = rayon::join(
            || {
                rayon::join(
                    || servable_candidates(store, &collaborative, request, limit),
                    || servable_candidates(store, &content, request, limit),
                )
            },
            || servable_candidates(store, &temporal, request, limit),
        );
        debug!(
            collab = collab.len(),
            content = content.len(),
            temporal = trend.len(),
            "Generated candidates"
        );

        let fused = fuse(&collab, &content, &trend, weights)?;
        if fused.is_empty() {
            warn!(
                "No positive fused candidates for user {}, falling back to temporal candidates",
                request.user_id
            );
            return Ok(self.cold_candidates(store, request, n));
        }
        Ok(rank(&fused))
    }

    fn select(
        &self,
        store: &ModelStore,
        mut ranked: Vec<RankedCandidate>,
        n: usize,
        use_diversity: bool,
    ) -> Vec<RankedCandidate> {
        // Anything that cannot be materialized must not take a slot
        ranked.retain(|candidate| store.article(candidate.article_id).is_some());

        if use_diversity {
            DiversitySelector::new()
                .with_max_rounds(self.config.diversity_max_rounds)
                .select(&ranked, n, |article_id| store.article_category(article_id))
        } else {
            ranked.truncate(n);
            ranked
        }
    }
}

/// Run one scorer, absorbing its failure into an empty list
fn run_scorer(scorer: &dyn Scorer, request: &ScoreRequest<'_>, limit: usize) -> Vec<Candidate> {
    match scorer.candidates(request, limit) {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(
                scorer = scorer.name(),
                user_id = request.user_id,
                error = %e,
                "Scorer failed, continuing without it"
            );
            Vec::new()
        }
    }
}

/// The best `limit` candidates of one scorer that have article metadata.
///
/// The metadata check runs before the cut so unservable ids never use up the
/// headroom.
fn servable_candidates(
    store: &ModelStore,
    scorer: &dyn Scorer,
    request: &ScoreRequest<'_>,
    limit: usize,
) -> Vec<Candidate> {
    let mut candidates = run_scorer(scorer, request, usize::MAX);
    candidates.retain(|candidate| store.article(candidate.article_id).is_some());
    candidates.truncate(limit);
    candidates
}

fn materialize(store: &ModelStore, selected: &[RankedCandidate]) -> Vec<RecommendationItem> {
    selected
        .iter()
        .filter_map(|candidate| {
            let meta = store.article(candidate.article_id)?;
            Some(RecommendationItem {
                article_id: meta.article_id,
                score: candidate.score,
                category_id: meta.category_id,
                publisher_id: meta.publisher_id,
                words_count: meta.words_count,
                created_at_ts: meta.created_at_ts,
            })
        })
        .collect()
}

fn now_millis() -> TimestampMs {
    Utc::now().timestamp_millis()
}
