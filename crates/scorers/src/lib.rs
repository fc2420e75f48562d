//! # Scorers Crate
//!
//! The three independent relevance signals of the hybrid recommender. Every
//! scorer reads an `Arc<ModelStore>` and never mutates it, so the three can
//! run on parallel threads for the same request.
//!
//! ## Components
//!
//! ### CollaborativeScorer
//! "Readers like you also read...": cosine similarity between sparse
//! interaction rows, top-K neighbours, `similarity x weight` aggregation.
//!
//! ### ContentScorer
//! Taste vector (weighted average of history embeddings) against every unread
//! article, with a bounded boost for the user's frequent categories.
//!
//! ### TemporalScorer
//! Popularity decayed by article age, bounded by the hype window. Also the
//! cold-start source.
//!
//! ## Example Usage
//!
//! ```ignore
//! use model_store::ModelStore;
//! use scorers::{CollaborativeScorer, ContentScorer, TemporalScorer};
//! use std::collections::HashSet;
//! use std::sync::Arc;
//!
//! let store = Arc::new(ModelStore::load("data/news".as_ref())?);
//!
//! let collaborative = CollaborativeScorer::new(store.clone()).with_neighbors(50);
//! let content = ContentScorer::new(store.clone());
//! let temporal = TemporalScorer::new(store.clone());
//!
//! let similar = collaborative.score(user_id, 50);
//! let related = content.score(user_id, 50);
//! let fresh = temporal.score(50, &HashSet::new(), now_ts, 14.0, 7.0)?;
//! ```

pub mod collaborative;
pub mod content;
pub mod temporal;
pub mod traits;
pub mod types;
pub mod user_context;

pub use collaborative::CollaborativeScorer;
pub use content::ContentScorer;
pub use temporal::TemporalScorer;
pub use traits::Scorer;
pub use types::{Candidate, CandidateSource, ScoreRequest, compare_scores, rank_candidates};
