//! Ranking stages that run after candidate generation.
//!
//! This crate provides:
//! - Score fusion: per-source max normalization and weighted combination
//! - DiversitySelector: round-robin-by-category selection of the final list
//!
//! ## Architecture
//! Candidates flow through two stages:
//! 1. `fuse` combines the collaborative, content and temporal lists into one
//!    score per article; `rank` turns that into a best-first list
//! 2. `DiversitySelector::select` picks the final N items from the ranked list
//!
//! ## Example Usage
//! ```ignore
//! use ranking::{DiversitySelector, FusionWeights, fuse, rank};
//!
//! let fused = fuse(&collab, &content, &temporal, &FusionWeights::new(0.5, 0.3, 0.2))?;
//! let ranked = rank(&fused);
//!
//! let selected = DiversitySelector::new().select(&ranked, 5, |id| store.article_category(id));
//! ```

pub mod diversity;
pub mod error;
pub mod fusion;
pub mod types;

// Re-export main types
pub use diversity::DiversitySelector;
pub use error::{RankingError, Result};
pub use fusion::{FusionWeights, fuse, rank, rank_single};
pub use types::{RankedCandidate, sort_ranked};
