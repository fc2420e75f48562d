//! Service crate for the news recommendation engine.
//!
//! Owns the request path: validation, the cold-start / warm decision, parallel
//! scoring, fusion, diversity selection and materialization, all over an
//! atomically swappable model snapshot.

pub mod config;
pub mod error;
pub mod handle;
pub mod service;

pub use config::{EngineConfig, WeightsConfig};
pub use error::{RecommendError, Result};
pub use handle::ModelHandle;
pub use service::{RecommendRequest, RecommendationItem, RecommendationService};
