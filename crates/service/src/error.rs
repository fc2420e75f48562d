use model_store::LoadError;
use ranking::RankingError;
use thiserror::Error;

/// Errors that cross the service boundary.
///
/// Scorer failures never show up here; they are absorbed per source.
#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("Model store not loaded")]
    ModelNotLoaded,

    #[error("Invalid weights (collab={collab}, content={content}, trend={trend}): must be non-negative with a positive sum")]
    InvalidWeights { collab: f64, content: f64, trend: f64 },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Failed to load model store: {0}")]
    Load(#[from] LoadError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<RankingError> for RecommendError {
    fn from(err: RankingError) -> Self {
        match err {
            RankingError::InvalidWeights {
                collab,
                content,
                trend,
            } => RecommendError::InvalidWeights {
                collab,
                content,
                trend,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, RecommendError>;
