use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankingError {
    #[error("Invalid fusion weights (collab={collab}, content={content}, trend={trend}): weights must be finite, non-negative and not all zero")]
    InvalidWeights { collab: f64, content: f64, trend: f64 },
}

pub type Result<T> = std::result::Result<T, RankingError>;
