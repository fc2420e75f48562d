//! The seam between the orchestrator and the individual signals.

use crate::types::{Candidate, CandidateSource, ScoreRequest};
use anyhow::Result;

/// A source of scored candidates.
///
/// ## Design Note
/// - `Send + Sync` so the orchestrator can run scorers on parallel threads
/// - An `Err` is absorbed by the caller: the failing source contributes an
///   empty list and sibling scorers are unaffected
pub trait Scorer: Send + Sync {
    /// Returns the name of this scorer (for logging)
    fn name(&self) -> &str;

    /// The candidate source tag this scorer emits
    fn source(&self) -> CandidateSource;

    /// Produce at most `limit` candidates, best first
    fn candidates(&self, request: &ScoreRequest<'_>, limit: usize) -> Result<Vec<Candidate>>;
}
