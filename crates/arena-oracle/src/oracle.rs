//! The oracle call contract.

use arena_types::ScoreDims;
use futures::future::BoxFuture;
use thiserror::Error;

/// Result type for raw oracle calls.
pub type OracleResult<T> = std::result::Result<T, OracleError>;

/// Scoring mode. `Strict` is used only for appeal re-scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    Standard,
    Strict,
}

/// Errors from the underlying scoring service.
///
/// These never reach the round coordinator directly: [`crate::OracleHandle`]
/// converts every failure into a sentinel outcome.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The service could not be reached or refused the call.
    #[error("scoring service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with something that is not a score vector.
    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

/// A scoring oracle: one answer in, one score vector out.
///
/// Implementations wrap the external AI service. The returned future is a
/// suspension point (network-bound, may block or time out); callers bound it
/// with their configured oracle timeout.
pub trait ScoringOracle: Send + Sync {
    /// Score `answer_text` against `prompt` on clarity, creativity, and
    /// relevance, each in `[0, 10]`.
    fn score<'a>(
        &'a self,
        prompt: &'a str,
        answer_text: &'a str,
        mode: ScoringMode,
    ) -> BoxFuture<'a, OracleResult<ScoreDims>>;
}
