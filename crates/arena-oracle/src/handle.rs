//! Timeout-absorbing wrapper around a scoring oracle.

use std::sync::Arc;
use std::time::Duration;

use arena_types::{OracleOutcome, ScoreDims};
use tracing::warn;

use crate::oracle::{ScoringMode, ScoringOracle};

/// Shared handle to a scoring oracle with a fixed per-call timeout.
///
/// Every call returns an [`OracleOutcome`]: a timed-out or failed call
/// becomes [`OracleOutcome::TimedOut`] rather than an error, so the round
/// coordinator never stalls on a slow or broken scoring service.
#[derive(Clone)]
pub struct OracleHandle {
    oracle: Arc<dyn ScoringOracle>,
    timeout: Duration,
}

impl OracleHandle {
    pub fn new(oracle: Arc<dyn ScoringOracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }

    /// Same oracle, different per-call timeout (appeal re-scoring budgets
    /// its committee as a whole, not per call).
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            oracle: Arc::clone(&self.oracle),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Score one answer, absorbing timeout and service failure into the
    /// sentinel outcome. Dimensions are clamped to `[0, 10]` on the way in;
    /// the protocol never sees out-of-range scores.
    pub async fn score(&self, prompt: &str, answer_text: &str, mode: ScoringMode) -> OracleOutcome {
        let call = self.oracle.score(prompt, answer_text, mode);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(dims)) => OracleOutcome::Scored(ScoreDims::clamped(
                dims.clarity,
                dims.creativity,
                dims.relevance,
            )),
            Ok(Err(err)) => {
                warn!(error = %err, "oracle call failed, using sentinel");
                OracleOutcome::TimedOut
            }
            Err(_elapsed) => {
                warn!(timeout = ?self.timeout, "oracle call timed out, using sentinel");
                OracleOutcome::TimedOut
            }
        }
    }
}

impl std::fmt::Debug for OracleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleHandle")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
