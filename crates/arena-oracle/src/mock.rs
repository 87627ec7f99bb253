//! Seeded mock oracle for tests and simulation.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use arena_types::ScoreDims;
use futures::future::BoxFuture;
use futures::FutureExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::oracle::{OracleResult, ScoringMode, ScoringOracle};

/// A deterministic stand-in for the AI scoring service.
///
/// Draws scores from a seeded RNG, so a fixed seed replays the same round.
/// Tests can pin exact responses per answer text with [`with_response`] /
/// [`with_strict_response`], or make a call hang forever with [`hang_on`]
/// to exercise the timeout path.
///
/// [`with_response`]: MockOracle::with_response
/// [`with_strict_response`]: MockOracle::with_strict_response
/// [`hang_on`]: MockOracle::hang_on
pub struct MockOracle {
    rng: Mutex<StdRng>,
    responses: HashMap<String, ScoreDims>,
    strict_responses: HashMap<String, ScoreDims>,
    hangs: HashSet<String>,
    strict_hangs: HashSet<String>,
}

impl MockOracle {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            responses: HashMap::new(),
            strict_responses: HashMap::new(),
            hangs: HashSet::new(),
            strict_hangs: HashSet::new(),
        }
    }

    /// Pin the standard-mode response for an exact answer text.
    #[must_use]
    pub fn with_response(mut self, answer_text: &str, dims: ScoreDims) -> Self {
        self.responses.insert(answer_text.to_string(), dims);
        self
    }

    /// Pin the strict-mode response for an exact answer text.
    #[must_use]
    pub fn with_strict_response(mut self, answer_text: &str, dims: ScoreDims) -> Self {
        self.strict_responses.insert(answer_text.to_string(), dims);
        self
    }

    /// Make every call for this answer text hang until cancelled.
    #[must_use]
    pub fn hang_on(mut self, answer_text: &str) -> Self {
        self.hangs.insert(answer_text.to_string());
        self
    }

    /// Make only strict-mode calls for this answer text hang. Lets a test
    /// score an answer normally and then starve its appeal re-scoring.
    #[must_use]
    pub fn hang_on_strict(mut self, answer_text: &str) -> Self {
        self.strict_hangs.insert(answer_text.to_string());
        self
    }

    fn draw(&self, mode: ScoringMode) -> ScoreDims {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        // Strict mode re-judges with less generosity, mirroring the
        // stricter prompt variant a real appeal would use.
        let range = match mode {
            ScoringMode::Standard => 3.0..=10.0,
            ScoringMode::Strict => 2.0..=8.0,
        };
        ScoreDims::clamped(
            rng.gen_range(range.clone()),
            rng.gen_range(range.clone()),
            rng.gen_range(range),
        )
    }
}

impl ScoringOracle for MockOracle {
    fn score<'a>(
        &'a self,
        _prompt: &'a str,
        answer_text: &'a str,
        mode: ScoringMode,
    ) -> BoxFuture<'a, OracleResult<ScoreDims>> {
        if self.hangs.contains(answer_text)
            || (mode == ScoringMode::Strict && self.strict_hangs.contains(answer_text))
        {
            return futures::future::pending().boxed();
        }
        let pinned = match mode {
            ScoringMode::Standard => self.responses.get(answer_text),
            ScoringMode::Strict => self
                .strict_responses
                .get(answer_text)
                .or_else(|| self.responses.get(answer_text)),
        };
        let dims = pinned.copied().unwrap_or_else(|| self.draw(mode));
        async move { Ok(dims) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pinned_response_wins_over_rng() {
        let dims = ScoreDims::clamped(8.0, 7.0, 9.0);
        let oracle = MockOracle::seeded(42).with_response("hello", dims);
        let got = oracle
            .score("p", "hello", ScoringMode::Standard)
            .await
            .unwrap();
        assert_eq!(got, dims);
    }

    #[tokio::test]
    async fn strict_falls_back_to_standard_pin() {
        let dims = ScoreDims::clamped(4.0, 4.0, 4.0);
        let oracle = MockOracle::seeded(42).with_response("hello", dims);
        let got = oracle.score("p", "hello", ScoringMode::Strict).await.unwrap();
        assert_eq!(got, dims);
    }

    #[tokio::test]
    async fn drawn_scores_stay_in_range() {
        let oracle = MockOracle::seeded(7);
        for _ in 0..50 {
            let dims = oracle
                .score("p", "anything", ScoringMode::Standard)
                .await
                .unwrap();
            for v in [dims.clarity, dims.creativity, dims.relevance] {
                assert!((0.0..=10.0).contains(&v));
            }
        }
    }
}
