//! Answers, moderation status, round phases, and human vote input.

use serde::{Deserialize, Serialize};

use crate::id::{AnswerId, PlayerId, RoundId};

/// Maximum answer length in characters (short-text game format).
pub const MAX_ANSWER_LEN: usize = 280;

/// Moderation status of an answer. Set by an external moderation pass;
/// only `Valid` answers enter scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Pending,
    Valid,
    Flagged,
}

/// One player's submission for one round. Immutable once scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub player_id: PlayerId,
    pub round_id: RoundId,
    pub text: String,
    pub status: AnswerStatus,
    /// Caller-supplied submission time in milliseconds. Used only as a
    /// deterministic tie-breaker, never as a protocol input.
    pub submitted_at: u64,
}

/// Lifecycle of a round. Linear; `Finalized` is terminal and there are no
/// backward edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Collecting,
    Scoring,
    Verifying,
    AppealWindow,
    Finalized,
}

impl std::fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Collecting => "collecting",
            Self::Scoring => "scoring",
            Self::Verifying => "verifying",
            Self::AppealWindow => "appeal_window",
            Self::Finalized => "finalized",
        };
        write!(f, "{s}")
    }
}

/// Human vote count for an answer. Supplied by the external vote collector;
/// read-only to the protocol core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanVoteTally {
    pub answer_id: AnswerId,
    pub vote_count: u64,
}
