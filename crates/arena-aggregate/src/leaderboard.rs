//! Leaderboard output types.

use arena_types::{AnswerId, PlayerId, RoundId, SessionId};
use serde::{Deserialize, Serialize};

/// One ranked answer. `rank` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub answer_id: AnswerId,
    pub player_id: PlayerId,
    pub final_score: f64,
    pub vote_count: u64,
}

/// An answer excluded from ranking after every committee re-score failed.
/// Listed explicitly - exclusion is visible, never silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedAnswer {
    pub answer_id: AnswerId,
    pub player_id: PlayerId,
}

/// XP granted to one player for the round (participation + rank bonus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpAward {
    pub player_id: PlayerId,
    pub xp: u64,
}

/// The final, write-once output of a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub round_id: RoundId,
    pub session_id: SessionId,
    /// Ranked descending by final score; ties broken by vote count, then
    /// earliest submission.
    pub entries: Vec<LeaderboardEntry>,
    pub dropped: Vec<ExcludedAnswer>,
    /// One award per player, sorted by player id.
    pub xp_awards: Vec<XpAward>,
}
