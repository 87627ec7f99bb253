//! Narrow interfaces to the protocol's external collaborators.
//!
//! Session lifecycle, prompt text generation, human vote collection, and
//! persistent XP storage all live outside this crate. The protocol touches
//! them only through these seams: prompts are consumed read-only at round
//! creation, vote tallies arrive as read-only input, and the leaderboard is
//! written exactly once per finalized round.

use std::collections::HashMap;

use arena_aggregate::Leaderboard;
use arena_types::{AnswerId, HumanVoteTally, RoundId, SessionId};
use thiserror::Error;

/// Opaque source of round prompts.
pub trait PromptSource {
    fn next_prompt(&mut self, session_id: SessionId, round_id: RoundId) -> String;
}

/// Error from the external XP/ledger store.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct LedgerError(pub String);

/// Write-only sink for finalized round results.
pub trait XpLedger {
    fn persist(
        &mut self,
        session_id: SessionId,
        board: &Leaderboard,
    ) -> std::result::Result<(), LedgerError>;
}

/// Index vote tallies by answer id for aggregation.
pub fn tally_map(tallies: &[HumanVoteTally]) -> HashMap<AnswerId, u64> {
    tallies
        .iter()
        .map(|t| (t.answer_id, t.vote_count))
        .collect()
}

/// In-memory ledger for tests and simulation. Accumulates season XP per
/// player across rounds, like the external store would.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    pub boards: Vec<(SessionId, Leaderboard)>,
    pub season_xp: HashMap<arena_types::PlayerId, u64>,
}

impl XpLedger for MemoryLedger {
    fn persist(
        &mut self,
        session_id: SessionId,
        board: &Leaderboard,
    ) -> std::result::Result<(), LedgerError> {
        for award in &board.xp_awards {
            *self.season_xp.entry(award.player_id).or_default() += award.xp;
        }
        self.boards.push((session_id, board.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_map_indexes_by_answer() {
        let tallies = vec![
            HumanVoteTally {
                answer_id: AnswerId(1),
                vote_count: 3,
            },
            HumanVoteTally {
                answer_id: AnswerId(2),
                vote_count: 0,
            },
        ];
        let map = tally_map(&tallies);
        assert_eq!(map.get(&AnswerId(1)), Some(&3));
        assert_eq!(map.get(&AnswerId(2)), Some(&0));
    }
}
