//! Score Aggregator.
//!
//! Blends accepted AI scores with human vote tallies into a final ranked
//! list and XP awards:
//!
//! ```text
//! final_score = human_weight * normalize(vote_count)
//!             + ai_weight    * normalize(avg(accepted dims))
//! ```
//!
//! Votes are normalized against the round's maximum vote count; AI averages
//! against the 10-point scale. Ranking is deterministic and stable:
//! descending final score, ties broken by higher vote count, then earliest
//! submission, then answer id. No arrival-order input anywhere.
//!
//! The aggregator itself is a pure function; write-once semantics
//! (`AlreadyFinalized`) are enforced by the round coordinator that calls it.

mod leaderboard;

use std::collections::HashMap;

use arena_types::{AcceptedScore, Answer, AnswerId, ProtocolConfig, ScoreDims, WEIGHT_EPSILON};
use thiserror::Error;
use tracing::debug;

pub use leaderboard::{ExcludedAnswer, Leaderboard, LeaderboardEntry, XpAward};

/// Everything the aggregator needs about one round.
#[derive(Debug)]
pub struct RoundInputs<'a> {
    pub round_id: arena_types::RoundId,
    pub session_id: arena_types::SessionId,
    /// All valid answers that entered scoring, surviving and dropped.
    pub answers: &'a HashMap<AnswerId, Answer>,
    /// Accepted scores for surviving answers.
    pub accepted: &'a HashMap<AnswerId, AcceptedScore>,
    /// Answers dropped during verification.
    pub dropped: &'a [AnswerId],
    /// Human vote tallies; a missing entry means zero votes.
    pub tallies: &'a HashMap<AnswerId, u64>,
}

/// Aggregation failures. These are invariant violations upstream, not
/// recoverable conditions here.
#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    /// A non-dropped answer reached finalization without an accepted score.
    #[error("answer {0} has no accepted score and is not dropped")]
    MissingAcceptedScore(AnswerId),
}

#[derive(Debug, Clone, Copy)]
struct RankRow {
    answer_id: AnswerId,
    player_id: arena_types::PlayerId,
    final_score: f64,
    vote_count: u64,
    submitted_at: u64,
}

fn sort_rows(rows: &mut [RankRow]) {
    rows.sort_by(|a, b| {
        b.final_score
            .total_cmp(&a.final_score)
            .then(b.vote_count.cmp(&a.vote_count))
            .then(a.submitted_at.cmp(&b.submitted_at))
            .then(a.answer_id.cmp(&b.answer_id))
    });
}

fn normalized_votes(votes: u64, max_votes: u64) -> f64 {
    if max_votes == 0 {
        0.0
    } else {
        votes as f64 / max_votes as f64
    }
}

fn blended_rows(
    answers: &HashMap<AnswerId, Answer>,
    dims: &HashMap<AnswerId, ScoreDims>,
    tallies: &HashMap<AnswerId, u64>,
    human_weight: f64,
    ai_weight: f64,
) -> Vec<RankRow> {
    let max_votes = dims
        .keys()
        .map(|id| tallies.get(id).copied().unwrap_or(0))
        .max()
        .unwrap_or(0);

    let mut rows: Vec<RankRow> = dims
        .iter()
        .filter_map(|(id, d)| {
            let answer = answers.get(id)?;
            let votes = tallies.get(id).copied().unwrap_or(0);
            let final_score = human_weight * normalized_votes(votes, max_votes)
                + ai_weight * (d.average() / ScoreDims::MAX);
            Some(RankRow {
                answer_id: *id,
                player_id: answer.player_id,
                final_score,
                vote_count: votes,
                submitted_at: answer.submitted_at,
            })
        })
        .collect();
    sort_rows(&mut rows);
    rows
}

/// Produce the final leaderboard and XP awards for a round.
///
/// Every answer not listed in `dropped` must carry an accepted score.
/// Dropped answers are listed as excluded and their players still earn
/// participation XP - the drop was a protocol failure, not theirs.
pub fn finalize_round(
    inputs: &RoundInputs<'_>,
    cfg: &ProtocolConfig,
) -> Result<Leaderboard, AggregateError> {
    debug_assert!((cfg.human_weight + cfg.ai_weight - 1.0).abs() <= WEIGHT_EPSILON);

    let mut dims: HashMap<AnswerId, ScoreDims> = HashMap::new();
    for id in inputs.answers.keys() {
        if inputs.dropped.contains(id) {
            continue;
        }
        let accepted = inputs
            .accepted
            .get(id)
            .ok_or(AggregateError::MissingAcceptedScore(*id))?;
        dims.insert(*id, accepted.dims);
    }

    let rows = blended_rows(
        inputs.answers,
        &dims,
        inputs.tallies,
        cfg.human_weight,
        cfg.ai_weight,
    );

    let mut xp: HashMap<arena_types::PlayerId, u64> = HashMap::new();
    let entries: Vec<LeaderboardEntry> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let rank = i + 1;
            let bonus = cfg.top_n_bonus.get(rank - 1).copied().unwrap_or(0);
            *xp.entry(row.player_id).or_default() += cfg.participation_xp + bonus;
            LeaderboardEntry {
                rank,
                answer_id: row.answer_id,
                player_id: row.player_id,
                final_score: row.final_score,
                vote_count: row.vote_count,
            }
        })
        .collect();

    let mut dropped: Vec<ExcludedAnswer> = inputs
        .dropped
        .iter()
        .filter_map(|id| {
            let answer = inputs.answers.get(id)?;
            *xp.entry(answer.player_id).or_default() += cfg.participation_xp;
            Some(ExcludedAnswer {
                answer_id: *id,
                player_id: answer.player_id,
            })
        })
        .collect();
    dropped.sort_by_key(|d| d.answer_id);

    let mut xp_awards: Vec<XpAward> = xp
        .into_iter()
        .map(|(player_id, xp)| XpAward { player_id, xp })
        .collect();
    xp_awards.sort_by_key(|a| a.player_id);

    debug!(
        round = %inputs.round_id,
        ranked = entries.len(),
        dropped = dropped.len(),
        "aggregated round"
    );

    Ok(Leaderboard {
        round_id: inputs.round_id,
        session_id: inputs.session_id,
        entries,
        dropped,
        xp_awards,
    })
}

/// 1-based rank of `target` under the blended score, with `dims` standing in
/// for the accepted scores. Used by appeal resolution to ask "where would
/// this answer land if the score were X?".
pub fn blended_rank_of(
    target: AnswerId,
    answers: &HashMap<AnswerId, Answer>,
    dims: &HashMap<AnswerId, ScoreDims>,
    tallies: &HashMap<AnswerId, u64>,
    cfg: &ProtocolConfig,
) -> Option<usize> {
    let rows = blended_rows(answers, dims, tallies, cfg.human_weight, cfg.ai_weight);
    rows.iter()
        .position(|r| r.answer_id == target)
        .map(|i| i + 1)
}

/// 1-based rank implied by human votes alone (ties by earliest submission,
/// then answer id).
pub fn vote_rank_of(
    target: AnswerId,
    answers: &HashMap<AnswerId, Answer>,
    included: &HashMap<AnswerId, ScoreDims>,
    tallies: &HashMap<AnswerId, u64>,
) -> Option<usize> {
    let mut rows: Vec<(AnswerId, u64, u64)> = included
        .keys()
        .filter_map(|id| {
            let answer = answers.get(id)?;
            Some((
                *id,
                tallies.get(id).copied().unwrap_or(0),
                answer.submitted_at,
            ))
        })
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)).then(a.0.cmp(&b.0)));
    rows.iter().position(|r| r.0 == target).map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_types::{AnswerStatus, PlayerId, RoundId, ScoreOrigin, SessionId};

    fn answer(id: u64, player: u64, submitted_at: u64) -> Answer {
        Answer {
            id: AnswerId(id),
            player_id: PlayerId(player),
            round_id: RoundId(1),
            text: format!("answer {id}"),
            status: AnswerStatus::Valid,
            submitted_at,
        }
    }

    fn accepted(id: u64, c: f64, cr: f64, r: f64) -> AcceptedScore {
        AcceptedScore {
            answer_id: AnswerId(id),
            dims: ScoreDims::clamped(c, cr, r),
            origin: ScoreOrigin::LeaderAccepted,
        }
    }

    struct Fixture {
        answers: HashMap<AnswerId, Answer>,
        accepted: HashMap<AnswerId, AcceptedScore>,
        tallies: HashMap<AnswerId, u64>,
    }

    impl Fixture {
        fn inputs<'a>(&'a self, dropped: &'a [AnswerId]) -> RoundInputs<'a> {
            RoundInputs {
                round_id: RoundId(1),
                session_id: SessionId(1),
                answers: &self.answers,
                accepted: &self.accepted,
                dropped,
                tallies: &self.tallies,
            }
        }
    }

    fn fixture(entries: Vec<(Answer, AcceptedScore, u64)>) -> Fixture {
        let mut answers = HashMap::new();
        let mut accepted = HashMap::new();
        let mut tallies = HashMap::new();
        for (a, s, votes) in entries {
            tallies.insert(a.id, votes);
            accepted.insert(a.id, s);
            answers.insert(a.id, a);
        }
        Fixture {
            answers,
            accepted,
            tallies,
        }
    }

    #[test]
    fn blend_matches_documented_example() {
        // Normalized votes 0.8 (4 of max 5), normalized AI 0.5 (avg 5.0).
        // 0.6 * 0.8 + 0.4 * 0.5 = 0.68.
        let fx = fixture(vec![
            (answer(1, 1, 100), accepted(1, 5.0, 5.0, 5.0), 4),
            (answer(2, 2, 200), accepted(2, 9.0, 9.0, 9.0), 5),
        ]);
        let board = finalize_round(&fx.inputs(&[]), &ProtocolConfig::default()).unwrap();
        let entry = board
            .entries
            .iter()
            .find(|e| e.answer_id == AnswerId(1))
            .unwrap();
        assert!((entry.final_score - 0.68).abs() < 1e-12);
    }

    #[test]
    fn ranking_ties_break_by_votes_then_submission() {
        // Identical final scores; b has more votes... make scores equal by
        // construction: same AI dims, same votes -> tie to submission time.
        let fx = fixture(vec![
            (answer(1, 1, 500), accepted(1, 6.0, 6.0, 6.0), 3),
            (answer(2, 2, 100), accepted(2, 6.0, 6.0, 6.0), 3),
        ]);
        let board = finalize_round(&fx.inputs(&[]), &ProtocolConfig::default()).unwrap();
        // Same score and votes: earlier submission (answer 2) ranks first.
        assert_eq!(board.entries[0].answer_id, AnswerId(2));
        assert_eq!(board.entries[1].answer_id, AnswerId(1));
    }

    #[test]
    fn dropped_answers_visible_and_earn_participation() {
        let mut fx = fixture(vec![
            (answer(1, 1, 100), accepted(1, 8.0, 8.0, 8.0), 2),
            (answer(2, 2, 200), accepted(2, 4.0, 4.0, 4.0), 1),
        ]);
        // Answer 3 was valid but dropped; it has no accepted score.
        fx.answers.insert(AnswerId(3), answer(3, 3, 300));
        let dropped = [AnswerId(3)];
        let cfg = ProtocolConfig::default();
        let board = finalize_round(&fx.inputs(&dropped), &cfg).unwrap();

        assert_eq!(board.entries.len(), 2);
        assert_eq!(
            board.dropped,
            vec![ExcludedAnswer {
                answer_id: AnswerId(3),
                player_id: PlayerId(3),
            }]
        );
        let award = board
            .xp_awards
            .iter()
            .find(|a| a.player_id == PlayerId(3))
            .unwrap();
        assert_eq!(award.xp, cfg.participation_xp);
    }

    #[test]
    fn missing_accepted_score_is_an_error() {
        let mut fx = fixture(vec![(answer(1, 1, 100), accepted(1, 8.0, 8.0, 8.0), 2)]);
        fx.answers.insert(AnswerId(2), answer(2, 2, 200));
        let err = finalize_round(&fx.inputs(&[]), &ProtocolConfig::default()).unwrap_err();
        assert_eq!(err, AggregateError::MissingAcceptedScore(AnswerId(2)));
    }

    #[test]
    fn xp_schedule_applies_by_rank() {
        let fx = fixture(vec![
            (answer(1, 1, 100), accepted(1, 9.0, 9.0, 9.0), 5),
            (answer(2, 2, 200), accepted(2, 6.0, 6.0, 6.0), 2),
            (answer(3, 3, 300), accepted(3, 3.0, 3.0, 3.0), 0),
        ]);
        let cfg = ProtocolConfig::default().with_xp_schedule(5, vec![10, 8]);
        let board = finalize_round(&fx.inputs(&[]), &cfg).unwrap();
        let xp_of = |p: u64| {
            board
                .xp_awards
                .iter()
                .find(|a| a.player_id == PlayerId(p))
                .unwrap()
                .xp
        };
        assert_eq!(xp_of(1), 15); // participation 5 + rank-1 bonus 10
        assert_eq!(xp_of(2), 13); // participation 5 + rank-2 bonus 8
        assert_eq!(xp_of(3), 5); // participation only, off the schedule
    }

    #[test]
    fn zero_votes_everywhere_ranks_by_ai_alone() {
        let fx = fixture(vec![
            (answer(1, 1, 100), accepted(1, 2.0, 2.0, 2.0), 0),
            (answer(2, 2, 200), accepted(2, 9.0, 9.0, 9.0), 0),
        ]);
        let board = finalize_round(&fx.inputs(&[]), &ProtocolConfig::default()).unwrap();
        assert_eq!(board.entries[0].answer_id, AnswerId(2));
    }

    #[test]
    fn rank_helpers_agree_with_finalize() {
        let fx = fixture(vec![
            (answer(1, 1, 100), accepted(1, 9.0, 9.0, 9.0), 1),
            (answer(2, 2, 200), accepted(2, 5.0, 5.0, 5.0), 4),
        ]);
        let cfg = ProtocolConfig::default();
        let dims: HashMap<AnswerId, ScoreDims> = fx
            .accepted
            .iter()
            .map(|(id, s)| (*id, s.dims))
            .collect();
        let board = finalize_round(&fx.inputs(&[]), &cfg).unwrap();
        for entry in &board.entries {
            assert_eq!(
                blended_rank_of(entry.answer_id, &fx.answers, &dims, &fx.tallies, &cfg),
                Some(entry.rank)
            );
        }
        // Human-implied rank prefers answer 2 (4 votes vs 1).
        assert_eq!(
            vote_rank_of(AnswerId(2), &fx.answers, &dims, &fx.tallies),
            Some(1)
        );
    }
}
