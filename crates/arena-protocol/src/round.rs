//! Round Coordinator - one round's state machine from submission to
//! finalized leaderboard.
//!
//! # Phases
//!
//! `collecting → scoring → verifying → appeal_window → finalized`, strictly
//! linear with no backward edges. Within a phase, oracle work fans out in
//! parallel (bounded by `scoring_fanout`) and results land in maps keyed by
//! answer id, so nothing depends on completion order. Across phases,
//! transitions are strictly sequential: no answer is scored before
//! collecting closes, no appeal is possible before verification completes.
//!
//! # Clocks
//!
//! The coordinator never reads wall time. Callers pass millisecond
//! timestamps (`now_ms`) wherever the protocol records or compares time,
//! which keeps every decision replayable. The only real timers are the
//! oracle/appeal timeouts and the optional [`RoundCoordinator::wait_for_window`]
//! helper.
//!
//! # Single writer
//!
//! One coordinator owns one round's mutable state (accepted scores and the
//! bond escrow). Rounds in different sessions share nothing and progress
//! fully in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use arena_aggregate::{blended_rank_of, finalize_round, vote_rank_of, Leaderboard, RoundInputs};
use arena_consensus::{median_dims, resolve_answer, within_tolerance, Verdict};
use arena_oracle::{OracleHandle, ScoringMode, ScoringOracle};
use arena_types::{
    AcceptedScore, Answer, AnswerId, AnswerStatus, Appeal, AppealId, OracleOutcome, PlayerId,
    ProtocolConfig, RoundId, RoundPhase, ScoreDims, ScoreOrigin, ScoreSource, ScoreVector,
    SessionId, MAX_ANSWER_LEN,
};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::appeal::{AppealManager, AppealResolution, BondEscrow};
use crate::error::{Error, Result};
use crate::external::XpLedger;
use crate::roster::RoundRoster;

/// Drives one round through proposal, verification, appeals, and
/// finalization.
pub struct RoundCoordinator {
    round_id: RoundId,
    session_id: SessionId,
    prompt: String,
    config: ProtocolConfig,
    roster: RoundRoster,
    oracle: OracleHandle,
    phase: RoundPhase,
    answers: HashMap<AnswerId, Answer>,
    by_player: HashMap<PlayerId, AnswerId>,
    /// Valid answers that entered scoring, in submission-id order.
    scoring_set: Vec<AnswerId>,
    leader_outcomes: HashMap<AnswerId, OracleOutcome>,
    committee_vectors: HashMap<AnswerId, Vec<ScoreVector>>,
    accepted: HashMap<AnswerId, AcceptedScore>,
    dropped: Vec<AnswerId>,
    appeals: AppealManager,
    next_answer_id: u64,
    expected_players: Option<usize>,
    window_opened_at: Option<u64>,
    leaderboard: Option<Leaderboard>,
}

impl RoundCoordinator {
    /// Create a coordinator for a fresh round.
    ///
    /// Configuration is validated here; a bad weight sum halts round
    /// creation, the only fatal error class in the protocol.
    pub fn new(
        round_id: RoundId,
        session_id: SessionId,
        prompt: String,
        roster: RoundRoster,
        config: ProtocolConfig,
        oracle: Arc<dyn ScoringOracle>,
    ) -> Result<Self> {
        let config = config.validated()?;
        if roster.committee.len() != config.committee_size {
            return Err(Error::CommitteeMismatch {
                expected: config.committee_size,
                actual: roster.committee.len(),
            });
        }
        let oracle = OracleHandle::new(oracle, config.oracle_timeout);
        let appeals = AppealManager::new(
            config.min_bond,
            config.duplicate_appeal_policy,
            config.appeal_reward,
        );
        info!(round = %round_id, session = %session_id, "round created");
        Ok(Self {
            round_id,
            session_id,
            prompt,
            config,
            roster,
            oracle,
            phase: RoundPhase::Collecting,
            answers: HashMap::new(),
            by_player: HashMap::new(),
            scoring_set: Vec::new(),
            leader_outcomes: HashMap::new(),
            committee_vectors: HashMap::new(),
            accepted: HashMap::new(),
            dropped: Vec::new(),
            appeals,
            next_answer_id: 1,
            expected_players: None,
            window_opened_at: None,
            leaderboard: None,
        })
    }

    /// Declare how many players are expected to submit; lets the session
    /// layer close submissions early via [`all_submitted`](Self::all_submitted).
    #[must_use]
    pub fn with_expected_players(mut self, expected: usize) -> Self {
        self.expected_players = Some(expected);
        self
    }

    pub fn round_id(&self) -> RoundId {
        self.round_id
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn answer(&self, id: AnswerId) -> Option<&Answer> {
        self.answers.get(&id)
    }

    pub fn accepted_score(&self, id: AnswerId) -> Option<&AcceptedScore> {
        self.accepted.get(&id)
    }

    /// Answers dropped during verification (every committee call failed).
    pub fn dropped(&self) -> &[AnswerId] {
        &self.dropped
    }

    pub fn appeal(&self, id: AppealId) -> Option<&Appeal> {
        self.appeals.appeal(id)
    }

    pub fn open_appeals(&self) -> usize {
        self.appeals.open_count()
    }

    pub fn escrow(&self) -> &BondEscrow {
        self.appeals.escrow()
    }

    pub fn leaderboard(&self) -> Option<&Leaderboard> {
        self.leaderboard.as_ref()
    }

    /// All score vectors proposed for an answer: the leader's (if its call
    /// succeeded) followed by each committee member's.
    pub fn score_vectors(&self, id: AnswerId) -> Vec<ScoreVector> {
        let mut vectors = Vec::new();
        if let Some(dims) = self.leader_outcomes.get(&id).and_then(|o| o.dims()) {
            vectors.push(ScoreVector {
                answer_id: id,
                source: ScoreSource::Leader,
                dims: *dims,
            });
        }
        if let Some(committee) = self.committee_vectors.get(&id) {
            vectors.extend(committee.iter().copied());
        }
        vectors
    }

    fn require_phase(&self, want: RoundPhase, expected: &'static str) -> Result<()> {
        if self.phase == want {
            Ok(())
        } else {
            Err(Error::InvalidPhase {
                expected,
                actual: self.phase.to_string(),
            })
        }
    }

    /// End of the nominal challenge window, once verification has opened it.
    fn window_deadline_ms(&self) -> Option<u64> {
        self.window_opened_at
            .map(|opened| opened + self.config.challenge_window.as_millis() as u64)
    }

    // ----- collecting ------------------------------------------------------

    /// Accept one player's submission. One answer per player per round;
    /// answers start `Pending` until moderation rules on them.
    pub fn submit_answer(
        &mut self,
        player_id: PlayerId,
        text: String,
        now_ms: u64,
    ) -> Result<AnswerId> {
        self.require_phase(RoundPhase::Collecting, "collecting")?;
        let len = text.chars().count();
        if len > MAX_ANSWER_LEN {
            return Err(Error::AnswerTooLong {
                len,
                max: MAX_ANSWER_LEN,
            });
        }
        if self.by_player.contains_key(&player_id) {
            return Err(Error::AlreadySubmitted(player_id));
        }

        let id = AnswerId(self.next_answer_id);
        self.next_answer_id += 1;
        self.answers.insert(
            id,
            Answer {
                id,
                player_id,
                round_id: self.round_id,
                text,
                status: AnswerStatus::Pending,
                submitted_at: now_ms,
            },
        );
        self.by_player.insert(player_id, id);
        debug!(round = %self.round_id, answer = %id, player = %player_id, "answer submitted");
        Ok(id)
    }

    /// True when every expected player has submitted (if a count was set).
    pub fn all_submitted(&self) -> bool {
        self.expected_players
            .map(|expected| self.answers.len() >= expected)
            .unwrap_or(false)
    }

    /// Record the external moderation verdict for an answer. Allowed only
    /// while collecting; statuses are immutable once scoring starts.
    pub fn set_moderation(&mut self, id: AnswerId, status: AnswerStatus) -> Result<()> {
        self.require_phase(RoundPhase::Collecting, "collecting")?;
        let answer = self.answers.get_mut(&id).ok_or(Error::UnknownAnswer(id))?;
        answer.status = status;
        Ok(())
    }

    /// Close the submission phase. Only `Valid` answers enter scoring.
    /// Returns how many did.
    pub fn close_submissions(&mut self) -> Result<usize> {
        self.require_phase(RoundPhase::Collecting, "collecting")?;
        let mut ids: Vec<AnswerId> = self
            .answers
            .values()
            .filter(|a| a.status == AnswerStatus::Valid)
            .map(|a| a.id)
            .collect();
        ids.sort();
        let excluded = self.answers.len() - ids.len();
        info!(
            round = %self.round_id,
            scoring = ids.len(),
            excluded,
            "submissions closed"
        );
        self.scoring_set = ids;
        self.phase = RoundPhase::Scoring;
        Ok(self.scoring_set.len())
    }

    // ----- scoring ---------------------------------------------------------

    /// Leader role: propose one score vector per valid answer.
    ///
    /// Calls fan out with a bounded limit; a call that exceeds the oracle
    /// timeout yields a sentinel outcome and the round moves on. Advances
    /// to `verifying` automatically.
    pub async fn run_scoring(&mut self) -> Result<()> {
        self.require_phase(RoundPhase::Scoring, "scoring")?;

        let jobs: Vec<(AnswerId, String)> = self
            .scoring_set
            .iter()
            .filter_map(|id| self.answers.get(id).map(|a| (*id, a.text.clone())))
            .collect();
        let prompt = self.prompt.clone();
        let oracle = self.oracle.clone();

        let outcomes: Vec<(AnswerId, OracleOutcome)> = stream::iter(jobs)
            .map(|(id, text)| {
                let oracle = oracle.clone();
                let prompt = prompt.clone();
                async move {
                    let outcome = oracle.score(&prompt, &text, ScoringMode::Standard).await;
                    (id, outcome)
                }
            })
            .buffer_unordered(self.config.scoring_fanout)
            .collect()
            .await;

        let timed_out = outcomes.iter().filter(|(_, o)| o.is_timed_out()).count();
        if timed_out > 0 {
            warn!(round = %self.round_id, timed_out, "leader proposals incomplete");
        }
        self.leader_outcomes = outcomes.into_iter().collect();
        self.phase = RoundPhase::Verifying;
        debug!(round = %self.round_id, "leader proposals collected");
        Ok(())
    }

    // ----- verifying -------------------------------------------------------

    /// Committee role: independently re-score every answer and settle each
    /// one's accepted score. Opens the appeal window at `now_ms`.
    pub async fn run_verification(&mut self, now_ms: u64) -> Result<()> {
        self.require_phase(RoundPhase::Verifying, "verifying")?;

        let jobs: Vec<(AnswerId, arena_types::ValidatorId, String)> = self
            .scoring_set
            .iter()
            .filter_map(|id| self.answers.get(id))
            .flat_map(|a| {
                self.roster
                    .committee
                    .iter()
                    .map(move |v| (a.id, *v, a.text.clone()))
            })
            .collect();
        let prompt = self.prompt.clone();
        let oracle = self.oracle.clone();

        let results: Vec<(AnswerId, arena_types::ValidatorId, OracleOutcome)> = stream::iter(jobs)
            .map(|(id, validator, text)| {
                let oracle = oracle.clone();
                let prompt = prompt.clone();
                async move {
                    let outcome = oracle.score(&prompt, &text, ScoringMode::Standard).await;
                    (id, validator, outcome)
                }
            })
            .buffer_unordered(self.config.scoring_fanout)
            .collect()
            .await;

        let mut per_answer: HashMap<AnswerId, Vec<OracleOutcome>> = HashMap::new();
        for (id, validator, outcome) in results {
            if let Some(dims) = outcome.dims() {
                self.committee_vectors.entry(id).or_default().push(ScoreVector {
                    answer_id: id,
                    source: ScoreSource::Committee(validator),
                    dims: *dims,
                });
            }
            per_answer.entry(id).or_default().push(outcome);
        }

        for id in self.scoring_set.clone() {
            let leader = self
                .leader_outcomes
                .get(&id)
                .copied()
                .unwrap_or(OracleOutcome::TimedOut);
            let committee = per_answer.remove(&id).unwrap_or_default();
            match resolve_answer(&leader, &committee, &self.config.tolerance) {
                Verdict::LeaderAccepted(dims) => {
                    self.accepted.insert(
                        id,
                        AcceptedScore {
                            answer_id: id,
                            dims,
                            origin: ScoreOrigin::LeaderAccepted,
                        },
                    );
                }
                Verdict::CommitteeReplaced(dims) => {
                    debug!(round = %self.round_id, answer = %id, "leader proposal replaced by committee median");
                    self.accepted.insert(
                        id,
                        AcceptedScore {
                            answer_id: id,
                            dims,
                            origin: ScoreOrigin::CommitteeReplaced,
                        },
                    );
                }
                Verdict::Dropped => {
                    warn!(round = %self.round_id, answer = %id, "all committee scores failed, answer dropped");
                    self.dropped.push(id);
                }
            }
        }

        self.phase = RoundPhase::AppealWindow;
        self.window_opened_at = Some(now_ms);
        info!(
            round = %self.round_id,
            accepted = self.accepted.len(),
            dropped = self.dropped.len(),
            "verification complete, appeal window open"
        );
        Ok(())
    }

    // ----- appeal window ---------------------------------------------------

    /// File a bonded appeal against an answer's accepted score.
    ///
    /// Permitted only while the nominal window is open; open appeals may
    /// extend the round past the window, but never admit new ones.
    pub fn file_appeal(
        &mut self,
        challenger_id: PlayerId,
        answer_id: AnswerId,
        bond: u64,
        now_ms: u64,
    ) -> Result<AppealId> {
        self.require_phase(RoundPhase::AppealWindow, "appeal_window")?;
        if let Some(deadline) = self.window_deadline_ms() {
            if now_ms >= deadline {
                return Err(Error::WindowClosed);
            }
        }
        if !self.accepted.contains_key(&answer_id) {
            return Err(Error::UnknownAnswer(answer_id));
        }
        self.appeals.file(answer_id, challenger_id, bond, now_ms)
    }

    /// Resolve one appeal by expanded-committee re-scoring in strict mode.
    ///
    /// Upheld iff the new consensus differs from the accepted score beyond
    /// tolerance on any dimension AND moves the answer's rank strictly
    /// closer to its human-vote-implied rank. Expiry of the whole
    /// re-scoring budget resolves as rejected. Idempotent: a resolved
    /// appeal returns its stored result.
    pub async fn resolve_appeal(
        &mut self,
        appeal_id: AppealId,
        tallies: &HashMap<AnswerId, u64>,
        now_ms: u64,
    ) -> Result<AppealResolution> {
        self.require_phase(RoundPhase::AppealWindow, "appeal_window")?;
        if let Some(done) = self.appeals.resolution(appeal_id) {
            return Ok(done.clone());
        }
        let appeal = self
            .appeals
            .appeal(appeal_id)
            .ok_or(Error::UnknownAppeal(appeal_id))?
            .clone();
        let current = *self
            .accepted
            .get(&appeal.answer_id)
            .ok_or(Error::UnknownAnswer(appeal.answer_id))?;
        let text = self
            .answers
            .get(&appeal.answer_id)
            .ok_or(Error::UnknownAnswer(appeal.answer_id))?
            .text
            .clone();

        let committee = self.roster.expanded_committee(self.config.appeal_committee)?;
        debug!(
            appeal = %appeal_id,
            committee = committee.len(),
            "expanded committee re-scoring"
        );

        let prompt = self.prompt.clone();
        let oracle = self.oracle.clone();
        let fanout = self.config.scoring_fanout;
        let rescore = async {
            stream::iter(committee)
                .map(|_validator| {
                    let oracle = oracle.clone();
                    let prompt = prompt.clone();
                    let text = text.clone();
                    async move { oracle.score(&prompt, &text, ScoringMode::Strict).await }
                })
                .buffer_unordered(fanout)
                .collect::<Vec<OracleOutcome>>()
                .await
        };
        let outcomes = match tokio::time::timeout(self.config.appeal_timeout, rescore).await {
            Ok(outcomes) => outcomes,
            Err(_elapsed) => {
                warn!(appeal = %appeal_id, "appeal re-scoring timed out, rejecting");
                return self.appeals.resolve(appeal_id, None, now_ms);
            }
        };

        let scored: Vec<ScoreDims> = outcomes.iter().filter_map(|o| o.dims().copied()).collect();
        let corrected = median_dims(&scored)
            .filter(|consensus| self.appeal_upheld(appeal.answer_id, &current, consensus, tallies));

        if let Some(dims) = corrected {
            self.accepted.insert(
                appeal.answer_id,
                AcceptedScore {
                    answer_id: appeal.answer_id,
                    dims,
                    origin: ScoreOrigin::AppealCorrected,
                },
            );
        }
        self.appeals.resolve(appeal_id, corrected, now_ms)
    }

    /// Decide whether a re-scored consensus justifies correction.
    fn appeal_upheld(
        &self,
        target: AnswerId,
        current: &AcceptedScore,
        consensus: &ScoreDims,
        tallies: &HashMap<AnswerId, u64>,
    ) -> bool {
        if within_tolerance(consensus, &current.dims, &self.config.tolerance) {
            return false;
        }
        let mut dims: HashMap<AnswerId, ScoreDims> = self
            .accepted
            .iter()
            .map(|(id, score)| (*id, score.dims))
            .collect();
        let old_rank = blended_rank_of(target, &self.answers, &dims, tallies, &self.config);
        let human_rank = vote_rank_of(target, &self.answers, &dims, tallies);
        dims.insert(target, *consensus);
        let new_rank = blended_rank_of(target, &self.answers, &dims, tallies, &self.config);

        match (old_rank, new_rank, human_rank) {
            (Some(old), Some(new), Some(human)) => {
                (new as i64 - human as i64).abs() < (old as i64 - human as i64).abs()
            }
            _ => false,
        }
    }

    /// Sleep out the nominal challenge window.
    pub async fn wait_for_window(&self) {
        tokio::time::sleep(self.config.challenge_window).await;
    }

    // ----- finalization ----------------------------------------------------

    /// Close the round: aggregate scores and votes, emit XP, persist the
    /// leaderboard exactly once.
    ///
    /// Requires the nominal window to have elapsed and every appeal to be
    /// resolved; open appeals keep the round in the appeal-window phase
    /// however long their resolution takes.
    pub fn finalize(
        &mut self,
        tallies: &HashMap<AnswerId, u64>,
        ledger: &mut dyn XpLedger,
        now_ms: u64,
    ) -> Result<Leaderboard> {
        match self.phase {
            RoundPhase::Finalized => return Err(Error::AlreadyFinalized(self.round_id)),
            RoundPhase::AppealWindow => {}
            _ => {
                return Err(Error::InvalidPhase {
                    expected: "appeal_window",
                    actual: self.phase.to_string(),
                })
            }
        }
        if let Some(deadline) = self.window_deadline_ms() {
            if now_ms < deadline {
                return Err(Error::WindowStillOpen);
            }
        }
        let open = self.appeals.open_count();
        if open > 0 {
            return Err(Error::OpenAppealsOutstanding(open));
        }

        let answers: HashMap<AnswerId, Answer> = self
            .scoring_set
            .iter()
            .filter_map(|id| self.answers.get(id).map(|a| (*id, a.clone())))
            .collect();
        let inputs = RoundInputs {
            round_id: self.round_id,
            session_id: self.session_id,
            answers: &answers,
            accepted: &self.accepted,
            dropped: &self.dropped,
            tallies,
        };
        let board = finalize_round(&inputs, &self.config)?;
        ledger
            .persist(self.session_id, &board)
            .map_err(|e| Error::Ledger(e.to_string()))?;

        self.leaderboard = Some(board.clone());
        self.phase = RoundPhase::Finalized;
        info!(
            round = %self.round_id,
            ranked = board.entries.len(),
            dropped = board.dropped.len(),
            "round finalized"
        );
        Ok(board)
    }
}

impl std::fmt::Debug for RoundCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundCoordinator")
            .field("round_id", &self.round_id)
            .field("phase", &self.phase)
            .field("answers", &self.answers.len())
            .field("open_appeals", &self.appeals.open_count())
            .finish_non_exhaustive()
    }
}
