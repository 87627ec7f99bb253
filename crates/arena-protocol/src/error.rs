//! Error types for arena-protocol.
//!
//! Phase-violation and bond errors are returned synchronously with state
//! unchanged. Oracle failures never appear here - they are absorbed into
//! sentinel outcomes upstream. Only configuration errors are fatal, and
//! only at round construction.

use arena_types::{AnswerId, AppealId, PlayerId, RoundId};
use thiserror::Error;

/// Result type for arena-protocol operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during round and appeal operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Operation attempted outside its valid round phase.
    #[error("invalid phase: expected {expected}, round is {actual}")]
    InvalidPhase {
        expected: &'static str,
        actual: String,
    },

    /// Answer text exceeds the submission limit.
    #[error("answer too long: {len} chars (max {max})")]
    AnswerTooLong { len: usize, max: usize },

    /// Player already submitted this round.
    #[error("player {0} already submitted")]
    AlreadySubmitted(PlayerId),

    /// No such answer, or the answer carries no accepted score.
    #[error("unknown or unscored answer {0}")]
    UnknownAnswer(AnswerId),

    /// No such appeal.
    #[error("unknown appeal {0}")]
    UnknownAppeal(AppealId),

    /// Bond below the configured minimum.
    #[error("insufficient bond: {bond} < minimum {min}")]
    InsufficientBond { bond: u64, min: u64 },

    /// An open appeal already exists under the configured duplicate policy.
    #[error("answer {0} already has an open appeal")]
    AlreadyAppealed(AnswerId),

    /// The nominal challenge window has elapsed; new appeals are closed
    /// even while open ones keep the round in the appeal-window phase.
    #[error("challenge window has closed")]
    WindowClosed,

    /// Finalization attempted before the challenge window elapsed.
    #[error("challenge window still open")]
    WindowStillOpen,

    /// Finalization attempted with unresolved appeals outstanding.
    #[error("{0} open appeal(s) outstanding")]
    OpenAppealsOutstanding(usize),

    /// The round is already finalized; output is written once.
    #[error("round {0} already finalized")]
    AlreadyFinalized(RoundId),

    /// Roster committee does not match the configured committee size.
    #[error("committee size mismatch: configured {expected}, roster has {actual}")]
    CommitteeMismatch { expected: usize, actual: usize },

    /// The validator pool cannot satisfy the appeal committee policy.
    #[error("validator pool too small: need {needed} fresh validators, have {available}")]
    RosterTooSmall { needed: usize, available: usize },

    /// Fatal configuration error at round construction.
    #[error(transparent)]
    Config(#[from] arena_types::ConfigError),

    /// Aggregation invariant violation at finalization.
    #[error(transparent)]
    Aggregate(#[from] arena_aggregate::AggregateError),

    /// The external XP ledger rejected the write.
    #[error("ledger write failed: {0}")]
    Ledger(String),
}
