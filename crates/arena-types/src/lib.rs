//! Core data model for the Arena optimistic-scoring protocol.
//!
//! Arena reaches agreement on non-deterministic AI judgments the same way
//! optimistic rollups reach agreement on execution: one party proposes, a
//! committee checks, and anyone may contest the result by posting a bond.
//!
//! # Roles, not types
//!
//! "Leader" and "committee member" are dynamic role assignments over a fixed
//! validator pool, resolved per round. They are modeled as role-tagged
//! [`ValidatorId`]s, never as distinct participant types.
//!
//! # Determinism
//!
//! The oracle is non-deterministic by nature; the protocol is not. Given a
//! fixed set of oracle responses, every downstream decision (equivalence,
//! median replacement, ranking, appeal outcome) is a pure function of those
//! responses. Nothing in this crate reads a clock - timestamps are supplied
//! by callers.

mod answer;
mod appeal;
mod config;
mod id;
mod score;

pub use answer::{Answer, AnswerStatus, HumanVoteTally, RoundPhase, MAX_ANSWER_LEN};
pub use appeal::{Appeal, AppealStatus};
pub use config::{
    AppealCommitteePolicy, AppealReward, ConfigError, DuplicateAppealPolicy, ProtocolConfig,
    Tolerance, WEIGHT_EPSILON,
};
pub use id::{AnswerId, AppealId, PlayerId, RoundId, SessionId, ValidatorId};
pub use score::{AcceptedScore, OracleOutcome, ScoreDims, ScoreOrigin, ScoreSource, ScoreVector};
