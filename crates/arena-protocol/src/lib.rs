//! Arena Protocol - Optimistic Scoring with Bonded Appeals
//!
//! This crate drives agreement on non-deterministic AI judgments. A leader
//! validator optimistically proposes per-answer scores, a committee
//! independently recomputes them and accepts or replaces the proposal, and
//! anyone may contest an accepted score during a fixed window by posting a
//! bond.
//!
//! # Overview
//!
//! ## Round Coordination
//!
//! [`RoundCoordinator`] owns one round's linear state machine:
//!
//! - **collecting**: players submit short answers; moderation rules on them
//! - **scoring**: the leader proposes one score vector per valid answer
//! - **verifying**: the committee recomputes; agreement within tolerance
//!   accepts the leader, disagreement takes the committee median
//! - **appeal_window**: bonded appeals may contest accepted scores
//! - **finalized**: votes and AI scores blend into a ranked leaderboard
//!
//! ## Appeals
//!
//! [`AppealManager`] escrows bonds, re-scores contested answers with an
//! expanded committee in strict mode, and releases each bond exactly once:
//! refund plus reward when upheld, slash when rejected. Resolution is
//! idempotent.
//!
//! # Example
//!
//! ```rust,ignore
//! use arena_protocol::{RoundCoordinator, RoundRoster, MemoryLedger, tally_map};
//!
//! let mut round = RoundCoordinator::new(
//!     round_id, session_id, prompt, roster, config, oracle,
//! )?;
//! let answer = round.submit_answer(player, text, now)?;
//! round.set_moderation(answer, AnswerStatus::Valid)?;
//! round.close_submissions()?;
//! round.run_scoring().await?;
//! round.run_verification(now).await?;
//! round.wait_for_window().await;
//! let board = round.finalize(&tally_map(&tallies), &mut ledger, now)?;
//! ```

pub mod appeal;
pub mod error;
pub mod external;
pub mod roster;
pub mod round;

pub use appeal::{AppealManager, AppealResolution, BondEscrow};
pub use error::{Error, Result};
pub use external::{tally_map, LedgerError, MemoryLedger, PromptSource, XpLedger};
pub use roster::RoundRoster;
pub use round::RoundCoordinator;

// Re-export the core model types for convenience
pub use arena_types::{
    AcceptedScore, Answer, AnswerId, AnswerStatus, Appeal, AppealId, AppealStatus, PlayerId,
    ProtocolConfig, RoundId, RoundPhase, ScoreOrigin, SessionId, Tolerance, ValidatorId,
};
