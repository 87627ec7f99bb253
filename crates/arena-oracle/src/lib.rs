//! Scoring Oracle Adapter.
//!
//! Wraps calls to an external AI scoring service behind a deterministic
//! interface: given a prompt and an answer, return per-dimension scores.
//! The underlying output is non-deterministic and the call is network-bound;
//! neither fact is allowed to leak into the protocol. [`OracleHandle`]
//! absorbs timeouts into sentinel [`OracleOutcome::TimedOut`] values so a
//! round always makes forward progress.
//!
//! Appeal re-scoring uses [`ScoringMode::Strict`]; the stricter prompt
//! variant itself is the prompt source's concern - this adapter only
//! carries the flag.

mod handle;
mod mock;
mod oracle;

pub use handle::OracleHandle;
pub use mock::MockOracle;
pub use oracle::{OracleError, OracleResult, ScoringMode, ScoringOracle};

pub use arena_types::OracleOutcome;
