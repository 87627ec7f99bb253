//! Optimistic-scoring consensus kernel.
//!
//! The oracle is non-deterministic; this crate is not. Everything here is a
//! pure function of the oracle outcomes it is handed, so the whole
//! verification step is replayable and testable without an oracle.
//!
//! # Acceptance rule
//!
//! Per answer:
//! 1. If every committee vector is within tolerance of the leader's on all
//!    three dimensions, the leader's vector is accepted as proposed.
//! 2. Otherwise the per-dimension **median** of the non-failed committee
//!    vectors replaces it. Median, not mean: a single outlier committee
//!    member cannot drag the result.
//! 3. A leader sentinel (timed-out call) is a mandatory committee-reject.
//! 4. If every committee vector also failed, the answer is dropped from the
//!    round entirely - reported, never silently omitted.

mod equivalence;
mod resolve;

pub use equivalence::within_tolerance;
pub use resolve::{median_dims, resolve_answer, Verdict};

#[cfg(test)]
mod tests {
    use super::*;
    use arena_types::{ScoreDims, Tolerance};

    #[test]
    fn acceptance_rule_matches_documented_order() {
        // Leader sentinel forces replacement even with agreeing committee.
        let committee = vec![arena_types::OracleOutcome::Scored(ScoreDims::clamped(
            5.0, 5.0, 5.0,
        ))];
        let verdict = resolve_answer(
            &arena_types::OracleOutcome::TimedOut,
            &committee,
            &Tolerance::uniform(10.0),
        );
        assert!(matches!(verdict, Verdict::CommitteeReplaced(_)));
    }
}
