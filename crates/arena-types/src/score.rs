//! Score vectors and their provenance.
//!
//! A [`ScoreVector`] is one proposer's opinion of one answer. Many may exist
//! per answer (one from the leader, one per committee member); exactly one
//! becomes the [`AcceptedScore`] during verification, and only a successful
//! appeal may replace it afterwards.

use serde::{Deserialize, Serialize};

use crate::id::{AnswerId, ValidatorId};

/// The three judged dimensions, each in `[0, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreDims {
    pub clarity: f64,
    pub creativity: f64,
    pub relevance: f64,
}

impl ScoreDims {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 10.0;

    /// Construct with every dimension clamped into `[0, 10]`.
    pub fn clamped(clarity: f64, creativity: f64, relevance: f64) -> Self {
        let clamp = |v: f64| v.clamp(Self::MIN, Self::MAX);
        Self {
            clarity: clamp(clarity),
            creativity: clamp(creativity),
            relevance: clamp(relevance),
        }
    }

    /// Sum over dimensions.
    pub fn total(&self) -> f64 {
        self.clarity + self.creativity + self.relevance
    }

    /// Mean over dimensions, in `[0, 10]`.
    pub fn average(&self) -> f64 {
        self.total() / 3.0
    }
}

/// Who proposed a score vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreSource {
    /// The round leader's optimistic proposal.
    Leader,
    /// An independent recomputation by a committee member.
    Committee(ValidatorId),
}

/// One proposer's score for one answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreVector {
    pub answer_id: AnswerId,
    pub source: ScoreSource,
    pub dims: ScoreDims,
}

/// Result of a single oracle call, after timeout absorption.
///
/// A timed-out call is never an error at round level: it becomes this
/// sentinel and forces the answer down the committee-replacement path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OracleOutcome {
    Scored(ScoreDims),
    TimedOut,
}

impl OracleOutcome {
    pub fn dims(&self) -> Option<&ScoreDims> {
        match self {
            Self::Scored(dims) => Some(dims),
            Self::TimedOut => None,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}

/// How an answer's authoritative score came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreOrigin {
    /// Every committee vector agreed with the leader within tolerance.
    LeaderAccepted,
    /// Committee disagreement (or a leader sentinel); per-dimension median
    /// of the non-failed committee vectors.
    CommitteeReplaced,
    /// Rewritten by an upheld appeal's expanded-committee consensus.
    AppealCorrected,
}

/// The authoritative score for an answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptedScore {
    pub answer_id: AnswerId,
    pub dims: ScoreDims,
    pub origin: ScoreOrigin,
}
