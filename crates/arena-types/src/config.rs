//! Protocol configuration.
//!
//! All business values live here rather than in the components: weights,
//! tolerances, bond minimum, window and timeout durations, XP schedule, and
//! the two policy knobs the protocol deliberately leaves open (duplicate
//! appeals, appeal committee relationship).
//!
//! Construction is builder style:
//! `ProtocolConfig::default().with_*(..)`, then [`ProtocolConfig::validated`]
//! before use. Weight validation failure is fatal at round construction.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance allowed when comparing the human/AI weight sum to 1.0.
pub const WEIGHT_EPSILON: f64 = 1e-9;

/// Per-dimension score tolerance for the equivalence check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub clarity: f64,
    pub creativity: f64,
    pub relevance: f64,
}

impl Tolerance {
    /// Same tolerance on every dimension.
    pub const fn uniform(t: f64) -> Self {
        Self {
            clarity: t,
            creativity: t,
            relevance: t,
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        // Documented default; callers with tighter SLAs override per dim.
        Self::uniform(2.0)
    }
}

/// How many open appeals may coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateAppealPolicy {
    /// One open appeal per answer at a time (default; avoids duplicate
    /// committee work on the same answer).
    PerAnswer,
    /// One open appeal per (answer, challenger) pair.
    PerChallenger,
}

/// Relationship between the verifying committee and the appeal committee.
///
/// Either way, the appeal committee must include validators who did not
/// originally score the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealCommitteePolicy {
    /// Original committee plus `extra` fresh validators from the pool.
    Superset { extra: usize },
    /// Entirely fresh validators, same size as the original committee.
    Disjoint,
}

/// Reward granted to a challenger whose appeal is upheld.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealReward {
    Fixed(u64),
    /// Multiplier on the posted bond, e.g. `0.5` rewards half the bond.
    ProportionalToBond(f64),
}

impl AppealReward {
    /// Reward amount for a given bond.
    pub fn amount(&self, bond: u64) -> u64 {
        match self {
            Self::Fixed(v) => *v,
            Self::ProportionalToBond(factor) => (bond as f64 * factor).floor() as u64,
        }
    }
}

/// Full recognized configuration surface of the protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Weight of the normalized human vote score. Must sum to 1.0 with
    /// `ai_weight` within [`WEIGHT_EPSILON`].
    pub human_weight: f64,
    /// Weight of the normalized AI score.
    pub ai_weight: f64,
    pub tolerance: Tolerance,
    /// Minimum bond to file an appeal.
    pub min_bond: u64,
    /// Nominal appeal window duration.
    pub challenge_window: Duration,
    /// Per-call oracle timeout; expiry yields a sentinel vector.
    pub oracle_timeout: Duration,
    /// Timeout for an appeal's entire expanded-committee re-scoring;
    /// expiry resolves the appeal as rejected.
    pub appeal_timeout: Duration,
    /// Bonus XP by rank: index 0 is rank 1. Length is the "top N".
    pub top_n_bonus: Vec<u64>,
    /// Flat XP for every valid answer, dropped or not.
    pub participation_xp: u64,
    pub committee_size: usize,
    /// Maximum concurrent oracle calls per round phase.
    pub scoring_fanout: usize,
    pub duplicate_appeal_policy: DuplicateAppealPolicy,
    pub appeal_committee: AppealCommitteePolicy,
    pub appeal_reward: AppealReward,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            human_weight: 0.60,
            ai_weight: 0.40,
            tolerance: Tolerance::default(),
            min_bond: 10,
            challenge_window: Duration::from_secs(60),
            oracle_timeout: Duration::from_secs(10),
            appeal_timeout: Duration::from_secs(30),
            top_n_bonus: vec![10, 8, 6, 4, 2],
            participation_xp: 5,
            committee_size: 3,
            scoring_fanout: 8,
            duplicate_appeal_policy: DuplicateAppealPolicy::PerAnswer,
            appeal_committee: AppealCommitteePolicy::Superset { extra: 2 },
            appeal_reward: AppealReward::Fixed(10),
        }
    }
}

impl ProtocolConfig {
    /// Set both blend weights.
    #[must_use]
    pub fn with_weights(mut self, human: f64, ai: f64) -> Self {
        self.human_weight = human;
        self.ai_weight = ai;
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_min_bond(mut self, min_bond: u64) -> Self {
        self.min_bond = min_bond;
        self
    }

    #[must_use]
    pub fn with_challenge_window(mut self, window: Duration) -> Self {
        self.challenge_window = window;
        self
    }

    #[must_use]
    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_appeal_timeout(mut self, timeout: Duration) -> Self {
        self.appeal_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_committee_size(mut self, size: usize) -> Self {
        self.committee_size = size;
        self
    }

    #[must_use]
    pub fn with_duplicate_appeal_policy(mut self, policy: DuplicateAppealPolicy) -> Self {
        self.duplicate_appeal_policy = policy;
        self
    }

    #[must_use]
    pub fn with_appeal_committee(mut self, policy: AppealCommitteePolicy) -> Self {
        self.appeal_committee = policy;
        self
    }

    #[must_use]
    pub fn with_appeal_reward(mut self, reward: AppealReward) -> Self {
        self.appeal_reward = reward;
        self
    }

    #[must_use]
    pub fn with_xp_schedule(mut self, participation_xp: u64, top_n_bonus: Vec<u64>) -> Self {
        self.participation_xp = participation_xp;
        self.top_n_bonus = top_n_bonus;
        self
    }

    /// Validate the configuration. Weight-sum violations are fatal at round
    /// construction time.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let sum = self.human_weight + self.ai_weight;
        if (sum - 1.0).abs() > WEIGHT_EPSILON {
            return Err(ConfigError::WeightConfigInvalid {
                human: self.human_weight,
                ai: self.ai_weight,
            });
        }
        if self.human_weight < 0.0 || self.ai_weight < 0.0 {
            return Err(ConfigError::WeightConfigInvalid {
                human: self.human_weight,
                ai: self.ai_weight,
            });
        }
        if self.committee_size == 0 {
            return Err(ConfigError::EmptyCommittee);
        }
        if self.scoring_fanout == 0 {
            return Err(ConfigError::ZeroFanout);
        }
        Ok(self)
    }
}

/// Configuration construction errors. The only fatal error class in the
/// protocol: everything downstream either rejects the action or degrades.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("blend weights must sum to 1.0: human={human}, ai={ai}")]
    WeightConfigInvalid { human: f64, ai: f64 },

    #[error("committee size must be at least 1")]
    EmptyCommittee,

    #[error("scoring fan-out must be at least 1")]
    ZeroFanout,
}
