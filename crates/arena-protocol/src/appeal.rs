//! Bonded appeals and bond escrow.
//!
//! The escrow ledger is the only mutable shared state besides the accepted
//! scores, and every mutation happens inside the manager's resolution path,
//! serialized per round. Conservation invariant: each posted bond is
//! released exactly once, as either a refund (upheld) or a slash
//! (rejected). The challenger reward is minted on top of the refund, not
//! carved out of the bond.

use std::collections::HashMap;

use arena_types::{
    Appeal, AppealId, AppealReward, AppealStatus, AnswerId, DuplicateAppealPolicy, PlayerId,
    ScoreDims,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Running bond accounting for one round.
///
/// The conservation identity is over the bond flow alone:
/// `refunded + slashed == posted` once every appeal is resolved. Rewards
/// are minted outside that flow and tracked separately in `rewarded`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondEscrow {
    pub posted: u64,
    pub refunded: u64,
    pub slashed: u64,
    /// Minted challenger rewards; not part of the bond flow.
    pub rewarded: u64,
}

impl BondEscrow {
    /// Holds once every appeal is resolved.
    pub fn is_conserved(&self) -> bool {
        self.refunded + self.slashed == self.posted
    }

    /// Bonds still held in escrow.
    pub fn outstanding(&self) -> u64 {
        self.posted - self.refunded - self.slashed
    }
}

/// Stored outcome of a resolved appeal. Returned verbatim on re-invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppealResolution {
    pub appeal_id: AppealId,
    pub status: AppealStatus,
    pub bond: u64,
    /// Refund to the challenger (the full bond when upheld, zero when
    /// rejected).
    pub refund: u64,
    pub reward: u64,
    /// The corrected score applied to the answer, when upheld.
    pub corrected: Option<ScoreDims>,
}

/// Owns appeals, their resolutions, and the bond escrow for one round.
///
/// Phase checks stay with the round coordinator; the manager enforces bond
/// rules, the duplicate policy, and exactly-once release.
#[derive(Debug)]
pub struct AppealManager {
    min_bond: u64,
    policy: DuplicateAppealPolicy,
    reward: AppealReward,
    next_id: u64,
    appeals: HashMap<AppealId, Appeal>,
    resolutions: HashMap<AppealId, AppealResolution>,
    escrow: BondEscrow,
}

impl AppealManager {
    pub fn new(min_bond: u64, policy: DuplicateAppealPolicy, reward: AppealReward) -> Self {
        Self {
            min_bond,
            policy,
            reward,
            next_id: 1,
            appeals: HashMap::new(),
            resolutions: HashMap::new(),
            escrow: BondEscrow::default(),
        }
    }

    /// File an appeal against an answer's accepted score. The bond is
    /// escrowed atomically with creation.
    pub fn file(
        &mut self,
        answer_id: AnswerId,
        challenger_id: PlayerId,
        bond: u64,
        now_ms: u64,
    ) -> Result<AppealId> {
        if bond < self.min_bond {
            return Err(Error::InsufficientBond {
                bond,
                min: self.min_bond,
            });
        }

        let duplicate = self.appeals.values().any(|a| {
            a.status == AppealStatus::Open
                && a.answer_id == answer_id
                && match self.policy {
                    DuplicateAppealPolicy::PerAnswer => true,
                    DuplicateAppealPolicy::PerChallenger => a.challenger_id == challenger_id,
                }
        });
        if duplicate {
            return Err(Error::AlreadyAppealed(answer_id));
        }

        let id = AppealId(self.next_id);
        self.next_id += 1;
        self.appeals.insert(
            id,
            Appeal {
                id,
                answer_id,
                challenger_id,
                bond,
                status: AppealStatus::Open,
                created_at: now_ms,
                resolved_at: None,
            },
        );
        self.escrow.posted += bond;

        info!(appeal = %id, answer = %answer_id, challenger = %challenger_id, bond, "appeal filed");
        Ok(id)
    }

    pub fn appeal(&self, id: AppealId) -> Option<&Appeal> {
        self.appeals.get(&id)
    }

    /// Stored result for an already-resolved appeal.
    pub fn resolution(&self, id: AppealId) -> Option<&AppealResolution> {
        self.resolutions.get(&id)
    }

    pub fn open_count(&self) -> usize {
        self.appeals
            .values()
            .filter(|a| a.status == AppealStatus::Open)
            .count()
    }

    pub fn escrow(&self) -> &BondEscrow {
        &self.escrow
    }

    pub fn appeals(&self) -> impl Iterator<Item = &Appeal> {
        self.appeals.values()
    }

    /// Record the resolution of an appeal and release its bond exactly once.
    ///
    /// `corrected` carries the expanded committee's consensus when the
    /// appeal is upheld; `None` means rejected. Idempotent: a second call
    /// for the same appeal returns the stored result untouched.
    pub fn resolve(
        &mut self,
        id: AppealId,
        corrected: Option<ScoreDims>,
        now_ms: u64,
    ) -> Result<AppealResolution> {
        if let Some(done) = self.resolutions.get(&id) {
            debug!(appeal = %id, "appeal already resolved, returning stored result");
            return Ok(done.clone());
        }
        let appeal = self.appeals.get_mut(&id).ok_or(Error::UnknownAppeal(id))?;

        let resolution = match corrected {
            Some(dims) => {
                appeal.status = AppealStatus::Upheld;
                let reward = self.reward.amount(appeal.bond);
                self.escrow.refunded += appeal.bond;
                self.escrow.rewarded += reward;
                AppealResolution {
                    appeal_id: id,
                    status: AppealStatus::Upheld,
                    bond: appeal.bond,
                    refund: appeal.bond,
                    reward,
                    corrected: Some(dims),
                }
            }
            None => {
                appeal.status = AppealStatus::Rejected;
                self.escrow.slashed += appeal.bond;
                AppealResolution {
                    appeal_id: id,
                    status: AppealStatus::Rejected,
                    bond: appeal.bond,
                    refund: 0,
                    reward: 0,
                    corrected: None,
                }
            }
        };
        appeal.resolved_at = Some(now_ms);

        info!(appeal = %id, status = ?resolution.status, bond = resolution.bond, "appeal resolved");
        self.resolutions.insert(id, resolution.clone());
        Ok(resolution)
    }
}
