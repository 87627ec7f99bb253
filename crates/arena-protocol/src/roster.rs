//! Per-round validator roles.
//!
//! Leader and committee are role assignments over a fixed validator pool,
//! resolved at round creation. The appeal committee is derived from the
//! same pool under the configured policy and must always include validators
//! who did not originally score the answer.

use arena_types::{AppealCommitteePolicy, ValidatorId};

use crate::error::{Error, Result};

/// Role assignment for one round.
#[derive(Debug, Clone)]
pub struct RoundRoster {
    pub leader: ValidatorId,
    pub committee: Vec<ValidatorId>,
    /// The full validator pool the roles were drawn from.
    pub pool: Vec<ValidatorId>,
}

impl RoundRoster {
    pub fn new(leader: ValidatorId, committee: Vec<ValidatorId>, pool: Vec<ValidatorId>) -> Self {
        Self {
            leader,
            committee,
            pool,
        }
    }

    /// Pool members who held no scoring role this round.
    fn fresh_validators(&self) -> Vec<ValidatorId> {
        self.pool
            .iter()
            .copied()
            .filter(|v| *v != self.leader && !self.committee.contains(v))
            .collect()
    }

    /// Build the expanded committee for an appeal re-scoring.
    ///
    /// Fails with [`Error::RosterTooSmall`] when the pool cannot supply the
    /// fresh validators the policy requires.
    pub fn expanded_committee(&self, policy: AppealCommitteePolicy) -> Result<Vec<ValidatorId>> {
        let fresh = self.fresh_validators();
        match policy {
            AppealCommitteePolicy::Superset { extra } => {
                let needed = extra.max(1);
                if fresh.len() < needed {
                    return Err(Error::RosterTooSmall {
                        needed,
                        available: fresh.len(),
                    });
                }
                let mut expanded = self.committee.clone();
                expanded.extend(fresh.into_iter().take(needed));
                Ok(expanded)
            }
            AppealCommitteePolicy::Disjoint => {
                let needed = self.committee.len();
                if fresh.len() < needed {
                    return Err(Error::RosterTooSmall {
                        needed,
                        available: fresh.len(),
                    });
                }
                Ok(fresh.into_iter().take(needed).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> RoundRoster {
        RoundRoster::new(
            ValidatorId(1),
            vec![ValidatorId(2), ValidatorId(3), ValidatorId(4)],
            (1..=8).map(ValidatorId).collect(),
        )
    }

    #[test]
    fn superset_adds_fresh_validators() {
        let expanded = roster()
            .expanded_committee(AppealCommitteePolicy::Superset { extra: 2 })
            .unwrap();
        assert_eq!(expanded.len(), 5);
        assert!(expanded.contains(&ValidatorId(2)));
        // At least one member who did not originally score.
        assert!(expanded.iter().any(|v| v.0 >= 5));
    }

    #[test]
    fn disjoint_excludes_original_scorers() {
        let r = roster();
        let expanded = r.expanded_committee(AppealCommitteePolicy::Disjoint).unwrap();
        assert_eq!(expanded.len(), r.committee.len());
        for v in &expanded {
            assert!(*v != r.leader);
            assert!(!r.committee.contains(v));
        }
    }

    #[test]
    fn small_pool_fails() {
        let r = RoundRoster::new(
            ValidatorId(1),
            vec![ValidatorId(2), ValidatorId(3)],
            vec![ValidatorId(1), ValidatorId(2), ValidatorId(3)],
        );
        let err = r
            .expanded_committee(AppealCommitteePolicy::Disjoint)
            .unwrap_err();
        assert!(matches!(err, Error::RosterTooSmall { .. }));
    }

    #[test]
    fn superset_requires_at_least_one_fresh() {
        // extra: 0 still demands one validator outside the original set.
        let r = RoundRoster::new(
            ValidatorId(1),
            vec![ValidatorId(2)],
            vec![ValidatorId(1), ValidatorId(2)],
        );
        let err = r
            .expanded_committee(AppealCommitteePolicy::Superset { extra: 0 })
            .unwrap_err();
        assert!(matches!(err, Error::RosterTooSmall { needed: 1, .. }));
    }
}
