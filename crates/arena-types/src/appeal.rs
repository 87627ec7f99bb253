//! Bonded appeals against accepted scores.

use serde::{Deserialize, Serialize};

use crate::id::{AnswerId, AppealId, PlayerId};

/// Terminal states are `Upheld` (bond returned + reward) and `Rejected`
/// (bond slashed). An appeal never reopens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealStatus {
    Open,
    Upheld,
    Rejected,
}

impl AppealStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

/// A bonded challenge to one answer's accepted score.
///
/// Created only while the round's appeal window is open and the target
/// answer has an accepted score; the bond is escrowed atomically with
/// creation and released exactly once at resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appeal {
    pub id: AppealId,
    pub answer_id: AnswerId,
    pub challenger_id: PlayerId,
    pub bond: u64,
    pub status: AppealStatus,
    pub created_at: u64,
    pub resolved_at: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_open_is_non_terminal() {
        assert!(!AppealStatus::Open.is_terminal());
        assert!(AppealStatus::Upheld.is_terminal());
        assert!(AppealStatus::Rejected.is_terminal());
    }
}
