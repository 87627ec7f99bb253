//! Identifier newtypes.
//!
//! Plain `u64` newtypes keep the maps in the coordinator keyed by domain
//! rather than by bare integers. All of them are `Copy` and order-stable so
//! they can serve as the last resort in deterministic tie-break chains.

use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(v: u64) -> Self {
                Self(v)
            }
        }
    };
}

id_type!(
    /// A game session (external lifecycle; the protocol only records it).
    SessionId
);
id_type!(
    /// One round within a session.
    RoundId
);
id_type!(
    /// A submitted answer.
    AnswerId
);
id_type!(
    /// A player submitting answers and votes.
    PlayerId
);
id_type!(
    /// A validator in the pool; leader/committee are roles over these.
    ValidatorId
);
id_type!(
    /// A bonded appeal against an accepted score.
    AppealId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_ordered_and_displayable() {
        assert!(AnswerId(1) < AnswerId(2));
        assert_eq!(format!("{}", ValidatorId(7)), "ValidatorId(7)");
        assert_eq!(AnswerId::from(3), AnswerId(3));
    }
}
