//! Per-answer verdict resolution: leader acceptance, median replacement,
//! or drop.

use arena_types::{OracleOutcome, ScoreDims, Tolerance};

use crate::equivalence::within_tolerance;

/// Outcome of verifying one answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// All committee vectors agreed with the leader; leader's dims win.
    LeaderAccepted(ScoreDims),
    /// Per-dimension median of the non-failed committee vectors.
    CommitteeReplaced(ScoreDims),
    /// Every committee vector failed; the answer leaves the round.
    Dropped,
}

/// Per-dimension median of a set of score vectors. `None` on empty input.
///
/// Even counts take the midpoint of the two middle values, matching the
/// usual statistical median so the result stays within each dimension's
/// observed range.
pub fn median_dims(vectors: &[ScoreDims]) -> Option<ScoreDims> {
    if vectors.is_empty() {
        return None;
    }
    Some(ScoreDims {
        clarity: median(vectors.iter().map(|v| v.clarity)),
        creativity: median(vectors.iter().map(|v| v.creativity)),
        relevance: median(vectors.iter().map(|v| v.relevance)),
    })
}

fn median(values: impl Iterator<Item = f64>) -> f64 {
    let mut sorted: Vec<f64> = values.collect();
    // Scores are clamped to [0, 10]; NaN cannot occur.
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Resolve one answer's accepted score from the leader's outcome and the
/// committee's outcomes.
///
/// The leader is accepted only when its call succeeded, every committee
/// call succeeded, and every committee vector is within tolerance. Any
/// sentinel or disagreement falls through to the median of the surviving
/// committee vectors; no survivors means the answer is dropped.
pub fn resolve_answer(
    leader: &OracleOutcome,
    committee: &[OracleOutcome],
    tolerance: &Tolerance,
) -> Verdict {
    let scored: Vec<ScoreDims> = committee.iter().filter_map(|o| o.dims().copied()).collect();

    if let Some(leader_dims) = leader.dims() {
        let unanimous = scored.len() == committee.len()
            && !committee.is_empty()
            && scored
                .iter()
                .all(|c| within_tolerance(leader_dims, c, tolerance));
        if unanimous {
            return Verdict::LeaderAccepted(*leader_dims);
        }
    }

    match median_dims(&scored) {
        Some(dims) => Verdict::CommitteeReplaced(dims),
        None => Verdict::Dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dims(c: f64, cr: f64, r: f64) -> ScoreDims {
        ScoreDims::clamped(c, cr, r)
    }

    fn scored(c: f64, cr: f64, r: f64) -> OracleOutcome {
        OracleOutcome::Scored(dims(c, cr, r))
    }

    #[test]
    fn unanimous_committee_accepts_leader() {
        // Leader (8,7,9); three committee members all within tolerance 1.
        let leader = scored(8.0, 7.0, 9.0);
        let committee = vec![
            scored(8.0, 7.0, 9.0),
            scored(7.0, 8.0, 9.0),
            scored(9.0, 7.0, 8.0),
        ];
        let verdict = resolve_answer(&leader, &committee, &Tolerance::uniform(1.0));
        assert_eq!(verdict, Verdict::LeaderAccepted(dims(8.0, 7.0, 9.0)));
    }

    #[test]
    fn clarity_disagreement_takes_committee_median() {
        // Leader clarity 8; committee clarity 3, 4, 9 with tolerance 1.
        // Two members exceed tolerance, so clarity becomes median(3,4,9)=4.
        let leader = scored(8.0, 7.0, 9.0);
        let committee = vec![
            scored(3.0, 7.0, 9.0),
            scored(4.0, 6.0, 8.0),
            scored(9.0, 7.0, 9.0),
        ];
        let verdict = resolve_answer(&leader, &committee, &Tolerance::uniform(1.0));
        match verdict {
            Verdict::CommitteeReplaced(d) => {
                assert_eq!(d.clarity, 4.0);
                assert_eq!(d.creativity, 7.0);
                assert_eq!(d.relevance, 9.0);
            }
            other => panic!("expected committee replacement, got {other:?}"),
        }
    }

    #[test]
    fn leader_sentinel_forces_replacement() {
        let committee = vec![scored(5.0, 5.0, 5.0), scored(6.0, 6.0, 6.0)];
        let verdict =
            resolve_answer(&OracleOutcome::TimedOut, &committee, &Tolerance::uniform(10.0));
        assert_eq!(verdict, Verdict::CommitteeReplaced(dims(5.5, 5.5, 5.5)));
    }

    #[test]
    fn failed_member_excluded_from_median() {
        let leader = scored(8.0, 8.0, 8.0);
        let committee = vec![
            scored(2.0, 2.0, 2.0),
            OracleOutcome::TimedOut,
            scored(4.0, 4.0, 4.0),
        ];
        // One member failed, so unanimity is impossible; median over the
        // two survivors.
        let verdict = resolve_answer(&leader, &committee, &Tolerance::uniform(10.0));
        assert_eq!(verdict, Verdict::CommitteeReplaced(dims(3.0, 3.0, 3.0)));
    }

    #[test]
    fn all_failed_drops_answer() {
        let committee = vec![OracleOutcome::TimedOut, OracleOutcome::TimedOut];
        let verdict = resolve_answer(
            &scored(8.0, 8.0, 8.0),
            &committee,
            &Tolerance::uniform(1.0),
        );
        assert_eq!(verdict, Verdict::Dropped);

        // Leader sentinel and empty committee behave the same.
        let verdict = resolve_answer(&OracleOutcome::TimedOut, &[], &Tolerance::uniform(1.0));
        assert_eq!(verdict, Verdict::Dropped);
    }

    #[test]
    fn empty_committee_never_accepts_leader() {
        // No committee vector means no corroboration; drop rather than
        // trust the uncorroborated leader.
        let verdict = resolve_answer(&scored(8.0, 8.0, 8.0), &[], &Tolerance::uniform(1.0));
        assert_eq!(verdict, Verdict::Dropped);
    }

    #[test]
    fn median_of_empty_is_none() {
        assert!(median_dims(&[]).is_none());
    }

    proptest! {
        #[test]
        fn median_bounded_by_observed_range(
            raw in proptest::collection::vec(
                (0.0..=10.0f64, 0.0..=10.0f64, 0.0..=10.0f64), 1..9)
        ) {
            let vecs: Vec<ScoreDims> =
                raw.iter().map(|(a, b, c)| dims(*a, *b, *c)).collect();
            let m = median_dims(&vecs).unwrap();
            let min = |f: fn(&ScoreDims) -> f64| {
                vecs.iter().map(f).fold(f64::INFINITY, f64::min)
            };
            let max = |f: fn(&ScoreDims) -> f64| {
                vecs.iter().map(f).fold(f64::NEG_INFINITY, f64::max)
            };
            prop_assert!(m.clarity >= min(|v| v.clarity) && m.clarity <= max(|v| v.clarity));
            prop_assert!(m.creativity >= min(|v| v.creativity) && m.creativity <= max(|v| v.creativity));
            prop_assert!(m.relevance >= min(|v| v.relevance) && m.relevance <= max(|v| v.relevance));
        }

        #[test]
        fn timed_out_leader_never_accepted(
            raw in proptest::collection::vec(
                (0.0..=10.0f64, 0.0..=10.0f64, 0.0..=10.0f64), 0..6)
        ) {
            let committee: Vec<OracleOutcome> =
                raw.iter().map(|(a, b, c)| scored(*a, *b, *c)).collect();
            let verdict = resolve_answer(
                &OracleOutcome::TimedOut,
                &committee,
                &Tolerance::uniform(10.0),
            );
            prop_assert!(!matches!(verdict, Verdict::LeaderAccepted(_)));
        }
    }
}
