//! Per-dimension equivalence within a configured tolerance.

use arena_types::{ScoreDims, Tolerance};

/// Accept iff `|a.dim - b.dim| <= tolerance.dim` for every dimension.
///
/// Pure and symmetric in its two score arguments: swapping leader and
/// committee vectors never changes the outcome.
pub fn within_tolerance(a: &ScoreDims, b: &ScoreDims, tolerance: &Tolerance) -> bool {
    (a.clarity - b.clarity).abs() <= tolerance.clarity
        && (a.creativity - b.creativity).abs() <= tolerance.creativity
        && (a.relevance - b.relevance).abs() <= tolerance.relevance
}
