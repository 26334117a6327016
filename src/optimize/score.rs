use std::cmp::Ordering;

use super::candidate::Candidate;
use crate::vecutils::round_to;

/// Coverage above which massing is penalized (%).
pub const COVERAGE_PENALTY_START: f64 = 58.0;
/// Block length above which massing is penalized (m).
pub const BLOCK_LENGTH_PENALTY_START: f64 = 70.0;

/// Ranking score of a feasible (effective) candidate, rounded to 4 decimals.
pub fn score_candidate(candidate: &Candidate, qualitative_total: f64) -> f64 {
    let far_component = candidate.far * 0.6;
    let coverage_penalty = (candidate.coverage - COVERAGE_PENALTY_START).max(0.0) * 2.0;
    let length_penalty = (candidate.max_block_length_m - BLOCK_LENGTH_PENALTY_START).max(0.0) * 0.9;
    round_to(
        far_component + qualitative_total - coverage_penalty - length_penalty,
        4,
    )
}

/// Final score: the ranking score when feasible, `infeasible_score` otherwise.
pub fn final_score(
    candidate: &Candidate,
    qualitative_total: f64,
    feasible: bool,
    infeasible_score: f64,
) -> f64 {
    if feasible {
        score_candidate(candidate, qualitative_total)
    } else {
        infeasible_score
    }
}

/// Order of ranked options: feasible first, then score descending.
///
/// Used with a stable sort so equal keys keep generator order.
pub fn rank_order(a: (bool, f64), b: (bool, f64)) -> Ordering {
    b.0.cmp(&a.0).then_with(|| b.1.total_cmp(&a.1))
}
