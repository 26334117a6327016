//! Qualitative scoring of a massing candidate against the project's design
//! inputs.
//!
//! Five sub-scores on a 0-100 scale are combined with fixed weights and scaled
//! by the mean weight of the aesthetic inputs. Text signals are detected by
//! plain substring search over the lower-cased input content.

use serde::{Deserialize, Serialize};

use super::candidate::{Candidate, OptionType};
use crate::project::{AestheticInput, Occupancy};
use crate::vecutils::{mean, round_to};

/// Words signalling that a landmark silhouette is wanted.
pub const LANDMARK_KEYWORDS: [&str; 4] = ["랜드마크", "landmark", "iconic", "상징"];
/// Words signalling that the massing should defer to its surroundings.
pub const CONTEXT_KEYWORDS: [&str; 4] = ["맥락", "조화", "context", "street"];

/// Weights of skyline, street scale, open space, market fit and reference maturity.
pub const WEIGHTS: [f64; 5] = [0.30, 0.24, 0.22, 0.16, 0.08];

/// Height above which an unrequested tall silhouette is penalized (m).
const TALL_MASS_HEIGHT: f64 = 85.0;
const TARGET_COVERAGE: f64 = 45.0;
const TARGET_UNIT_AREA: f64 = 80.0;
const NON_HOUSING_MARKET_FIT: f64 = 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualitativeScores {
    pub skyline_harmony: f64,
    pub street_scale_fit: f64,
    pub open_space_quality: f64,
    pub reference_maturity: f64,
    pub market_fit: f64,
    pub total: f64,
}

/// Signals extracted once from the aesthetic inputs of a project.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesignSignals {
    pub landmark: bool,
    pub context: bool,
    pub input_count: usize,
    pub reference_count: usize,
    pub mean_weight: f64,
}

impl DesignSignals {
    pub fn from_inputs(inputs: &[AestheticInput]) -> Self {
        let text = inputs
            .iter()
            .map(|i| i.content.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        let weights: Vec<f64> = inputs.iter().map(|i| i.weight).collect();
        Self {
            landmark: LANDMARK_KEYWORDS.iter().any(|k| text.contains(k)),
            context: CONTEXT_KEYWORDS.iter().any(|k| text.contains(k)),
            input_count: inputs.len(),
            reference_count: inputs.iter().filter(|i| i.has_reference()).count(),
            mean_weight: mean(&weights),
        }
    }
}

fn skyline_base(option_type: OptionType) -> f64 {
    let name = option_type.as_str();
    if name.contains("tower") {
        86.0
    } else if name.contains("courtyard") {
        84.0
    } else if name.contains("linear") {
        82.0
    } else {
        76.0
    }
}

fn market_fit(candidate: &Candidate, occupancy: &Occupancy) -> f64 {
    if !occupancy.is_housing() {
        return NON_HOUSING_MARKET_FIT;
    }
    let size_fit = (100.0 - (candidate.avg_unit_area_m2 - TARGET_UNIT_AREA).abs() * 1.6).max(40.0);
    let plan_bonus = if candidate.plan_family.is_housing_family() {
        8.0
    } else {
        0.0
    };
    let cluster_bonus = (candidate.block_count as f64 * 2.5).min(18.0);
    (size_fit + plan_bonus + cluster_bonus).min(100.0)
}

impl QualitativeScores {
    /// Scores an (effective) candidate. All values are rounded to 2 decimals.
    pub fn evaluate(candidate: &Candidate, signals: &DesignSignals, occupancy: &Occupancy) -> Self {
        let mut skyline = skyline_base(candidate.option_type);
        if !signals.landmark && candidate.height > TALL_MASS_HEIGHT {
            skyline -= 8.0;
        }
        if signals.context {
            skyline += 4.0;
        }

        let street = (100.0 - (candidate.coverage - TARGET_COVERAGE).abs() * 1.4).max(40.0);
        let open_space = (candidate.open_space_ratio * 1.7 + 15.0).clamp(40.0, 100.0);
        let reference = (46.0
            + signals.reference_count as f64 * 9.0
            + signals.input_count as f64 * 2.0)
            .clamp(45.0, 100.0);
        let market = market_fit(candidate, occupancy);

        let weighted = [skyline, street, open_space, market, reference]
            .iter()
            .zip(WEIGHTS)
            .map(|(s, w)| s * w)
            .sum::<f64>();
        let total = (weighted * (0.9 + 0.1 * signals.mean_weight)).clamp(0.0, 100.0);

        Self {
            skyline_harmony: round_to(skyline, 2),
            street_scale_fit: round_to(street, 2),
            open_space_quality: round_to(open_space, 2),
            reference_maturity: round_to(reference, 2),
            market_fit: round_to(market, 2),
            total: round_to(total, 2),
        }
    }
}
