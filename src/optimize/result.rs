use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::candidate::{OptionType, PlanFamily};
use super::checks::ConstraintCheck;
use super::mesh::MassingMesh;
use super::quality::QualitativeScores;

/// Reported parameters of one option. Metrics are the effective
/// (placement-adjusted) values rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionParameters {
    pub engine_version: String,
    pub far: f64,
    pub height_m: f64,
    pub coverage_percent: f64,
    pub open_space_percent: f64,
    pub block_count: usize,
    pub floors: usize,
    pub building_spacing_m: f64,
    pub max_block_length_m: f64,
    pub plan_family: PlanFamily,
    pub avg_unit_area_m2: f64,
    pub unit_mix: BTreeMap<String, f64>,
    pub qualitative_scores: QualitativeScores,
    pub objective: String,
    pub feasible: bool,
    pub legal_basis_tags: Vec<String>,
}

/// One ranked massing option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignOption {
    /// 1-based position after ranking; 0 until ranks are assigned.
    #[serde(default)]
    pub rank: usize,
    pub option_type: OptionType,
    pub score: f64,
    pub parameters: OptionParameters,
    pub checks: Vec<ConstraintCheck>,
    pub mesh_payload: MassingMesh,
}

impl DesignOption {
    pub fn is_feasible(&self) -> bool {
        self.parameters.feasible
    }

    pub fn failed_checks(&self) -> impl Iterator<Item = &ConstraintCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

/// Wall-clock time per optimizer stage, in milliseconds (3 decimals).
///
/// Mesh, qualitative and check times are summed over all candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizerTimings {
    pub prepare_inputs_ms: f64,
    pub candidate_generation_ms: f64,
    pub mesh_build_ms: f64,
    pub qualitative_eval_ms: f64,
    pub constraint_checks_ms: f64,
    pub sort_ms: f64,
    pub total_ms: f64,
}
