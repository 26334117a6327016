use serde::{Deserialize, Serialize};
use tracing::debug;

use super::candidate::Candidate;
use super::limits::LegalLimits;
use crate::project::{Occupancy, Requirements};
use crate::rules::{self, Metric, RuleDefinition, RuleType, State};

pub const CHECK_SKY_EXPOSURE_CAP: &str = "sky_exposure_cap";
pub const CHECK_OPEN_SPACE_MIN: &str = "open_space_min";
pub const CHECK_RESIDENTIAL_MULTI_BLOCK: &str = "residential_multi_block";
pub const CHECK_MIN_BUILDING_SPACING: &str = "min_building_spacing";
pub const CHECK_USER_MIN_FAR: &str = "user_min_far";
pub const CHECK_QUALITATIVE_MIN: &str = "qualitative_min";

/// Blocks a housing program needs inside the site boundary.
pub const MIN_HOUSING_BLOCKS: usize = 2;

/// Outcome of one rule or built-in constraint for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintCheck {
    pub rule_key: String,
    pub rule_type: RuleType,
    pub passed: bool,
    pub detail: String,
}

impl ConstraintCheck {
    pub fn hard(rule_key: &str, passed: bool, detail: String) -> Self {
        Self {
            rule_key: rule_key.to_string(),
            rule_type: RuleType::Hard,
            passed,
            detail,
        }
    }

    /// True if this check makes its candidate infeasible.
    pub fn is_blocking(&self) -> bool {
        self.rule_type == RuleType::Hard && !self.passed
    }
}

/// State vector of an effective candidate, as seen by rule expressions.
pub fn candidate_state(candidate: &Candidate) -> State {
    State::new()
        .with(Metric::Far, candidate.far)
        .with(Metric::Height, candidate.height)
        .with(Metric::Coverage, candidate.coverage)
        .with(Metric::OpenSpace, candidate.open_space_ratio)
        .with(Metric::SkyExposure, candidate.sky_exposure)
        .with(Metric::ArticulationIndex, candidate.articulation_index)
        .with(Metric::BlockCount, candidate.block_count as f64)
        .with(Metric::MaxBlockLength, candidate.max_block_length_m)
        .with(Metric::MinBlockSpacing, candidate.building_spacing_m)
}

/// Everything a candidate is checked against.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    /// Active rules in ascending priority.
    pub rules: &'a [&'a RuleDefinition],
    pub limits: &'a LegalLimits,
    pub requirements: &'a Requirements,
    pub occupancy: &'a Occupancy,
}

/// Result of checking one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub checks: Vec<ConstraintCheck>,
    pub feasible: bool,
}

/// Runs the active rules and then the built-in hard constraints.
///
/// Every check is recorded whether it passed or not. The candidate is feasible
/// when no hard check failed.
pub fn check_candidate(
    candidate: &Candidate,
    qualitative_total: f64,
    ctx: &CheckContext<'_>,
) -> CheckReport {
    let state = candidate_state(candidate);
    let mut checks: Vec<ConstraintCheck> = ctx
        .rules
        .iter()
        .map(|rule| {
            let (passed, detail) = rules::evaluate(&rule.expression, &state);
            ConstraintCheck {
                rule_key: rule.rule_key.clone(),
                rule_type: rule.rule_type,
                passed,
                detail,
            }
        })
        .collect();

    let limits = ctx.limits;
    let sky = candidate.sky_exposure;
    let sky_ok = sky <= limits.sky_exposure_max;
    checks.push(ConstraintCheck::hard(
        CHECK_SKY_EXPOSURE_CAP,
        sky_ok,
        format!(
            "sky_exposure={sky:.2} {} max={:.2}",
            if sky_ok { "<=" } else { ">" },
            limits.sky_exposure_max
        ),
    ));

    let open = candidate.open_space_ratio;
    let open_ok = open >= limits.open_space_min;
    checks.push(ConstraintCheck::hard(
        CHECK_OPEN_SPACE_MIN,
        open_ok,
        format!(
            "open_space={open:.2} {} min={:.2}",
            if open_ok { ">=" } else { "<" },
            limits.open_space_min
        ),
    ));

    if ctx.occupancy.is_housing() {
        let blocks = candidate.block_count;
        let blocks_ok = blocks >= MIN_HOUSING_BLOCKS;
        let detail = if blocks_ok {
            format!("{blocks} blocks inside site boundary")
        } else {
            format!(
                "residential program requires at least {MIN_HOUSING_BLOCKS} blocks inside site boundary"
            )
        };
        checks.push(ConstraintCheck::hard(
            CHECK_RESIDENTIAL_MULTI_BLOCK,
            blocks_ok,
            detail,
        ));

        let spacing = candidate.building_spacing_m;
        let spacing_ok = spacing >= limits.min_building_spacing;
        checks.push(ConstraintCheck::hard(
            CHECK_MIN_BUILDING_SPACING,
            spacing_ok,
            format!(
                "spacing={spacing:.2}m {} min={:.2}m",
                if spacing_ok { ">=" } else { "<" },
                limits.min_building_spacing
            ),
        ));
    }

    if let Some(min_far) = ctx.requirements.far_min() {
        let far = candidate.far;
        let far_ok = far >= min_far;
        checks.push(ConstraintCheck::hard(
            CHECK_USER_MIN_FAR,
            far_ok,
            format!("far={far:.2} {} min={min_far}", if far_ok { ">=" } else { "<" }),
        ));
    }

    if let Some(min_quality) = ctx.requirements.qualitative_min() {
        let quality_ok = qualitative_total >= min_quality;
        checks.push(ConstraintCheck::hard(
            CHECK_QUALITATIVE_MIN,
            quality_ok,
            format!(
                "qualitative={qualitative_total:.2} {} min={min_quality}",
                if quality_ok { ">=" } else { "<" }
            ),
        ));
    }

    let feasible = !checks.iter().any(ConstraintCheck::is_blocking);
    if !feasible {
        let failed: Vec<&str> = checks
            .iter()
            .filter(|c| c.is_blocking())
            .map(|c| c.rule_key.as_str())
            .collect();
        debug!(option_type = %candidate.option_type, ?failed, "candidate is infeasible");
    }
    CheckReport { checks, feasible }
}
