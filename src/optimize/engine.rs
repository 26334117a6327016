use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use super::candidate::{Candidate, generate_candidates};
use super::checks::{CheckContext, check_candidate};
use super::jurisdiction::Jurisdiction;
use super::limits::LegalLimits;
use super::mesh::synthesize;
use super::quality::{DesignSignals, QualitativeScores};
use super::result::{DesignOption, OptimizerTimings, OptionParameters};
use super::score::{final_score, rank_order};
use crate::config::EngineConfig;
use crate::geom::site::{SiteGeometry, SiteMetrics};
use crate::project::{AestheticInput, Occupancy, Requirements};
use crate::rules::{RuleDefinition, by_priority};
use crate::vecutils::round_to;

/// Inputs of one optimizer run.
#[derive(Debug, Clone, Copy)]
pub struct OptimizeInput<'a> {
    /// Frozen rule definitions, any order.
    pub rule_definitions: &'a [RuleDefinition],
    pub requirements: &'a Requirements,
    pub objective: &'a str,
    pub site: &'a SiteGeometry,
    pub country_code: &'a str,
    pub occupancy: &'a Occupancy,
    pub aesthetic_inputs: &'a [AestheticInput],
}

/// Per-candidate stage durations.
#[derive(Debug, Clone, Copy, Default)]
struct StageTimes {
    mesh: Duration,
    quality: Duration,
    checks: Duration,
}

impl std::ops::Add for StageTimes {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            mesh: self.mesh + rhs.mesh,
            quality: self.quality + rhs.quality,
            checks: self.checks + rhs.checks,
        }
    }
}

fn ms(d: Duration) -> f64 {
    round_to(d.as_secs_f64() * 1000.0, 3)
}

/// Shared read-only state of one run.
struct Scorer<'a> {
    input: &'a OptimizeInput<'a>,
    config: &'a EngineConfig,
    site: &'a SiteMetrics,
    check_ctx: CheckContext<'a>,
    signals: DesignSignals,
    legal_basis: Vec<String>,
}

impl Scorer<'_> {
    fn evaluate(&self, candidate: &Candidate) -> (DesignOption, StageTimes) {
        let occupancy = self.input.occupancy;
        let mut times = StageTimes::default();

        let t = Instant::now();
        let mesh = synthesize(candidate, self.site, occupancy, self.config);
        times.mesh = t.elapsed();

        let placed = mesh
            .placed_block_count()
            .unwrap_or(candidate.block_count);
        if placed < candidate.block_count {
            debug!(
                option_type = %candidate.option_type,
                requested = candidate.block_count,
                placed,
                "fewer blocks fit than requested"
            );
        }
        let effective = candidate.effective(placed, self.check_ctx.limits.open_space_min);

        let t = Instant::now();
        let quality = QualitativeScores::evaluate(&effective, &self.signals, occupancy);
        times.quality = t.elapsed();

        let t = Instant::now();
        let report = check_candidate(&effective, quality.total, &self.check_ctx);
        times.checks = t.elapsed();

        let score = final_score(
            &effective,
            quality.total,
            report.feasible,
            self.config.infeasible_score,
        );

        let option = DesignOption {
            rank: 0,
            option_type: candidate.option_type,
            score,
            parameters: OptionParameters {
                engine_version: self.config.engine_version.clone(),
                far: round_to(effective.far, 2),
                height_m: round_to(effective.height, 2),
                coverage_percent: round_to(effective.coverage, 2),
                open_space_percent: round_to(effective.open_space_ratio, 2),
                block_count: effective.block_count,
                floors: effective.floors,
                building_spacing_m: round_to(effective.building_spacing_m, 2),
                max_block_length_m: round_to(effective.max_block_length_m, 2),
                plan_family: effective.plan_family,
                avg_unit_area_m2: round_to(effective.avg_unit_area_m2, 2),
                unit_mix: effective.unit_mix.clone(),
                qualitative_scores: quality,
                objective: self.input.objective.to_string(),
                feasible: report.feasible,
                legal_basis_tags: self.legal_basis.clone(),
            },
            checks: report.checks,
            mesh_payload: mesh,
        };
        (option, times)
    }
}

/// Generates, scores and ranks the massing options of one site.
///
/// Always returns exactly three options (infeasible ones included), sorted
/// feasible first and then by descending score. Ties keep menu order. Ranks
/// are left at 0 for the caller to assign.
pub fn optimize(
    input: &OptimizeInput<'_>,
    config: &EngineConfig,
) -> (Vec<DesignOption>, OptimizerTimings) {
    let t_total = Instant::now();
    let mut timings = OptimizerTimings::default();

    let t = Instant::now();
    let jurisdiction = Jurisdiction::from_country_code(input.country_code);
    let limits = LegalLimits::resolve(input.rule_definitions, input.requirements, jurisdiction);
    let site = SiteMetrics::analyze(input.site);
    let sorted_rules = by_priority(input.rule_definitions);
    let scorer = Scorer {
        input,
        config,
        site: &site,
        check_ctx: CheckContext {
            rules: &sorted_rules,
            limits: &limits,
            requirements: input.requirements,
            occupancy: input.occupancy,
        },
        signals: DesignSignals::from_inputs(input.aesthetic_inputs),
        legal_basis: jurisdiction.legal_basis(input.occupancy),
    };
    timings.prepare_inputs_ms = ms(t.elapsed());

    let t = Instant::now();
    let candidates = generate_candidates(&limits, &site, jurisdiction, input.occupancy);
    timings.candidate_generation_ms = ms(t.elapsed());

    let (mut options, stage_times): (Vec<DesignOption>, Vec<StageTimes>) = candidates
        .par_iter()
        .map(|c| scorer.evaluate(c))
        .unzip();
    let stage_total = stage_times
        .into_iter()
        .fold(StageTimes::default(), |acc, t| acc + t);
    timings.mesh_build_ms = ms(stage_total.mesh);
    timings.qualitative_eval_ms = ms(stage_total.quality);
    timings.constraint_checks_ms = ms(stage_total.checks);

    let t = Instant::now();
    options.sort_by(|a, b| rank_order((a.is_feasible(), a.score), (b.is_feasible(), b.score)));
    timings.sort_ms = ms(t.elapsed());
    timings.total_ms = ms(t_total.elapsed());

    info!(
        occupancy = %input.occupancy,
        jurisdiction = ?jurisdiction,
        site_area_m2 = round_to(site.area_m2, 1),
        options = options.len(),
        feasible = options.iter().filter(|o| o.is_feasible()).count(),
        total_ms = timings.total_ms,
        "optimized massing options"
    );
    (options, timings)
}
