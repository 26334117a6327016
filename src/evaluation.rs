//! One full evaluation of a project: frozen rules, ranked options and the
//! shared solar profile.

use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::UID;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::optimize::{DesignOption, OptimizeInput, OptimizerTimings, optimize};
use crate::project::Project;
use crate::rules::{RuleSet, RuleSnapshot, resolve_active_rules};
use crate::solar::{SolarSample, compute_solar_profile};
use crate::vecutils::round_to;

fn default_category() -> String {
    "zoning".to_string()
}

fn default_objective() -> String {
    "maximize_far".to_string()
}

/// Everything needed to evaluate one project on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub project: Project,
    /// Candidate rule sets; only those in force for the project are used.
    #[serde(default)]
    pub rule_sets: Vec<RuleSet>,
    pub evaluation_date: NaiveDate,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_objective")]
    pub objective: String,
    /// Hours of the solar profile; the configured defaults when absent.
    #[serde(default)]
    pub hours: Option<Vec<u32>>,
}

impl EvaluationRequest {
    pub fn new(project: Project, rule_sets: Vec<RuleSet>, evaluation_date: NaiveDate) -> Self {
        Self {
            project,
            rule_sets,
            evaluation_date,
            category: default_category(),
            objective: default_objective(),
            hours: None,
        }
    }
}

/// Wall-clock time of each evaluation stage (ms).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineTimings {
    pub resolve_rules_ms: f64,
    pub optimize_options_ms: f64,
    pub compute_solar_profile_ms: f64,
    pub total_ms: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeProfile {
    pub pipeline_ms: PipelineTimings,
    pub optimizer_ms: OptimizerTimings,
}

/// Result of [`run_evaluation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: UID,
    pub project_id: UID,
    pub snapshot: RuleSnapshot,
    pub objective: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Ranked options, rank 1 first.
    pub options: Vec<DesignOption>,
    /// Solar samples shared by every option.
    pub solar: Vec<SolarSample>,
    pub runtime_profile: RuntimeProfile,
}

impl Evaluation {
    pub fn best(&self) -> Option<&DesignOption> {
        self.options.first()
    }

    pub fn option_by_rank(&self, rank: usize) -> Option<&DesignOption> {
        self.options.iter().find(|o| o.rank == rank)
    }
}

fn elapsed_ms(t: Instant) -> f64 {
    round_to(t.elapsed().as_secs_f64() * 1000.0, 3)
}

/// Resolves the rules in force, runs the optimizer and computes the solar
/// profile at the site centroid.
///
/// Fails with [`crate::EngineError::NoApplicableRules`] when no rule set
/// applies, and with [`crate::EngineError::InvalidRequest`] on an hour outside
/// 0-23 or a negative aesthetic weight.
pub fn run_evaluation(request: &EvaluationRequest, config: &EngineConfig) -> Result<Evaluation> {
    let project = &request.project;
    project.validate()?;
    let span = info_span!("evaluation", project = %project.id, date = %request.evaluation_date);
    let _guard = span.enter();

    let started_at = Utc::now();
    let t_total = Instant::now();
    let mut pipeline = PipelineTimings::default();

    let t = Instant::now();
    let snapshot = resolve_active_rules(
        &request.rule_sets,
        project,
        request.evaluation_date,
        &request.category,
    )?;
    pipeline.resolve_rules_ms = elapsed_ms(t);

    let t = Instant::now();
    let input = OptimizeInput {
        rule_definitions: &snapshot.frozen_rule_definitions,
        requirements: &project.requirements,
        objective: &request.objective,
        site: &project.site,
        country_code: &project.country_code,
        occupancy: &project.occupancy_type,
        aesthetic_inputs: &project.aesthetic_inputs,
    };
    let (mut options, optimizer_ms) = optimize(&input, config);
    for (idx, option) in options.iter_mut().enumerate() {
        option.rank = idx + 1;
    }
    pipeline.optimize_options_ms = elapsed_ms(t);

    let t = Instant::now();
    let (lat, lng) = project
        .site
        .centroid_lat_lng()
        .unwrap_or(config.default_site_location);
    let hours = request.hours.as_deref().unwrap_or(config.default_hours.as_slice());
    let solar = compute_solar_profile(lat, lng, request.evaluation_date, hours, config)?;
    pipeline.compute_solar_profile_ms = elapsed_ms(t);
    pipeline.total_ms = elapsed_ms(t_total);

    info!(
        rule_sets = snapshot.frozen_rule_set_ids.len(),
        rules = snapshot.frozen_rule_definitions.len(),
        options = options.len(),
        best = options.first().map(|o| o.option_type.as_str()).unwrap_or("-"),
        total_ms = pipeline.total_ms,
        "evaluation completed"
    );

    Ok(Evaluation {
        id: UID::new(),
        project_id: project.id.clone(),
        snapshot,
        objective: request.objective.clone(),
        started_at,
        completed_at: Utc::now(),
        options,
        solar,
        runtime_profile: RuntimeProfile {
            pipeline_ms: pipeline,
            optimizer_ms,
        },
    })
}
