use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::RuleDefinition;
use crate::UID;
use crate::error::{EngineError, Result};
use crate::project::Project;

/// Publication state of a rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Draft,
    #[default]
    Active,
    Deprecated,
}

/// A versioned set of rules published by one jurisdiction for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub id: UID,
    pub country_code: String,
    pub jurisdiction_code: String,
    pub category: String,
    #[serde(default)]
    pub version: String,
    pub effective_from: NaiveDate,
    /// Last day the set applies; open-ended when absent.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
    #[serde(default)]
    pub status: RuleStatus,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub definitions: Vec<RuleDefinition>,
}

impl RuleSet {
    /// True if the set is active and in force on `date`.
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.status == RuleStatus::Active
            && self.effective_from <= date
            && self.effective_to.is_none_or(|to| to >= date)
    }

    /// Codes and category must match exactly.
    fn covers(&self, project: &Project, category: &str) -> bool {
        self.country_code == project.country_code
            && self.jurisdiction_code == project.jurisdiction_code
            && self.category == category
    }
}

/// Rules frozen for one evaluation.
///
/// Edits to the source rule sets after the snapshot is taken do not affect it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSnapshot {
    pub id: UID,
    pub evaluation_date: NaiveDate,
    pub category: String,
    pub frozen_rule_set_ids: Vec<UID>,
    /// Definitions of all matched sets, in ascending priority.
    pub frozen_rule_definitions: Vec<RuleDefinition>,
}

/// Selects the rule sets in force for a project's jurisdiction on `date`.
///
/// Matching sets are ordered newest `effective_from` first; their definitions are
/// flattened in that order and then stably sorted by priority.
pub fn resolve_active_rules(
    rule_sets: &[RuleSet],
    project: &Project,
    date: NaiveDate,
    category: &str,
) -> Result<RuleSnapshot> {
    let mut matched: Vec<&RuleSet> = rule_sets
        .iter()
        .filter(|rs| rs.covers(project, category))
        .filter(|rs| rs.is_effective_on(date))
        .collect();

    if matched.is_empty() {
        return Err(EngineError::NoApplicableRules {
            country_code: project.country_code.clone(),
            jurisdiction_code: project.jurisdiction_code.clone(),
            category: category.to_string(),
            date,
        });
    }
    matched.sort_by(|a, b| b.effective_from.cmp(&a.effective_from));

    let mut definitions: Vec<RuleDefinition> = matched
        .iter()
        .flat_map(|rs| rs.definitions.iter().cloned())
        .collect();
    definitions.sort_by_key(|d| d.priority);

    debug!(
        rule_sets = matched.len(),
        definitions = definitions.len(),
        %date,
        "resolved active rules"
    );

    Ok(RuleSnapshot {
        id: UID::new(),
        evaluation_date: date,
        category: category.to_string(),
        frozen_rule_set_ids: matched.iter().map(|rs| rs.id.clone()).collect(),
        frozen_rule_definitions: definitions,
    })
}
