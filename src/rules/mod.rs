//! Declarative zoning rules.
//!
//! A rule is a single comparison of one named metric against constant operands.
//! Expressions are stored loosely (as persisted) and interpreted by
//! [`dsl::evaluate`], which turns every malformed expression into a failed check
//! with an explanation instead of an error.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod dsl;
pub mod resolve;

pub use dsl::evaluate;
pub use resolve::{RuleSet, RuleSnapshot, RuleStatus, resolve_active_rules};

/// Metrics a rule expression can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Far,
    Height,
    Coverage,
    OpenSpace,
    SkyExposure,
    ArticulationIndex,
    BlockCount,
    MaxBlockLength,
    MinBlockSpacing,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::Far,
        Metric::Height,
        Metric::Coverage,
        Metric::OpenSpace,
        Metric::SkyExposure,
        Metric::ArticulationIndex,
        Metric::BlockCount,
        Metric::MaxBlockLength,
        Metric::MinBlockSpacing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Far => "far",
            Metric::Height => "height",
            Metric::Coverage => "coverage",
            Metric::OpenSpace => "open_space",
            Metric::SkyExposure => "sky_exposure",
            Metric::ArticulationIndex => "articulation_index",
            Metric::BlockCount => "block_count",
            Metric::MaxBlockLength => "max_block_length",
            Metric::MinBlockSpacing => "min_block_spacing",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named numeric values an expression is evaluated against.
///
/// Only metrics that are set are visible; looking up anything else reports an
/// unknown field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    values: BTreeMap<Metric, f64>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.values.insert(metric, value);
        self
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        self.values.insert(metric, value);
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    /// Looks a value up by its metric name.
    pub fn lookup(&self, name: &str) -> Option<f64> {
        Metric::parse(name).and_then(|m| self.get(m))
    }

    /// Builds a state from free-form names, skipping names that are not metrics.
    pub fn from_named<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut state = Self::new();
        for (name, value) in values {
            match Metric::parse(name.as_ref()) {
                Some(metric) => state.set(metric, value),
                None => debug!(field = name.as_ref(), "ignoring unknown state field"),
            }
        }
        state
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.values.iter().map(|(m, v)| (*m, *v))
    }
}

/// Comparison operators of the rule language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Lte,
    Gte,
    Eq,
    Between,
}

impl Operator {
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "lte" => Some(Operator::Lte),
            "gte" => Some(Operator::Gte),
            "eq" => Some(Operator::Eq),
            "between" => Some(Operator::Between),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Lte => "lte",
            Operator::Gte => "gte",
            Operator::Eq => "eq",
            Operator::Between => "between",
        }
    }
}

/// A rule expression as stored, e.g. `{"op": "lte", "field": "far", "value": 500}`.
///
/// Every part is optional so that malformed records still load; validity is
/// decided at evaluation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    #[serde(default)]
    pub op: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Expression {
    fn compare(op: Operator, field: &str, value: f64) -> Self {
        Self {
            op: op.as_str().to_string(),
            field: Some(field.to_string()),
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn lte(field: &str, value: f64) -> Self {
        Self::compare(Operator::Lte, field, value)
    }

    pub fn gte(field: &str, value: f64) -> Self {
        Self::compare(Operator::Gte, field, value)
    }

    pub fn eq(field: &str, value: f64) -> Self {
        Self::compare(Operator::Eq, field, value)
    }

    pub fn between(field: &str, min: f64, max: f64) -> Self {
        Self {
            op: Operator::Between.as_str().to_string(),
            field: Some(field.to_string()),
            min: Some(min),
            max: Some(max),
            ..Self::default()
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        Operator::parse(&self.op)
    }

    /// The bound this expression puts on its field from above, if any.
    pub fn upper_bound(&self) -> Option<f64> {
        match self.operator()? {
            Operator::Lte | Operator::Eq => self.value,
            Operator::Between => self.max,
            Operator::Gte => None,
        }
    }

    /// The bound this expression puts on its field from below, if any.
    pub fn lower_bound(&self) -> Option<f64> {
        match self.operator()? {
            Operator::Gte | Operator::Eq => self.value,
            Operator::Between => self.min,
            Operator::Lte => None,
        }
    }
}

/// Hard rule failures make a candidate infeasible; soft failures are only recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    #[default]
    Hard,
    Soft,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Hard => "hard",
            RuleType::Soft => "soft",
        }
    }
}

fn default_priority() -> i32 {
    100
}

/// One rule of a jurisdiction's rule set. Lower `priority` runs first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub rule_key: String,
    #[serde(default)]
    pub rule_type: RuleType,
    pub expression: Expression,
    #[serde(default = "default_priority")]
    pub priority: i32,
}

impl RuleDefinition {
    pub fn new(rule_key: &str, rule_type: RuleType, expression: Expression, priority: i32) -> Self {
        Self {
            rule_key: rule_key.to_string(),
            rule_type,
            expression,
            priority,
        }
    }

    pub fn hard(rule_key: &str, expression: Expression) -> Self {
        Self::new(rule_key, RuleType::Hard, expression, default_priority())
    }

    pub fn soft(rule_key: &str, expression: Expression) -> Self {
        Self::new(rule_key, RuleType::Soft, expression, default_priority())
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Returns the definitions sorted by ascending priority, ties kept in input order.
pub fn by_priority(definitions: &[RuleDefinition]) -> Vec<&RuleDefinition> {
    let mut sorted: Vec<&RuleDefinition> = definitions.iter().collect();
    sorted.sort_by_key(|d| d.priority);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(Metric::parse(metric.as_str()), Some(metric));
        }
        assert_eq!(Metric::parse("floor_count"), None);
    }

    #[test]
    fn test_state_from_named_skips_unknown() {
        let state = State::from_named([("far", 480.0), ("foo", 1.0)]);
        assert_eq!(state.get(Metric::Far), Some(480.0));
        assert_eq!(state.lookup("foo"), None);
        assert_eq!(state.iter().count(), 1);
    }

    #[test]
    fn test_expression_from_json() {
        let expr: Expression =
            serde_json::from_str(r#"{"op": "lte", "field": "far", "value": 500}"#).unwrap();
        assert_eq!(expr, Expression::lte("far", 500.0));
        assert_eq!(expr.upper_bound(), Some(500.0));
        assert_eq!(expr.lower_bound(), None);
    }

    #[test]
    fn test_malformed_expression_still_loads() {
        let expr: Expression = serde_json::from_str(r#"{"value": 3}"#).unwrap();
        assert_eq!(expr.operator(), None);
        assert_eq!(expr.field, None);
        assert_eq!(expr.upper_bound(), None);
    }

    #[test]
    fn test_between_bounds() {
        let expr = Expression::between("open_space", 20.0, 40.0);
        assert_eq!(expr.upper_bound(), Some(40.0));
        assert_eq!(expr.lower_bound(), Some(20.0));
    }

    #[test]
    fn test_rule_definition_defaults() {
        let rule: RuleDefinition = serde_json::from_str(
            r#"{"rule_key": "max_far", "expression": {"op": "lte", "field": "far", "value": 500}}"#,
        )
        .unwrap();
        assert_eq!(rule.rule_type, RuleType::Hard);
        assert_eq!(rule.priority, 100);
    }

    #[test]
    fn test_by_priority_is_stable() {
        let rules = vec![
            RuleDefinition::hard("b", Expression::lte("far", 1.0)).with_priority(20),
            RuleDefinition::hard("a", Expression::lte("far", 1.0)).with_priority(10),
            RuleDefinition::soft("c", Expression::lte("far", 1.0)).with_priority(20),
        ];
        let keys: Vec<&str> = by_priority(&rules)
            .iter()
            .map(|r| r.rule_key.as_str())
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}
