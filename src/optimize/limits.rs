use serde::{Deserialize, Serialize};
use tracing::debug;

use super::jurisdiction::Jurisdiction;
use crate::project::Requirements;
use crate::rules::{RuleDefinition, by_priority};

/// FAR ceiling used when neither the user nor a rule caps it (%).
pub const FAR_CAP: f64 = 999.0;

pub const RULE_MAX_FAR: &str = "max_far";
pub const RULE_MAX_HEIGHT: &str = "max_height";
pub const RULE_MAX_COVERAGE: &str = "max_coverage";
pub const RULE_MAX_SKY_EXPOSURE: &str = "max_sky_exposure";
pub const RULE_MIN_OPEN_SPACE: &str = "min_open_space";

/// Tightest limits from user requirements, active rules and jurisdiction defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegalLimits {
    pub far_upper: f64,
    pub height_upper: f64,
    pub coverage_upper: f64,
    pub sky_exposure_max: f64,
    pub open_space_min: f64,
    pub min_building_spacing: f64,
}

/// First upper bound set by a rule named `key`, in priority order.
fn rule_upper(definitions: &[&RuleDefinition], key: &str) -> Option<f64> {
    definitions
        .iter()
        .filter(|d| d.rule_key == key)
        .find_map(|d| d.expression.upper_bound())
}

/// First lower bound set by a rule named `key`, in priority order.
fn rule_lower(definitions: &[&RuleDefinition], key: &str) -> Option<f64> {
    definitions
        .iter()
        .filter(|d| d.rule_key == key)
        .find_map(|d| d.expression.lower_bound())
}

fn tightest_upper(bounds: &[Option<f64>], fallback: f64) -> f64 {
    bounds.iter().flatten().fold(fallback, |acc, v| acc.min(*v))
}

fn tightest_lower(bounds: &[Option<f64>], fallback: f64) -> f64 {
    bounds.iter().flatten().fold(fallback, |acc, v| acc.max(*v))
}

impl LegalLimits {
    /// Upper bounds take the minimum, the open space floor takes the maximum.
    pub fn resolve(
        rule_definitions: &[RuleDefinition],
        requirements: &Requirements,
        jurisdiction: Jurisdiction,
    ) -> Self {
        let defaults = jurisdiction.defaults();
        let sorted = by_priority(rule_definitions);

        let limits = Self {
            far_upper: tightest_upper(
                &[requirements.far_max(), rule_upper(&sorted, RULE_MAX_FAR)],
                FAR_CAP,
            ),
            height_upper: tightest_upper(
                &[
                    requirements.height_max(),
                    rule_upper(&sorted, RULE_MAX_HEIGHT),
                ],
                defaults.height_soft_upper,
            ),
            coverage_upper: tightest_upper(
                &[rule_upper(&sorted, RULE_MAX_COVERAGE)],
                defaults.coverage_upper,
            ),
            sky_exposure_max: tightest_upper(
                &[rule_upper(&sorted, RULE_MAX_SKY_EXPOSURE)],
                defaults.sky_exposure_max,
            ),
            open_space_min: tightest_lower(
                &[rule_lower(&sorted, RULE_MIN_OPEN_SPACE)],
                defaults.open_space_min,
            ),
            min_building_spacing: defaults.min_building_spacing,
        };
        debug!(?jurisdiction, ?limits, "resolved legal limits");
        limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Requirement;
    use crate::rules::Expression;

    fn far_rule(value: f64) -> RuleDefinition {
        RuleDefinition::hard(RULE_MAX_FAR, Expression::lte("far", value))
    }

    #[test]
    fn test_tightest_far_wins() {
        let reqs: Requirements = vec![Requirement::new("far").with_max(400.0)].into();
        let limits = LegalLimits::resolve(&[far_rule(500.0)], &reqs, Jurisdiction::Korea);
        assert_eq!(limits.far_upper, 400.0);

        let reqs: Requirements = vec![Requirement::new("far").with_max(700.0)].into();
        let limits = LegalLimits::resolve(&[far_rule(500.0)], &reqs, Jurisdiction::Korea);
        assert_eq!(limits.far_upper, 500.0);
    }

    #[test]
    fn test_defaults_without_rules() {
        let limits = LegalLimits::resolve(&[], &Requirements::new(), Jurisdiction::Singapore);
        assert_eq!(limits.far_upper, FAR_CAP);
        assert_eq!(limits.height_upper, 140.0);
        assert_eq!(limits.coverage_upper, 50.0);
        assert_eq!(limits.sky_exposure_max, 0.72);
        assert_eq!(limits.open_space_min, 28.0);
        assert_eq!(limits.min_building_spacing, 24.0);
    }

    #[test]
    fn test_rules_never_loosen_defaults() {
        let rules = vec![
            RuleDefinition::hard(RULE_MAX_COVERAGE, Expression::lte("coverage", 80.0)),
            RuleDefinition::hard(RULE_MIN_OPEN_SPACE, Expression::gte("open_space", 10.0)),
            RuleDefinition::hard(RULE_MAX_HEIGHT, Expression::lte("height", 300.0)),
        ];
        let limits = LegalLimits::resolve(&rules, &Requirements::new(), Jurisdiction::Korea);
        assert_eq!(limits.coverage_upper, 60.0);
        assert_eq!(limits.open_space_min, 22.0);
        assert_eq!(limits.height_upper, 120.0);
    }

    #[test]
    fn test_rules_tighten_defaults() {
        let rules = vec![
            RuleDefinition::hard(RULE_MAX_COVERAGE, Expression::between("coverage", 0.0, 45.0)),
            RuleDefinition::soft(RULE_MIN_OPEN_SPACE, Expression::gte("open_space", 35.0)),
            RuleDefinition::hard(RULE_MAX_SKY_EXPOSURE, Expression::eq("sky_exposure", 0.6)),
        ];
        let limits = LegalLimits::resolve(&rules, &Requirements::new(), Jurisdiction::NewYork);
        assert_eq!(limits.coverage_upper, 45.0);
        assert_eq!(limits.open_space_min, 35.0);
        assert_eq!(limits.sky_exposure_max, 0.6);
    }

    #[test]
    fn test_first_rule_in_priority_order_wins() {
        let rules = vec![
            far_rule(300.0).with_priority(50),
            far_rule(450.0).with_priority(10),
        ];
        let limits = LegalLimits::resolve(&rules, &Requirements::new(), Jurisdiction::Korea);
        assert_eq!(limits.far_upper, 450.0);
    }

    #[test]
    fn test_malformed_rule_is_ignored() {
        let rules = vec![RuleDefinition::hard(
            RULE_MAX_FAR,
            Expression {
                op: "lt".to_string(),
                ..Expression::lte("far", 10.0)
            },
        )];
        let limits = LegalLimits::resolve(&rules, &Requirements::new(), Jurisdiction::Korea);
        assert_eq!(limits.far_upper, FAR_CAP);
    }
}
