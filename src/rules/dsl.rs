use super::{Expression, Operator, State};

/// Absolute tolerance of the `eq` operator.
pub const EQ_TOLERANCE: f64 = 1e-9;

/// Evaluates a rule expression against a state.
///
/// Returns whether the check passed and a human-readable explanation naming the
/// field, its current value, the comparator and the operands. Never panics and
/// never errors: a missing field, a field absent from `state`, an unsupported
/// operator or a missing operand all produce `(false, reason)`.
pub fn evaluate(expression: &Expression, state: &State) -> (bool, String) {
    let Some(field) = expression.field.as_deref() else {
        return (false, "expression.field is required".to_string());
    };
    let Some(current) = state.lookup(field) else {
        return (false, format!("state has no field '{field}'"));
    };
    let Some(op) = expression.operator() else {
        return (false, format!("unsupported op '{}'", expression.op));
    };

    match op {
        Operator::Lte | Operator::Gte | Operator::Eq => {
            let Some(target) = expression.value else {
                return (
                    false,
                    format!("expression.value is required for '{}'", op.as_str()),
                );
            };
            match op {
                Operator::Lte => (current <= target, format!("{field}={current:.2} <= {target}")),
                Operator::Gte => (current >= target, format!("{field}={current:.2} >= {target}")),
                _ => (
                    (current - target).abs() < EQ_TOLERANCE,
                    format!("{field}={current:.2} == {target}"),
                ),
            }
        }
        Operator::Between => {
            let (Some(low), Some(high)) = (expression.min, expression.max) else {
                return (
                    false,
                    "expression.min and expression.max are required for 'between'".to_string(),
                );
            };
            (
                low <= current && current <= high,
                format!("{low} <= {field}={current:.2} <= {high}"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Metric;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn far_state(far: f64) -> State {
        State::new().with(Metric::Far, far)
    }

    #[test]
    fn test_lte_passes() {
        let (passed, detail) = evaluate(&Expression::lte("far", 500.0), &far_state(480.0));
        assert!(passed);
        assert_eq!(detail, "far=480.00 <= 500");
    }

    #[test]
    fn test_lte_fails() {
        let (passed, detail) = evaluate(&Expression::lte("far", 500.0), &far_state(520.0));
        assert!(!passed);
        assert!(detail.contains("520"));
        assert!(detail.contains("500"));
    }

    #[test]
    fn test_gte() {
        let state = State::new().with(Metric::OpenSpace, 30.0);
        assert!(evaluate(&Expression::gte("open_space", 22.0), &state).0);
        assert!(!evaluate(&Expression::gte("open_space", 31.5), &state).0);
        assert_eq!(
            evaluate(&Expression::gte("open_space", 31.5), &state).1,
            "open_space=30.00 >= 31.5"
        );
    }

    #[test]
    fn test_eq_uses_tolerance() {
        let state = State::new().with(Metric::BlockCount, 3.0 + 1e-12);
        assert!(evaluate(&Expression::eq("block_count", 3.0), &state).0);
        assert!(!evaluate(&Expression::eq("block_count", 3.001), &state).0);
    }

    #[test]
    fn test_between_fails() {
        let state = State::new().with(Metric::Height, 50.0);
        let (passed, detail) = evaluate(&Expression::between("height", 20.0, 40.0), &state);
        assert!(!passed);
        assert!(detail.contains("<= height=50.00 <="), "{detail}");
    }

    #[test]
    fn test_between_is_inclusive() {
        let expr = Expression::between("height", 20.0, 40.0);
        let at = |h| State::new().with(Metric::Height, h);
        assert!(evaluate(&expr, &at(20.0)).0);
        assert!(evaluate(&expr, &at(40.0)).0);
        assert!(!evaluate(&expr, &at(40.01)).0);
    }

    #[test]
    fn test_missing_field() {
        let expr = Expression {
            op: "lte".to_string(),
            value: Some(1.0),
            ..Expression::default()
        };
        let (passed, detail) = evaluate(&expr, &far_state(1.0));
        assert!(!passed);
        assert!(detail.contains("field is required"));
    }

    #[test]
    fn test_unknown_field() {
        let (passed, detail) = evaluate(&Expression::lte("height", 10.0), &far_state(1.0));
        assert!(!passed);
        assert_eq!(detail, "state has no field 'height'");

        let (passed, detail) = evaluate(&Expression::lte("parking_ratio", 10.0), &far_state(1.0));
        assert!(!passed);
        assert!(detail.contains("parking_ratio"));
    }

    #[test]
    fn test_unsupported_operator() {
        let expr = Expression {
            op: "lt".to_string(),
            ..Expression::lte("far", 500.0)
        };
        let (passed, detail) = evaluate(&expr, &far_state(1.0));
        assert!(!passed);
        assert_eq!(detail, "unsupported op 'lt'");
    }

    #[test]
    fn test_missing_operands() {
        let expr = Expression {
            value: None,
            ..Expression::lte("far", 0.0)
        };
        assert!(!evaluate(&expr, &far_state(1.0)).0);

        let expr = Expression {
            max: None,
            ..Expression::between("far", 0.0, 1.0)
        };
        let (passed, detail) = evaluate(&expr, &far_state(0.5));
        assert!(!passed);
        assert!(detail.contains("between"));
    }

    #[test]
    fn test_nan_state_fails() {
        assert!(!evaluate(&Expression::lte("far", 500.0), &far_state(f64::NAN)).0);
    }

    #[test]
    fn test_deterministic_over_random_inputs() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let value: f64 = rng.gen_range(0.0..1000.0);
            let target: f64 = rng.gen_range(0.0..1000.0);
            let expr = match rng.gen_range(0..4) {
                0 => Expression::lte("far", target),
                1 => Expression::gte("far", target),
                2 => Expression::eq("far", target),
                _ => Expression::between("far", target - 50.0, target + 50.0),
            };
            let state = far_state(value);
            let first = evaluate(&expr, &state);
            let second = evaluate(&expr, &state);
            assert_eq!(first, second);
            assert!(first.1.contains("far="));
        }
    }
}
