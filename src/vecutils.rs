//! Numeric helpers shared by the scoring and geometry code.

/// Arithmetic mean; zero for an empty slice.
pub fn mean(vec: &[f64]) -> f64 {
    vec.iter().sum::<f64>() / vec.len().max(1) as f64
}

/// Rounds to a fixed number of decimals (used for reported values only).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
