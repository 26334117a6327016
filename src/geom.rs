pub mod bboxes;
pub mod point;
pub mod polygon;
pub mod site;

/// Geometric precision (m)
const EPS: f64 = 1e-9;
