use crate::geom::EPS;
use crate::vecutils::round_to;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Point on the local site plan, in meters from the site centroid.
///
/// `x` runs east, `z` runs north; the vertical axis of the massing models is `y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Returns true if both points are very close to each other.
    pub fn is_close(&self, other: &Self) -> bool {
        (self.x - other.x).abs() < EPS && (self.z - other.z).abs() < EPS
    }

    /// Returns a copy moved by `(dx, dz)`.
    pub fn offset(&self, dx: f64, dz: f64) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// `[x, z]` rounded for reporting.
    pub fn to_pair(&self, decimals: i32) -> [f64; 2] {
        [round_to(self.x, decimals), round_to(self.z, decimals)]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(2); // Default 2 decimals
        write!(f, "Point({:.prec$}, {:.prec$})", self.x, self.z, prec = prec)
    }
}
