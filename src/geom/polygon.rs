use crate::geom::bboxes::bounding_box;
use crate::geom::point::Point;
use serde::{Deserialize, Serialize};

pub mod containment;

use containment::{is_point_inside_ring, is_rect_inside_ring};

/// Closed planar ring in local site meters.
///
/// The first point is repeated at the end. Winding order is not normalized;
/// [`Ring::signed_area`] is positive for counter-clockwise rings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pts: Vec<Point>,
}

impl Ring {
    /// Creates a ring, appending the first point if the input is not closed.
    pub fn new(mut pts: Vec<Point>) -> Self {
        if let (Some(first), Some(last)) = (pts.first().copied(), pts.last().copied()) {
            if pts.len() > 1 && !first.is_close(&last) {
                pts.push(first);
            }
        }
        Self { pts }
    }

    /// Axis-aligned rectangle centered at the origin.
    pub fn rectangle(width: f64, depth: f64) -> Self {
        let hw = width / 2.0;
        let hd = depth / 2.0;
        Self::new(vec![
            Point::new(-hw, -hd),
            Point::new(hw, -hd),
            Point::new(hw, hd),
            Point::new(-hw, hd),
        ])
    }

    pub fn points(&self) -> &[Point] {
        &self.pts
    }

    pub fn len(&self) -> usize {
        self.pts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pts.is_empty()
    }

    /// Shoelace area; positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        let twice_area: f64 = self
            .pts
            .windows(2)
            .map(|w| w[0].x * w[1].z - w[1].x * w[0].z)
            .sum();
        twice_area / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Returns `(min, max)` corners, or `None` for an empty ring.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        bounding_box(&self.pts)
    }

    /// Extent along `x`.
    pub fn width(&self) -> f64 {
        self.bounds().map_or(0.0, |(pmin, pmax)| pmax.x - pmin.x)
    }

    /// Extent along `z`.
    pub fn depth(&self) -> f64 {
        self.bounds().map_or(0.0, |(pmin, pmax)| pmax.z - pmin.z)
    }

    /// Even-odd containment test.
    pub fn contains(&self, ptest: Point) -> bool {
        is_point_inside_ring(ptest, &self.pts)
    }

    /// Checks that all four corners of an axis-aligned rectangle, grown by
    /// `offset` on every side, lie inside the ring.
    pub fn contains_rect(&self, center: Point, width: f64, depth: f64, offset: f64) -> bool {
        is_rect_inside_ring(
            center,
            width / 2.0 + offset,
            depth / 2.0 + offset,
            &self.pts,
        )
    }
}
