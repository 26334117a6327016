use crate::geom::bboxes::{bounding_box, is_point_inside_bbox};
use crate::geom::point::Point;

/// Checks if a point lies inside a closed ring (even-odd ray casting).
///
/// A horizontal ray is cast from `ptest` towards `+x`; each edge it crosses
/// toggles the result. Points exactly on the boundary may fall on either side.
/// Horizontal edges use a `1e-9` denominator instead of zero.
pub fn is_point_inside_ring(ptest: Point, pts: &[Point]) -> bool {
    let mut inside = false;
    for edge in pts.windows(2) {
        let (p1, p2) = (edge[0], edge[1]);
        if (p1.z > ptest.z) != (p2.z > ptest.z) {
            let dz = if p2.z - p1.z == 0.0 { 1e-9 } else { p2.z - p1.z };
            let x_cross = (p2.x - p1.x) * (ptest.z - p1.z) / dz + p1.x;
            if ptest.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// Checks that all four corners of an axis-aligned rectangle lie inside a ring.
///
/// `half_w` and `half_d` are the half extents along `x` and `z`.
pub fn is_rect_inside_ring(center: Point, half_w: f64, half_d: f64, pts: &[Point]) -> bool {
    let Some((pmin, pmax)) = bounding_box(pts) else {
        return false;
    };
    let corners = [
        center.offset(-half_w, -half_d),
        center.offset(half_w, -half_d),
        center.offset(half_w, half_d),
        center.offset(-half_w, half_d),
    ];
    // Cheap reject before the per-edge test
    if corners.iter().any(|c| !is_point_inside_bbox(*c, pmin, pmax)) {
        return false;
    }
    corners.iter().all(|c| is_point_inside_ring(*c, pts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_square() -> Vec<Point> {
        vec![
            Point::new(0., 0.),
            Point::new(1., 0.),
            Point::new(1., 1.),
            Point::new(0., 1.),
            Point::new(0., 0.),
        ]
    }

    fn make_l_shape() -> Vec<Point> {
        vec![
            Point::new(0., 0.),
            Point::new(1., 0.),
            Point::new(1., 1.),
            Point::new(2., 1.),
            Point::new(2., 2.),
            Point::new(0., 2.),
            Point::new(0., 0.),
        ]
    }

    #[test]
    fn test_point_inside_square() {
        let pts = make_square();
        assert!(is_point_inside_ring(Point::new(0.5, 0.5), &pts));
    }

    #[test]
    fn test_point_outside_square() {
        let pts = make_square();
        assert!(!is_point_inside_ring(Point::new(1.5, 0.5), &pts));
        assert!(!is_point_inside_ring(Point::new(0.5, -0.5), &pts));
        assert!(!is_point_inside_ring(Point::new(-0.5, 0.5), &pts));
    }

    #[test]
    fn test_winding_does_not_matter() {
        let mut pts = make_square();
        pts.reverse();
        assert!(is_point_inside_ring(Point::new(0.5, 0.5), &pts));
        assert!(!is_point_inside_ring(Point::new(1.5, 0.5), &pts));
    }

    #[test]
    fn test_l_shaped_ring() {
        let pts = make_l_shape();
        assert!(is_point_inside_ring(Point::new(0.5, 0.5), &pts));
        assert!(is_point_inside_ring(Point::new(0.5, 1.5), &pts));
        assert!(is_point_inside_ring(Point::new(1.5, 1.5), &pts));
        // In the cutout
        assert!(!is_point_inside_ring(Point::new(1.5, 0.5), &pts));
        // Completely outside
        assert!(!is_point_inside_ring(Point::new(3.0, 1.0), &pts));
    }

    #[test]
    fn test_degenerate_rings() {
        assert!(!is_point_inside_ring(Point::new(0., 0.), &[]));
        assert!(!is_point_inside_ring(Point::new(0., 0.), &[Point::new(0., 0.)]));
    }

    #[test]
    fn test_rect_inside_l_shape() {
        let pts = make_l_shape();
        assert!(is_rect_inside_ring(Point::new(0.5, 1.0), 0.4, 0.9, &pts));
        // Crosses into the cutout
        assert!(!is_rect_inside_ring(Point::new(1.0, 0.6), 0.4, 0.4, &pts));
        // Pokes out of the bounding box
        assert!(!is_rect_inside_ring(Point::new(1.9, 1.5), 0.4, 0.4, &pts));
    }

    #[test]
    fn test_rect_against_empty_ring() {
        assert!(!is_rect_inside_ring(Point::new(0., 0.), 1.0, 1.0, &[]));
    }
}
