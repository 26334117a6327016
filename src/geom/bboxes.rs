use crate::geom::EPS;
use crate::geom::point::Point;

/// Axis-aligned bounds `(min, max)` of all points, or `None` if `pts` is empty.
pub fn bounding_box(pts: &[Point]) -> Option<(Point, Point)> {
    let first = pts.first()?;
    let mut pmin = *first;
    let mut pmax = *first;
    for p in pts.iter().skip(1) {
        pmin.x = pmin.x.min(p.x);
        pmin.z = pmin.z.min(p.z);
        pmax.x = pmax.x.max(p.x);
        pmax.z = pmax.z.max(p.z);
    }
    Some((pmin, pmax))
}

/// Checks whether a point is inside a bounding box (boundary included).
pub fn is_point_inside_bbox(ptest: Point, pmin: Point, pmax: Point) -> bool {
    ptest.x >= pmin.x - EPS
        && ptest.x <= pmax.x + EPS
        && ptest.z >= pmin.z - EPS
        && ptest.z <= pmax.z + EPS
}
