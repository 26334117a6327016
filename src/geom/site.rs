//! Site analysis: geographic boundary to local planar metrics.
//!
//! The boundary arrives as a GeoJSON-style polygon in longitude/latitude and is
//! projected with an equirectangular approximation centered on the ring
//! centroid. That is accurate enough for parcels of a few hundred meters.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::geom::point::Point;
use crate::geom::polygon::Ring;

/// Meters per degree of longitude at the equator.
pub const M_PER_DEG_LNG: f64 = 111_320.0;
/// Meters per degree of latitude.
pub const M_PER_DEG_LAT: f64 = 110_540.0;
/// Floors applied to the analyzed metrics so later divisions stay stable.
pub const MIN_SITE_AREA_M2: f64 = 500.0;
pub const MIN_SITE_SPAN_M: f64 = 24.0;
/// Side of the square substituted for missing or degenerate boundaries.
pub const FALLBACK_SITE_SIDE_M: f64 = 50.0;

fn polygon_kind() -> String {
    "Polygon".to_string()
}

/// GeoJSON-style polygon. `coordinates[0]` is the outer ring of `[lng, lat]`
/// positions; any further rings (holes) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteGeometry {
    #[serde(rename = "type", default = "polygon_kind")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Vec<Vec<Vec<f64>>>,
}

impl Default for SiteGeometry {
    fn default() -> Self {
        Self {
            kind: polygon_kind(),
            coordinates: vec![],
        }
    }
}

impl SiteGeometry {
    /// Builds a polygon from `[lng, lat]` positions of the outer ring.
    pub fn polygon(ring: &[[f64; 2]]) -> Self {
        Self {
            kind: polygon_kind(),
            coordinates: vec![ring.iter().map(|p| p.to_vec()).collect()],
        }
    }

    /// Outer ring as `(lng, lat)` pairs. Positions with fewer than two
    /// coordinates are skipped; altitude, if present, is ignored.
    pub fn outer_ring(&self) -> Vec<(f64, f64)> {
        self.coordinates
            .first()
            .map(|ring| {
                ring.iter()
                    .filter(|pos| pos.len() >= 2)
                    .map(|pos| (pos[0], pos[1]))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Mean `(latitude, longitude)` of the outer ring positions.
    pub fn centroid_lat_lng(&self) -> Option<(f64, f64)> {
        let ring = self.outer_ring();
        if ring.is_empty() {
            return None;
        }
        let n = ring.len() as f64;
        let lng = ring.iter().map(|p| p.0).sum::<f64>() / n;
        let lat = ring.iter().map(|p| p.1).sum::<f64>() / n;
        if lat.is_finite() && lng.is_finite() {
            Some((lat, lng))
        } else {
            None
        }
    }
}

/// Planar site description used by the layout and scoring steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteMetrics {
    /// Site area, floored at [`MIN_SITE_AREA_M2`].
    pub area_m2: f64,
    /// East-west extent, floored at [`MIN_SITE_SPAN_M`].
    pub width_m: f64,
    /// North-south extent, floored at [`MIN_SITE_SPAN_M`].
    pub depth_m: f64,
    /// Closed boundary ring in meters around the centroid.
    pub ring: Ring,
    /// True when the boundary was unusable and the default square was substituted.
    pub is_fallback: bool,
}

impl SiteMetrics {
    /// Projects a site boundary to local meters and measures it.
    ///
    /// Never fails: a missing ring, fewer than four positions, or non-finite
    /// coordinates yield [`SiteMetrics::fallback`].
    pub fn analyze(geometry: &SiteGeometry) -> Self {
        let ring_ll = geometry.outer_ring();
        if ring_ll.len() < 4 {
            warn!(
                positions = ring_ll.len(),
                "site boundary has fewer than 4 positions, using fallback square"
            );
            return Self::fallback();
        }
        if ring_ll.iter().any(|(lng, lat)| !lng.is_finite() || !lat.is_finite()) {
            warn!("site boundary has non-finite coordinates, using fallback square");
            return Self::fallback();
        }

        let n = ring_ll.len() as f64;
        let lng_center = ring_ll.iter().map(|p| p.0).sum::<f64>() / n;
        let lat_center = ring_ll.iter().map(|p| p.1).sum::<f64>() / n;
        let lng_scale = M_PER_DEG_LNG * lat_center.to_radians().cos();

        let pts: Vec<Point> = ring_ll
            .iter()
            .map(|(lng, lat)| {
                Point::new(
                    (lng - lng_center) * lng_scale,
                    (lat - lat_center) * M_PER_DEG_LAT,
                )
            })
            .collect();
        let ring = Ring::new(pts);

        Self {
            area_m2: ring.area().max(MIN_SITE_AREA_M2),
            width_m: ring.width().max(MIN_SITE_SPAN_M),
            depth_m: ring.depth().max(MIN_SITE_SPAN_M),
            ring,
            is_fallback: false,
        }
    }

    /// 50 x 50 m square centered at the origin.
    pub fn fallback() -> Self {
        let ring = Ring::rectangle(FALLBACK_SITE_SIDE_M, FALLBACK_SITE_SIDE_M);
        Self {
            area_m2: FALLBACK_SITE_SIDE_M * FALLBACK_SITE_SIDE_M,
            width_m: FALLBACK_SITE_SIDE_M,
            depth_m: FALLBACK_SITE_SIDE_M,
            ring,
            is_fallback: true,
        }
    }
}
