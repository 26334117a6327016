//! Renderable massing descriptions.
//!
//! A payload is one of three topologies, tagged by `"type"` in JSON. All
//! lengths are meters in the local site frame (`x` east, `z` north, `y` up)
//! and rounded to 2 decimals.

use serde::{Deserialize, Serialize};

use super::candidate::{Candidate, OptionType};
use super::layout::layout_blocks;
use crate::config::EngineConfig;
use crate::geom::site::SiteMetrics;
use crate::project::Occupancy;
use crate::vecutils::round_to;

/// Height reduction of every other block in a cluster.
pub const ALTERNATE_BLOCK_DROP: f64 = 0.06;
/// Share of the outer courtyard footprint left open in the middle.
pub const COURTYARD_VOID_RATIO: f64 = 0.42;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshBlock {
    pub x: f64,
    pub z: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackSegment {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub base_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MassingMesh {
    MultiBlock {
        blocks: Vec<MeshBlock>,
        site_outline: Vec<[f64; 2]>,
        origin: [f64; 3],
    },
    Stacked {
        segments: Vec<StackSegment>,
        origin: [f64; 3],
    },
    Courtyard {
        outer_width: f64,
        outer_depth: f64,
        inner_width: f64,
        inner_depth: f64,
        height: f64,
        origin: [f64; 3],
    },
}

/// Axis-aligned box; `(x, z)` is the footprint center and `base_y` the bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassBox {
    pub x: f64,
    pub z: f64,
    pub base_y: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl MassBox {
    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }

    /// `(min, max)` corners as `[x, y, z]`.
    pub fn corners(&self) -> ([f64; 3], [f64; 3]) {
        (
            [
                self.x - self.width / 2.0,
                self.base_y,
                self.z - self.depth / 2.0,
            ],
            [
                self.x + self.width / 2.0,
                self.base_y + self.height,
                self.z + self.depth / 2.0,
            ],
        )
    }
}

const ORIGIN: [f64; 3] = [0.0, 0.0, 0.0];

impl MassingMesh {
    /// Topology name as written in the `"type"` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            MassingMesh::MultiBlock { .. } => "multi_block",
            MassingMesh::Stacked { .. } => "stacked",
            MassingMesh::Courtyard { .. } => "courtyard",
        }
    }

    /// Number of blocks actually placed, for multi-block payloads.
    pub fn placed_block_count(&self) -> Option<usize> {
        match self {
            MassingMesh::MultiBlock { blocks, .. } => Some(blocks.len()),
            _ => None,
        }
    }

    /// Decomposes the payload into boxes. A courtyard becomes four wings
    /// around its void.
    pub fn volumes(&self) -> Vec<MassBox> {
        match self {
            MassingMesh::MultiBlock { blocks, .. } => blocks
                .iter()
                .map(|b| MassBox {
                    x: b.x,
                    z: b.z,
                    base_y: 0.0,
                    width: b.width,
                    depth: b.depth,
                    height: b.height,
                })
                .collect(),
            MassingMesh::Stacked { segments, .. } => segments
                .iter()
                .map(|s| MassBox {
                    x: 0.0,
                    z: 0.0,
                    base_y: s.base_y,
                    width: s.width,
                    depth: s.depth,
                    height: s.height,
                })
                .collect(),
            MassingMesh::Courtyard {
                outer_width,
                outer_depth,
                inner_width,
                inner_depth,
                height,
                ..
            } => {
                let ns_depth = (outer_depth - inner_depth) / 2.0;
                let ew_width = (outer_width - inner_width) / 2.0;
                let ns_z = inner_depth / 2.0 + ns_depth / 2.0;
                let ew_x = inner_width / 2.0 + ew_width / 2.0;
                let wing = |x: f64, z: f64, width: f64, depth: f64| MassBox {
                    x,
                    z,
                    base_y: 0.0,
                    width,
                    depth,
                    height: *height,
                };
                vec![
                    wing(0.0, -ns_z, *outer_width, ns_depth),
                    wing(0.0, ns_z, *outer_width, ns_depth),
                    wing(-ew_x, 0.0, ew_width, *inner_depth),
                    wing(ew_x, 0.0, ew_width, *inner_depth),
                ]
            }
        }
    }

    pub fn total_volume_m3(&self) -> f64 {
        self.volumes().iter().map(MassBox::volume).sum()
    }
}

/// Builds the payload of a candidate.
///
/// Housing candidates with more than one block are laid out inside the site
/// ring; the number of blocks in the result may be lower than requested.
/// Everything else becomes a single mass sized from the coverage footprint.
pub fn synthesize(
    candidate: &Candidate,
    site: &SiteMetrics,
    occupancy: &Occupancy,
    config: &EngineConfig,
) -> MassingMesh {
    if candidate.is_multi_block(occupancy) {
        let placed = layout_blocks(
            candidate.block_count,
            candidate.footprint_width_m,
            candidate.footprint_depth_m,
            candidate.building_spacing_m,
            &site.ring,
            config,
        );
        let blocks = placed
            .iter()
            .enumerate()
            .map(|(idx, b)| MeshBlock {
                x: round_to(b.center.x, 2),
                z: round_to(b.center.z, 2),
                width: round_to(b.width, 2),
                depth: round_to(b.depth, 2),
                height: round_to(
                    candidate.height * (1.0 - ALTERNATE_BLOCK_DROP * (idx % 2) as f64),
                    2,
                ),
            })
            .collect();
        return MassingMesh::MultiBlock {
            blocks,
            site_outline: site.ring.points().iter().map(|p| p.to_pair(2)).collect(),
            origin: ORIGIN,
        };
    }

    let footprint_area = site.area_m2 * candidate.coverage / 100.0;
    let side = footprint_area.max(0.0).sqrt();
    let width = (side * 1.08).clamp(18.0, 65.0);
    let depth = (side * 0.92).clamp(16.0, 60.0);
    let h = candidate.height;

    let segment = |factor: f64, height: f64, base_y: f64| StackSegment {
        width: round_to(width * factor, 2),
        depth: round_to(depth * factor, 2),
        height: round_to(height, 2),
        base_y: round_to(base_y, 2),
    };

    match candidate.option_type {
        OptionType::PodiumTower => {
            let podium = (h * 0.28).min(18.0);
            let tower = (h - podium).max(12.0);
            MassingMesh::Stacked {
                segments: vec![segment(1.0, podium, 0.0), segment(0.62, tower, podium)],
                origin: ORIGIN,
            }
        }
        OptionType::SteppedSlab => {
            let level1 = h * 0.42;
            let level2 = h * 0.32;
            let level3 = h - level1 - level2;
            MassingMesh::Stacked {
                segments: vec![
                    segment(1.0, level1, 0.0),
                    segment(0.82, level2, level1),
                    segment(0.66, level3, level1 + level2),
                ],
                origin: ORIGIN,
            }
        }
        _ => MassingMesh::Courtyard {
            outer_width: round_to(width, 2),
            outer_depth: round_to(depth, 2),
            inner_width: round_to(width * COURTYARD_VOID_RATIO, 2),
            inner_depth: round_to(depth * COURTYARD_VOID_RATIO, 2),
            height: round_to(h, 2),
            origin: ORIGIN,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::polygon::Ring;
    use crate::optimize::candidate::PlanFamily;
    use std::collections::BTreeMap;

    fn candidate(option_type: OptionType, block_count: usize, coverage: f64) -> Candidate {
        Candidate {
            option_type,
            far: 300.0,
            height: 50.0,
            coverage,
            open_space_ratio: 60.0,
            sky_exposure: 0.5,
            articulation_index: 85.0,
            block_count,
            floorplate_area_m2: 450.0,
            floors: 16,
            building_spacing_m: 20.0,
            max_block_length_m: 30.0,
            plan_family: PlanFamily::Plate,
            unit_mix: BTreeMap::new(),
            avg_unit_area_m2: 74.6,
            footprint_width_m: 30.0,
            footprint_depth_m: 15.0,
        }
    }

    fn site(side: f64) -> SiteMetrics {
        let mut site = SiteMetrics::fallback();
        site.ring = Ring::rectangle(side, side);
        site.area_m2 = side * side;
        site.width_m = side;
        site.depth_m = side;
        site
    }

    #[test]
    fn test_multi_block_alternates_height() {
        let c = candidate(OptionType::ApartmentLinearCluster, 4, 20.0);
        let mesh = synthesize(&c, &site(200.0), &Occupancy::Residential, &EngineConfig::new());
        let MassingMesh::MultiBlock {
            blocks,
            site_outline,
            origin,
        } = &mesh
        else {
            panic!("expected multi_block, got {}", mesh.kind());
        };
        assert_eq!(blocks.len(), 4);
        assert_eq!(mesh.placed_block_count(), Some(4));
        assert_eq!(blocks[0].height, 50.0);
        assert_eq!(blocks[1].height, 47.0);
        assert_eq!(blocks[2].height, 50.0);
        assert_eq!(site_outline.first(), site_outline.last());
        assert_eq!(*origin, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_single_block_housing_is_single_mass() {
        let c = candidate(OptionType::ApartmentLinearCluster, 1, 20.0);
        let mesh = synthesize(&c, &site(100.0), &Occupancy::Residential, &EngineConfig::new());
        assert_eq!(mesh.kind(), "courtyard");
        assert_eq!(mesh.placed_block_count(), None);
    }

    #[test]
    fn test_podium_tower() {
        let mut c = candidate(OptionType::PodiumTower, 1, 25.0);
        c.height = 100.0;
        // footprint 2500 m2 -> side 50
        let mesh = synthesize(&c, &site(100.0), &Occupancy::from("office"), &EngineConfig::new());
        let MassingMesh::Stacked { segments, .. } = &mesh else {
            panic!("expected stacked");
        };
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].width, 54.0);
        assert_eq!(segments[0].depth, 46.0);
        assert_eq!(segments[0].height, 18.0);
        assert_eq!(segments[1].base_y, 18.0);
        assert_eq!(segments[1].height, 82.0);
        assert_eq!(segments[1].width, 33.48);
    }

    #[test]
    fn test_stepped_slab_levels_sum_to_height() {
        let c = candidate(OptionType::SteppedSlab, 1, 25.0);
        let mesh = synthesize(&c, &site(100.0), &Occupancy::from("office"), &EngineConfig::new());
        let MassingMesh::Stacked { segments, .. } = &mesh else {
            panic!("expected stacked");
        };
        assert_eq!(segments.len(), 3);
        let top = segments[2].base_y + segments[2].height;
        assert!((top - 50.0).abs() < 0.02);
        assert!(segments[0].width > segments[1].width && segments[1].width > segments[2].width);
    }

    #[test]
    fn test_footprint_is_clamped() {
        let c = candidate(OptionType::CourtyardBlock, 1, 1.0);
        let mesh = synthesize(&c, &site(50.0), &Occupancy::from("office"), &EngineConfig::new());
        let MassingMesh::Courtyard {
            outer_width,
            outer_depth,
            inner_width,
            ..
        } = mesh
        else {
            panic!("expected courtyard");
        };
        assert_eq!(outer_width, 18.0);
        assert_eq!(outer_depth, 16.0);
        assert_eq!(inner_width, 7.56);
    }

    #[test]
    fn test_courtyard_volume() {
        let mesh = MassingMesh::Courtyard {
            outer_width: 50.0,
            outer_depth: 40.0,
            inner_width: 20.0,
            inner_depth: 10.0,
            height: 10.0,
            origin: ORIGIN,
        };
        assert_eq!(mesh.volumes().len(), 4);
        assert!((mesh.total_volume_m3() - (2000.0 - 200.0) * 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_payload_json_tag() {
        let mesh = MassingMesh::Stacked {
            segments: vec![StackSegment {
                width: 10.0,
                depth: 10.0,
                height: 5.0,
                base_y: 0.0,
            }],
            origin: ORIGIN,
        };
        let json = serde_json::to_value(&mesh).unwrap();
        assert_eq!(json["type"], "stacked");
        assert_eq!(json["segments"][0]["base_y"], 0.0);
        let back: MassingMesh = serde_json::from_value(json).unwrap();
        assert_eq!(back, mesh);
    }
}
