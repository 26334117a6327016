//! The fixed menu of massing variants.
//!
//! Each variant is a static profile of factors applied to the resolved legal
//! limits. Housing programs get three multi-block clusters, every other
//! occupancy gets three single-mass buildings. The menu never changes size or
//! order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::jurisdiction::Jurisdiction;
use super::limits::LegalLimits;
use crate::geom::site::SiteMetrics;
use crate::project::Occupancy;

/// Floor-to-floor height of housing blocks (m).
pub const RESIDENTIAL_FLOOR_HEIGHT: f64 = 3.1;
/// Floor-to-floor height of single-mass buildings (m).
pub const SINGLE_MASS_FLOOR_HEIGHT: f64 = 3.6;
pub const MIN_RESIDENTIAL_FLOORS: usize = 8;
pub const MAX_RESIDENTIAL_FLOORS: usize = 35;
pub const MIN_SINGLE_MASS_FLOORS: usize = 5;
pub const MAX_CLUSTER_BLOCKS: usize = 8;
/// Largest share of the site width (or depth) one block footprint may take.
pub const FOOTPRINT_SITE_SHARE: f64 = 0.42;
pub const MAX_SKY_EXPOSURE: f64 = 0.9;

/// Massing typology tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanFamily {
    Plate,
    Tower,
    Hybrid,
    SingleMass,
}

impl PlanFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanFamily::Plate => "plate",
            PlanFamily::Tower => "tower",
            PlanFamily::Hybrid => "hybrid",
            PlanFamily::SingleMass => "single_mass",
        }
    }

    /// Plan families housing developers recognize as marketable.
    pub fn is_housing_family(&self) -> bool {
        !matches!(self, PlanFamily::SingleMass)
    }
}

/// Factors of a multi-block housing cluster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterProfile {
    pub plan_family: PlanFamily,
    pub far_factor: f64,
    pub height_factor: f64,
    /// Preferred floorplate per block (m2).
    pub base_floorplate: f64,
    /// Width-to-sqrt(floorplate) ratio of a block.
    pub slenderness: f64,
    pub articulation: f64,
}

/// Factors of a single-mass building.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingleMassProfile {
    pub far_factor: f64,
    pub height_factor: f64,
    pub coverage_cap: f64,
    /// Added to the legal open space floor before taking the maximum with `open_space_floor`.
    pub open_space_margin: f64,
    pub open_space_floor: f64,
    pub sky_exposure: f64,
    pub articulation: f64,
    pub floorplate: f64,
    pub max_block_length: f64,
    pub footprint_width: f64,
    pub footprint_depth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Profile {
    Cluster(&'static ClusterProfile),
    SingleMass(&'static SingleMassProfile),
}

static LINEAR_CLUSTER: ClusterProfile = ClusterProfile {
    plan_family: PlanFamily::Plate,
    far_factor: 1.0,
    height_factor: 0.82,
    base_floorplate: 760.0,
    slenderness: 2.25,
    articulation: 81.0,
};

static TOWER_CLUSTER: ClusterProfile = ClusterProfile {
    plan_family: PlanFamily::Tower,
    far_factor: 0.95,
    height_factor: 0.9,
    base_floorplate: 560.0,
    slenderness: 1.35,
    articulation: 88.0,
};

static HYBRID_CLUSTER: ClusterProfile = ClusterProfile {
    plan_family: PlanFamily::Hybrid,
    far_factor: 0.92,
    height_factor: 0.78,
    base_floorplate: 640.0,
    slenderness: 1.75,
    articulation: 90.0,
};

static PODIUM_TOWER: SingleMassProfile = SingleMassProfile {
    far_factor: 1.0,
    height_factor: 0.88,
    coverage_cap: 48.0,
    open_space_margin: 0.0,
    open_space_floor: 52.0,
    sky_exposure: 0.62,
    articulation: 82.0,
    floorplate: 720.0,
    max_block_length: 58.0,
    footprint_width: 44.0,
    footprint_depth: 30.0,
};

static STEPPED_SLAB: SingleMassProfile = SingleMassProfile {
    far_factor: 0.94,
    height_factor: 0.8,
    coverage_cap: 42.0,
    open_space_margin: 3.0,
    open_space_floor: 58.0,
    sky_exposure: 0.58,
    articulation: 90.0,
    floorplate: 660.0,
    max_block_length: 52.0,
    footprint_width: 40.0,
    footprint_depth: 28.0,
};

static COURTYARD_BLOCK: SingleMassProfile = SingleMassProfile {
    far_factor: 0.9,
    height_factor: 0.74,
    coverage_cap: 52.0,
    open_space_margin: 6.0,
    open_space_floor: 56.0,
    sky_exposure: 0.56,
    articulation: 86.0,
    floorplate: 820.0,
    max_block_length: 60.0,
    footprint_width: 50.0,
    footprint_depth: 34.0,
};

/// Named massing variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    ApartmentLinearCluster,
    ApartmentTowerCluster,
    ApartmentHybridCluster,
    PodiumTower,
    SteppedSlab,
    CourtyardBlock,
}

impl OptionType {
    pub const HOUSING_MENU: [OptionType; 3] = [
        OptionType::ApartmentLinearCluster,
        OptionType::ApartmentTowerCluster,
        OptionType::ApartmentHybridCluster,
    ];

    pub const SINGLE_MASS_MENU: [OptionType; 3] = [
        OptionType::PodiumTower,
        OptionType::SteppedSlab,
        OptionType::CourtyardBlock,
    ];

    /// Variants offered for an occupancy, in declared order.
    pub fn menu(occupancy: &Occupancy) -> &'static [OptionType; 3] {
        if occupancy.is_housing() {
            &Self::HOUSING_MENU
        } else {
            &Self::SINGLE_MASS_MENU
        }
    }

    pub fn profile(&self) -> Profile {
        match self {
            OptionType::ApartmentLinearCluster => Profile::Cluster(&LINEAR_CLUSTER),
            OptionType::ApartmentTowerCluster => Profile::Cluster(&TOWER_CLUSTER),
            OptionType::ApartmentHybridCluster => Profile::Cluster(&HYBRID_CLUSTER),
            OptionType::PodiumTower => Profile::SingleMass(&PODIUM_TOWER),
            OptionType::SteppedSlab => Profile::SingleMass(&STEPPED_SLAB),
            OptionType::CourtyardBlock => Profile::SingleMass(&COURTYARD_BLOCK),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::ApartmentLinearCluster => "apartment_linear_cluster",
            OptionType::ApartmentTowerCluster => "apartment_tower_cluster",
            OptionType::ApartmentHybridCluster => "apartment_hybrid_cluster",
            OptionType::PodiumTower => "podium_tower",
            OptionType::SteppedSlab => "stepped_slab",
            OptionType::CourtyardBlock => "courtyard_block",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully parameterized massing proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub option_type: OptionType,
    pub far: f64,
    pub height: f64,
    pub coverage: f64,
    pub open_space_ratio: f64,
    pub sky_exposure: f64,
    pub articulation_index: f64,
    pub block_count: usize,
    pub floorplate_area_m2: f64,
    pub floors: usize,
    pub building_spacing_m: f64,
    pub max_block_length_m: f64,
    pub plan_family: PlanFamily,
    pub unit_mix: BTreeMap<String, f64>,
    pub avg_unit_area_m2: f64,
    pub footprint_width_m: f64,
    pub footprint_depth_m: f64,
}

impl Candidate {
    /// Copy with far and coverage rescaled to the number of blocks that fit.
    ///
    /// Open space is recomputed from the new coverage and kept at or above
    /// `open_space_min`.
    pub fn effective(&self, placed_blocks: usize, open_space_min: f64) -> Self {
        let ratio = placed_blocks as f64 / self.block_count.max(1) as f64;
        let coverage = self.coverage * ratio;
        Self {
            far: self.far * ratio,
            coverage,
            open_space_ratio: open_space_min.max(100.0 - coverage),
            block_count: placed_blocks,
            ..self.clone()
        }
    }

    /// True when the candidate is laid out as separate blocks on the site.
    pub fn is_multi_block(&self, occupancy: &Occupancy) -> bool {
        occupancy.is_housing() && self.block_count > 1
    }
}

/// Builds the three variants offered for `occupancy`, in menu order.
pub fn generate_candidates(
    limits: &LegalLimits,
    site: &SiteMetrics,
    jurisdiction: Jurisdiction,
    occupancy: &Occupancy,
) -> Vec<Candidate> {
    OptionType::menu(occupancy)
        .iter()
        .map(|option_type| match option_type.profile() {
            Profile::Cluster(p) => cluster_candidate(*option_type, p, limits, site, jurisdiction),
            Profile::SingleMass(p) => single_mass_candidate(*option_type, p, limits),
        })
        .collect()
}

fn cluster_candidate(
    option_type: OptionType,
    profile: &ClusterProfile,
    limits: &LegalLimits,
    site: &SiteMetrics,
    jurisdiction: Jurisdiction,
) -> Candidate {
    let target_far = limits.far_upper * profile.far_factor;
    let height = limits.height_upper * profile.height_factor;
    let floors = ((height / RESIDENTIAL_FLOOR_HEIGHT) as usize)
        .clamp(MIN_RESIDENTIAL_FLOORS, MAX_RESIDENTIAL_FLOORS);

    let gfa_target = site.area_m2 * target_far / 100.0;
    let base_fp = profile.base_floorplate;
    let initial_blocks = ((gfa_target / (base_fp * floors as f64).max(1.0)).ceil() as usize).max(2);
    let mut block_count = initial_blocks.min(MAX_CLUSTER_BLOCKS);

    let spacing = limits
        .min_building_spacing
        .max(height * jurisdiction.spacing_height_factor());

    let base_width = base_fp.max(300.0).sqrt() * profile.slenderness;
    let base_depth = (base_fp / base_width.max(1.0)).max(11.0);
    let footprint_width = base_width.min(site.width_m * FOOTPRINT_SITE_SHARE);
    let footprint_depth = base_depth.min(site.depth_m * FOOTPRINT_SITE_SHARE);

    let cols_capacity =
        (((site.width_m + spacing) / (footprint_width + spacing).max(1.0)).floor() as usize).max(1);
    let rows_capacity =
        (((site.depth_m + spacing) / (footprint_depth + spacing).max(1.0)).floor() as usize).max(1);
    block_count = block_count.min(cols_capacity * rows_capacity);

    let max_fp_by_coverage = site.area_m2 * limits.coverage_upper / 100.0 / block_count.max(1) as f64;
    let floorplate = base_fp
        .min(max_fp_by_coverage)
        .min(footprint_width * footprint_depth)
        .max(1.0);
    let footprint_depth = (floorplate / footprint_width.max(1.0)).max(10.0);

    let achieved_gfa = floorplate * floors as f64 * block_count as f64;
    let far = target_far.min(achieved_gfa / site.area_m2 * 100.0);
    let coverage = floorplate * block_count as f64 / site.area_m2 * 100.0;

    Candidate {
        option_type,
        far,
        height,
        coverage,
        open_space_ratio: limits.open_space_min.max(100.0 - coverage),
        sky_exposure: MAX_SKY_EXPOSURE.min(height / (spacing * 2.95).max(20.0)),
        articulation_index: profile.articulation,
        block_count: block_count.max(1),
        floorplate_area_m2: floorplate,
        floors,
        building_spacing_m: spacing,
        max_block_length_m: footprint_width.max(footprint_depth),
        plan_family: profile.plan_family,
        unit_mix: jurisdiction.unit_mix_table(),
        avg_unit_area_m2: jurisdiction.average_unit_area(),
        footprint_width_m: footprint_width,
        footprint_depth_m: footprint_depth,
    }
}

fn single_mass_candidate(
    option_type: OptionType,
    profile: &SingleMassProfile,
    limits: &LegalLimits,
) -> Candidate {
    let height = limits.height_upper * profile.height_factor;
    let floors = ((height / SINGLE_MASS_FLOOR_HEIGHT) as usize).max(MIN_SINGLE_MASS_FLOORS);

    Candidate {
        option_type,
        far: limits.far_upper * profile.far_factor,
        height,
        coverage: limits.coverage_upper.min(profile.coverage_cap),
        open_space_ratio: (limits.open_space_min + profile.open_space_margin)
            .max(profile.open_space_floor),
        sky_exposure: profile.sky_exposure,
        articulation_index: profile.articulation,
        block_count: 1,
        floorplate_area_m2: profile.floorplate,
        floors,
        building_spacing_m: 0.0,
        max_block_length_m: profile.max_block_length,
        plan_family: PlanFamily::SingleMass,
        unit_mix: BTreeMap::from([("-".to_string(), 1.0)]),
        avg_unit_area_m2: 0.0,
        footprint_width_m: profile.footprint_width,
        footprint_depth_m: profile.footprint_depth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Requirements;

    fn limits(jurisdiction: Jurisdiction) -> LegalLimits {
        let mut limits = LegalLimits::resolve(&[], &Requirements::new(), jurisdiction);
        limits.far_upper = 500.0;
        limits
    }

    fn big_site() -> SiteMetrics {
        let mut site = SiteMetrics::fallback();
        site.ring = crate::geom::polygon::Ring::rectangle(200.0, 200.0);
        site.area_m2 = 40_000.0;
        site.width_m = 200.0;
        site.depth_m = 200.0;
        site
    }

    #[test]
    fn test_menu_sizes_and_order() {
        let site = big_site();
        let housing = generate_candidates(
            &limits(Jurisdiction::Korea),
            &site,
            Jurisdiction::Korea,
            &Occupancy::Residential,
        );
        let kinds: Vec<OptionType> = housing.iter().map(|c| c.option_type).collect();
        assert_eq!(kinds, OptionType::HOUSING_MENU.to_vec());

        let office = generate_candidates(
            &limits(Jurisdiction::Korea),
            &site,
            Jurisdiction::Korea,
            &Occupancy::from("office"),
        );
        let kinds: Vec<OptionType> = office.iter().map(|c| c.option_type).collect();
        assert_eq!(kinds, OptionType::SINGLE_MASS_MENU.to_vec());
    }

    #[test]
    fn test_cluster_floors_are_clamped() {
        let mut low = limits(Jurisdiction::Korea);
        low.height_upper = 12.0;
        let c = cluster_candidate(
            OptionType::ApartmentLinearCluster,
            &LINEAR_CLUSTER,
            &low,
            &big_site(),
            Jurisdiction::Korea,
        );
        assert_eq!(c.floors, MIN_RESIDENTIAL_FLOORS);

        let mut high = limits(Jurisdiction::Korea);
        high.height_upper = 400.0;
        let c = cluster_candidate(
            OptionType::ApartmentTowerCluster,
            &TOWER_CLUSTER,
            &high,
            &big_site(),
            Jurisdiction::Korea,
        );
        assert_eq!(c.floors, MAX_RESIDENTIAL_FLOORS);
    }

    #[test]
    fn test_cluster_metrics_are_consistent() {
        let site = big_site();
        let lim = limits(Jurisdiction::Korea);
        for c in generate_candidates(&lim, &site, Jurisdiction::Korea, &Occupancy::Residential) {
            assert!(c.block_count >= 1 && c.block_count <= MAX_CLUSTER_BLOCKS);
            assert!(c.far <= lim.far_upper + 1e-9);
            assert!(c.coverage <= lim.coverage_upper + 1e-9, "{c:?}");
            assert!(c.open_space_ratio >= lim.open_space_min);
            assert!(c.sky_exposure <= MAX_SKY_EXPOSURE);
            assert!(c.building_spacing_m >= lim.min_building_spacing);
            let expected = c.floorplate_area_m2 * c.block_count as f64 / site.area_m2 * 100.0;
            assert!((c.coverage - expected).abs() < 1e-9);
            assert_eq!(c.avg_unit_area_m2, 74.6);
        }
    }

    #[test]
    fn test_korea_spacing_factor() {
        let site = big_site();
        let lim = limits(Jurisdiction::Korea);
        let kr = cluster_candidate(
            OptionType::ApartmentLinearCluster,
            &LINEAR_CLUSTER,
            &lim,
            &site,
            Jurisdiction::Korea,
        );
        let other = cluster_candidate(
            OptionType::ApartmentLinearCluster,
            &LINEAR_CLUSTER,
            &lim,
            &site,
            Jurisdiction::Unlisted,
        );
        // 120 * 0.82 = 98.4 m tall
        assert!((kr.building_spacing_m - 98.4 * 0.55).abs() < 1e-9);
        assert!((other.building_spacing_m - 98.4 * 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_small_site_limits_block_count() {
        let site = SiteMetrics::fallback();
        let lim = limits(Jurisdiction::Korea);
        for c in generate_candidates(&lim, &site, Jurisdiction::Korea, &Occupancy::Residential) {
            assert!(c.footprint_width_m <= 50.0 * FOOTPRINT_SITE_SHARE + 1e-9);
            assert!(c.block_count >= 1);
            assert!(c.floorplate_area_m2 >= 1.0);
        }
    }

    #[test]
    fn test_single_mass_values() {
        let lim = limits(Jurisdiction::Korea);
        let c = single_mass_candidate(OptionType::PodiumTower, &PODIUM_TOWER, &lim);
        assert_eq!(c.far, 500.0);
        assert!((c.height - 105.6).abs() < 1e-9);
        assert_eq!(c.coverage, 48.0);
        assert_eq!(c.open_space_ratio, 52.0);
        assert_eq!(c.floors, 29);
        assert_eq!(c.plan_family, PlanFamily::SingleMass);
        assert_eq!(c.unit_mix.get("-"), Some(&1.0));

        let c = single_mass_candidate(OptionType::SteppedSlab, &STEPPED_SLAB, &lim);
        assert!((c.far - 470.0).abs() < 1e-9);
        assert_eq!(c.coverage, 42.0);
        assert_eq!(c.open_space_ratio, 58.0);

        let mut strict = lim;
        strict.open_space_min = 55.0;
        let c = single_mass_candidate(OptionType::CourtyardBlock, &COURTYARD_BLOCK, &strict);
        assert_eq!(c.open_space_ratio, 61.0);
        assert_eq!(c.coverage, 52.0);
    }

    #[test]
    fn test_single_mass_minimum_floors() {
        let mut lim = limits(Jurisdiction::Korea);
        lim.height_upper = 10.0;
        let c = single_mass_candidate(OptionType::CourtyardBlock, &COURTYARD_BLOCK, &lim);
        assert_eq!(c.floors, MIN_SINGLE_MASS_FLOORS);
    }

    #[test]
    fn test_effective_scales_with_placement() {
        let site = big_site();
        let mut c = generate_candidates(
            &limits(Jurisdiction::Korea),
            &site,
            Jurisdiction::Korea,
            &Occupancy::Residential,
        )
        .remove(0);
        c.far = 400.0;
        c.coverage = 40.0;
        c.block_count = 4;

        let eff = c.effective(2, 22.0);
        assert_eq!(eff.far, 200.0);
        assert_eq!(eff.coverage, 20.0);
        assert_eq!(eff.open_space_ratio, 80.0);
        assert_eq!(eff.block_count, 2);
        assert_eq!(eff.height, c.height);

        let none = c.effective(0, 22.0);
        assert_eq!(none.far, 0.0);
        assert_eq!(none.open_space_ratio, 100.0);
    }
}
