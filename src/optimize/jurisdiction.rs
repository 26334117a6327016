//! Static per-jurisdiction tables: default zoning limits, housing unit mixes and
//! the regulations cited alongside each option.

use std::collections::BTreeMap;

use crate::project::Occupancy;

/// Default limits applied when neither the user nor the rule set is tighter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JurisdictionDefaults {
    /// Building coverage ceiling (%).
    pub coverage_upper: f64,
    /// Open space floor (%).
    pub open_space_min: f64,
    /// Sky exposure ceiling (0-1).
    pub sky_exposure_max: f64,
    /// Height ceiling used when no explicit limit exists (m).
    pub height_soft_upper: f64,
    /// Minimum spacing between residential blocks (m).
    pub min_building_spacing: f64,
}

/// Share of units of a given size in a housing program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitShare {
    pub area_m2: f64,
    pub share: f64,
}

const fn unit(area_m2: f64, share: f64) -> UnitShare {
    UnitShare { area_m2, share }
}

static SINGAPORE: JurisdictionDefaults = JurisdictionDefaults {
    coverage_upper: 50.0,
    open_space_min: 28.0,
    sky_exposure_max: 0.72,
    height_soft_upper: 140.0,
    min_building_spacing: 24.0,
};

static NEW_YORK: JurisdictionDefaults = JurisdictionDefaults {
    coverage_upper: 68.0,
    open_space_min: 20.0,
    sky_exposure_max: 0.78,
    height_soft_upper: 180.0,
    min_building_spacing: 20.0,
};

static FALLBACK: JurisdictionDefaults = JurisdictionDefaults {
    coverage_upper: 60.0,
    open_space_min: 22.0,
    sky_exposure_max: 0.68,
    height_soft_upper: 120.0,
    min_building_spacing: 24.0,
};

static SINGAPORE_UNITS: [UnitShare; 3] = [unit(65.0, 0.26), unit(85.0, 0.48), unit(110.0, 0.26)];
static NEW_YORK_UNITS: [UnitShare; 3] = [unit(70.0, 0.25), unit(90.0, 0.45), unit(120.0, 0.30)];
static FALLBACK_UNITS: [UnitShare; 4] = [
    unit(59.0, 0.36),
    unit(74.0, 0.20),
    unit(84.0, 0.34),
    unit(101.0, 0.10),
];

static SINGAPORE_BASIS: [&str; 2] = [
    "URA Development Control (Gross Plot Ratio)",
    "URA Urban Design Guidelines (setback/street wall)",
];
static NEW_YORK_BASIS: [&str; 2] = [
    "NYC Zoning Resolution (FAR)",
    "NYC Zoning controls for form and sky exposure",
];
static KOREA_BASIS: [&str; 4] = [
    "국토계획법 시행령 제85조(용적률)",
    "건축법 제61조 및 관련 조례(일조/높이/이격)",
    "주택법 제2조(국민주택규모 85㎡ 기준)",
    "지자체 경관/건축위원회 심의기준",
];
/// Appended for residential and mixed-use programs.
static HOUSING_LAYOUT_BASIS: &str = "주택건설기준 등에 관한 규정(공동주택 배치/채광 관련)";

/// Jurisdictions with dedicated tables.
///
/// `Korea` and `Unlisted` share the fallback tables; they differ only in the
/// spacing-to-height factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jurisdiction {
    Singapore,
    NewYork,
    Korea,
    Unlisted,
}

impl Jurisdiction {
    /// Maps a country code (case-insensitive) to its table.
    pub fn from_country_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "SG" => Jurisdiction::Singapore,
            "US" | "US-NYC" | "NYC" => Jurisdiction::NewYork,
            "KR" => Jurisdiction::Korea,
            _ => Jurisdiction::Unlisted,
        }
    }

    pub fn defaults(&self) -> &'static JurisdictionDefaults {
        match self {
            Jurisdiction::Singapore => &SINGAPORE,
            Jurisdiction::NewYork => &NEW_YORK,
            Jurisdiction::Korea | Jurisdiction::Unlisted => &FALLBACK,
        }
    }

    pub fn unit_mix(&self) -> &'static [UnitShare] {
        match self {
            Jurisdiction::Singapore => &SINGAPORE_UNITS,
            Jurisdiction::NewYork => &NEW_YORK_UNITS,
            Jurisdiction::Korea | Jurisdiction::Unlisted => &FALLBACK_UNITS,
        }
    }

    /// Share-weighted mean unit area, rounded to 2 decimals.
    pub fn average_unit_area(&self) -> f64 {
        let avg: f64 = self.unit_mix().iter().map(|u| u.area_m2 * u.share).sum();
        crate::vecutils::round_to(avg, 2)
    }

    /// Unit mix keyed by unit area label (e.g. `"84" -> 0.34`).
    pub fn unit_mix_table(&self) -> BTreeMap<String, f64> {
        self.unit_mix()
            .iter()
            .map(|u| (format!("{}", u.area_m2), u.share))
            .collect()
    }

    /// Residential block spacing as a fraction of building height.
    pub fn spacing_height_factor(&self) -> f64 {
        match self {
            Jurisdiction::Korea => 0.55,
            _ => 0.45,
        }
    }

    /// Regulations cited for an option (informational only).
    pub fn legal_basis(&self, occupancy: &Occupancy) -> Vec<String> {
        let base: &[&str] = match self {
            Jurisdiction::Singapore => &SINGAPORE_BASIS,
            Jurisdiction::NewYork => &NEW_YORK_BASIS,
            Jurisdiction::Korea | Jurisdiction::Unlisted => &KOREA_BASIS,
        };
        let mut tags: Vec<String> = base.iter().map(|s| s.to_string()).collect();
        if occupancy.is_housing() {
            tags.push(HOUSING_LAYOUT_BASIS.to_string());
        }
        tags
    }
}
