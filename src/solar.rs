//! Approximate sun position and exposure for a site.
//!
//! The model is a coarse closed-form approximation, not an ephemeris. Its
//! values are displayed next to the ranked options and must stay stable, so
//! the formulas are kept as they are.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::vecutils::round_to;

/// Peak altitude term of the model (deg).
const ALTITUDE_SCALE: f64 = 52.0;
/// Altitude at which the site is considered fully unshaded (deg).
const SHADOW_FREE_ALTITUDE: f64 = 72.0;
const PEAK_INSOLATION_KWH_M2: f64 = 0.95;

/// Solar position (azimuth and altitude angles).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    /// Altitude in degrees above the horizon, never negative.
    pub altitude: f64,
    /// Azimuth in degrees, 0-360.
    pub azimuth: f64,
}

/// Solar declination (deg) for a day of the year.
pub fn declination(day_of_year: u32) -> f64 {
    23.44 * (2.0 * std::f64::consts::PI / 365.0 * (day_of_year as f64 - 81.0)).sin()
}

impl SolarPosition {
    /// Position at a whole `hour` of the day.
    ///
    /// The hour angle is shifted by the site's offset from
    /// `reference_longitude` (one hour per 30 degrees).
    pub fn calculate(
        latitude: f64,
        longitude: f64,
        day_of_year: u32,
        hour: f64,
        reference_longitude: f64,
    ) -> Self {
        let decl = declination(day_of_year);
        let shift = (longitude - reference_longitude) / 30.0;
        let hour_angle = (hour + shift - 12.0) * 15.0;
        let altitude = (ALTITUDE_SCALE * hour_angle.to_radians().cos() * (1.0 - latitude.abs() / 130.0)
            + decl / 2.8)
            .max(0.0);
        let azimuth = (180.0 + hour_angle).rem_euclid(360.0);
        Self { altitude, azimuth }
    }

    pub fn is_above_horizon(&self) -> bool {
        self.altitude > 0.0
    }

    /// Incident energy on a horizontal surface over the hour (kWh/m2).
    pub fn insolation(&self) -> f64 {
        (self.altitude / 90.0).max(0.0) * PEAK_INSOLATION_KWH_M2
    }

    /// Share of the site in shadow, 0-1.
    pub fn shadow_ratio(&self) -> f64 {
        (1.0 - self.altitude / SHADOW_FREE_ALTITUDE).clamp(0.0, 1.0)
    }
}

/// One hourly sample of the solar profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarSample {
    pub timestamp: DateTime<Utc>,
    pub sun_altitude: f64,
    pub sun_azimuth: f64,
    pub insolation_kwh_m2: f64,
    pub shadow_ratio: f64,
}

/// Samples the sun at each of `hours` (0-23) on `date`, in the given order.
///
/// Angles are rounded to 3 decimals, insolation and shadow ratio to 4.
pub fn compute_solar_profile(
    latitude: f64,
    longitude: f64,
    date: NaiveDate,
    hours: &[u32],
    config: &EngineConfig,
) -> Result<Vec<SolarSample>> {
    let day_of_year = date.ordinal();
    hours
        .iter()
        .map(|&hour| {
            let timestamp = date
                .and_hms_opt(hour, 0, 0)
                .ok_or_else(|| {
                    EngineError::InvalidRequest(format!("hour must be within 0-23, got {hour}"))
                })?
                .and_utc();
            let pos = SolarPosition::calculate(
                latitude,
                longitude,
                day_of_year,
                hour as f64,
                config.solar_reference_longitude,
            );
            Ok(SolarSample {
                timestamp,
                sun_altitude: round_to(pos.altitude, 3),
                sun_azimuth: round_to(pos.azimuth, 3),
                insolation_kwh_m2: round_to(pos.insolation(), 4),
                shadow_ratio: round_to(pos.shadow_ratio(), 4),
            })
        })
        .collect()
}
