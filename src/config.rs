use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Engine tunables.
///
/// Jurisdiction tables (coverage ceilings, unit mixes, legal citations) are static
/// data in [`crate::optimize::jurisdiction`]; this struct only holds the knobs that
/// a deployment may reasonably want to adjust.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Clearance added around every block footprint before the containment test (m).
    pub safety_offset_m: f64,
    /// Uniform grid shrink ratios tried by the layout solver, largest first.
    pub shrink_ratios: Vec<f64>,
    /// Smallest partial cluster the layout solver accepts when a full fit fails.
    pub min_cluster_blocks: usize,
    /// Score assigned to infeasible options.
    pub infeasible_score: f64,
    /// Longitude (deg) at which the solar model's hour angle is unshifted.
    pub solar_reference_longitude: f64,
    /// `(latitude, longitude)` used when the site has no usable ring.
    pub default_site_location: (f64, f64),
    /// Hours sampled by the solar profile when a request lists none.
    pub default_hours: Vec<u32>,
    /// Version tag written into every option's parameters.
    pub engine_version: String,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            safety_offset_m: 0.6,
            shrink_ratios: vec![1.0, 0.93, 0.87, 0.82, 0.76, 0.70, 0.62, 0.54, 0.46],
            min_cluster_blocks: 2,
            infeasible_score: -1e6,
            solar_reference_longitude: 127.0,
            default_site_location: (37.5665, 126.9780),
            default_hours: vec![9, 12, 15],
            engine_version: "residential-multi-block-v2-boundary-fit".to_string(),
        }
    }

    /// Checks that the tunables keep the solver well defined.
    pub fn validate(&self) -> Result<()> {
        if !self.safety_offset_m.is_finite() || self.safety_offset_m < 0.0 {
            return Err(EngineError::Config(format!(
                "safety_offset_m must be a non-negative number, got {}",
                self.safety_offset_m
            )));
        }
        if self.shrink_ratios.is_empty() {
            return Err(EngineError::Config("shrink_ratios must not be empty".to_string()));
        }
        if self
            .shrink_ratios
            .iter()
            .any(|r| !r.is_finite() || *r <= 0.0)
        {
            return Err(EngineError::Config(
                "shrink_ratios must be positive numbers".to_string(),
            ));
        }
        if self.shrink_ratios.windows(2).any(|w| w[1] >= w[0]) {
            return Err(EngineError::Config(
                "shrink_ratios must be strictly descending".to_string(),
            ));
        }
        if self.min_cluster_blocks == 0 {
            return Err(EngineError::Config(
                "min_cluster_blocks must be at least 1".to_string(),
            ));
        }
        if !self.infeasible_score.is_finite() {
            return Err(EngineError::Config("infeasible_score must be finite".to_string()));
        }
        if let Some(hour) = self.default_hours.iter().find(|h| **h > 23) {
            return Err(EngineError::Config(format!(
                "default_hours must be within 0-23, got {hour}"
            )));
        }
        Ok(())
    }

    /// Loads a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
        let config: EngineConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse engine config: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Rejected engine config: {}", path.display()))?;
        Ok(config)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::new();
        assert_eq!(config.shrink_ratios.len(), 9);
        assert_eq!(config.shrink_ratios[0], 1.0);
        assert_eq!(config.min_cluster_blocks, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_ascending_ratios() {
        let config = EngineConfig {
            shrink_ratios: vec![0.5, 0.9],
            ..EngineConfig::new()
        };
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_rejects_negative_offset() {
        let config = EngineConfig {
            safety_offset_m: -1.0,
            ..EngineConfig::new()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("engine.json");
        let mut file = File::create(&path)?;
        writeln!(file, r#"{{"safety_offset_m": 1.2, "default_hours": [8, 18]}}"#)?;
        drop(file);

        let config = EngineConfig::from_json_file(&path)?;
        assert_eq!(config.safety_offset_m, 1.2);
        assert_eq!(config.default_hours, vec![8, 18]);
        assert_eq!(config.shrink_ratios, EngineConfig::new().shrink_ratios);
        Ok(())
    }

    #[test]
    fn test_invalid_json_file_is_rejected() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"shrink_ratios": []}"#)?;
        assert!(EngineConfig::from_json_file(&path).is_err());
        Ok(())
    }
}
