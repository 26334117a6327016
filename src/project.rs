//! Project-level inputs supplied by the persistence layer.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::UID;
use crate::error::{EngineError, Result};
use crate::geom::site::SiteGeometry;

/// Requirement keys the optimizer understands.
pub const REQ_FAR: &str = "far";
pub const REQ_HEIGHT: &str = "height";
pub const REQ_QUALITATIVE_MIN: &str = "qualitative_min";

/// A user-supplied bound keyed by a semantic field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub key: String,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub required_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl Requirement {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            min_value: None,
            max_value: None,
            required_value: None,
            unit: None,
        }
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min_value = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max_value = Some(max);
        self
    }
}

/// Requirements of one project, at most one per key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Requirement>", into = "Vec<Requirement>")]
pub struct Requirements {
    by_key: BTreeMap<String, Requirement>,
}

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a requirement, replacing any existing one with the same key.
    pub fn upsert(&mut self, requirement: Requirement) {
        self.by_key.insert(requirement.key.clone(), requirement);
    }

    pub fn get(&self, key: &str) -> Option<&Requirement> {
        self.by_key.get(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn far_min(&self) -> Option<f64> {
        self.get(REQ_FAR).and_then(|r| r.min_value)
    }

    pub fn far_max(&self) -> Option<f64> {
        self.get(REQ_FAR).and_then(|r| r.max_value)
    }

    pub fn height_max(&self) -> Option<f64> {
        self.get(REQ_HEIGHT).and_then(|r| r.max_value)
    }

    pub fn qualitative_min(&self) -> Option<f64> {
        self.get(REQ_QUALITATIVE_MIN).and_then(|r| r.min_value)
    }
}

impl FromIterator<Requirement> for Requirements {
    fn from_iter<T: IntoIterator<Item = Requirement>>(iter: T) -> Self {
        let mut reqs = Self::new();
        for r in iter {
            reqs.upsert(r);
        }
        reqs
    }
}

impl From<Vec<Requirement>> for Requirements {
    fn from(value: Vec<Requirement>) -> Self {
        value.into_iter().collect()
    }
}

impl From<Requirements> for Vec<Requirement> {
    fn from(value: Requirements) -> Self {
        value.by_key.into_values().collect()
    }
}

fn default_weight() -> f64 {
    1.0
}

/// Qualitative design signal (free text, optional reference link).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AestheticInput {
    #[serde(default)]
    pub category: String,
    pub content: String,
    #[serde(default)]
    pub reference_url: Option<String>,
    /// Relative importance, non-negative.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl AestheticInput {
    pub fn new(category: &str, content: &str) -> Self {
        Self {
            category: category.to_string(),
            content: content.to_string(),
            reference_url: None,
            weight: default_weight(),
        }
    }

    pub fn with_reference(mut self, url: &str) -> Self {
        self.reference_url = Some(url.to_string());
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn has_reference(&self) -> bool {
        self.reference_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }

    /// Rejects negative or non-finite weights.
    pub fn validate(&self) -> Result<()> {
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(EngineError::InvalidRequest(format!(
                "aesthetic input weight must be a non-negative number, got {}",
                self.weight
            )));
        }
        Ok(())
    }
}

/// Occupancy category of a project.
///
/// Residential and mixed-use programs get the multi-block housing menu; every
/// other category gets the single-mass menu.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Occupancy {
    Residential,
    MixedUse,
    Other(String),
}

impl Occupancy {
    pub fn is_housing(&self) -> bool {
        matches!(self, Occupancy::Residential | Occupancy::MixedUse)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Occupancy::Residential => "residential",
            Occupancy::MixedUse => "mixed_use",
            Occupancy::Other(name) => name,
        }
    }
}

impl From<&str> for Occupancy {
    fn from(value: &str) -> Self {
        match value {
            "residential" => Occupancy::Residential,
            "mixed_use" => Occupancy::MixedUse,
            other => Occupancy::Other(other.to_string()),
        }
    }
}

impl From<String> for Occupancy {
    fn from(value: String) -> Self {
        Occupancy::from(value.as_str())
    }
}

impl From<Occupancy> for String {
    fn from(value: Occupancy) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Occupancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A development project as handed over by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub id: UID,
    #[serde(default)]
    pub name: String,
    pub country_code: String,
    pub jurisdiction_code: String,
    pub occupancy_type: Occupancy,
    #[serde(default)]
    pub site: SiteGeometry,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub aesthetic_inputs: Vec<AestheticInput>,
}

impl Project {
    /// Checks the inputs the optimizer does not sanitize itself.
    pub fn validate(&self) -> Result<()> {
        self.aesthetic_inputs
            .iter()
            .try_for_each(AestheticInput::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_replaces_same_key() {
        let mut reqs = Requirements::new();
        reqs.upsert(Requirement::new("far").with_max(550.0));
        reqs.upsert(Requirement::new("far").with_min(300.0).with_max(400.0));
        reqs.upsert(Requirement::new("height").with_max(72.0));
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs.far_max(), Some(400.0));
        assert_eq!(reqs.far_min(), Some(300.0));
        assert_eq!(reqs.height_max(), Some(72.0));
        assert_eq!(reqs.qualitative_min(), None);
    }

    #[test]
    fn test_requirements_from_json_list() {
        let json = r#"[
            {"key": "far", "max_value": 550},
            {"key": "far", "max_value": 450},
            {"key": "qualitative_min", "min_value": 60}
        ]"#;
        let reqs: Requirements = serde_json::from_str(json).unwrap();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs.far_max(), Some(450.0));
        assert_eq!(reqs.qualitative_min(), Some(60.0));
    }

    #[test]
    fn test_occupancy_parsing() {
        assert!(Occupancy::from("residential").is_housing());
        assert!(Occupancy::from("mixed_use").is_housing());
        let office = Occupancy::from("office");
        assert!(!office.is_housing());
        assert_eq!(office.as_str(), "office");
        let json = serde_json::to_string(&Occupancy::MixedUse).unwrap();
        assert_eq!(json, "\"mixed_use\"");
    }

    #[test]
    fn test_aesthetic_defaults() {
        let input: AestheticInput = serde_json::from_str(r#"{"content": "street wall"}"#).unwrap();
        assert_eq!(input.weight, 1.0);
        assert!(!input.has_reference());
        assert!(input.with_reference("https://example.com/a").has_reference());
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        assert!(AestheticInput::new("context", "street wall").validate().is_ok());
        assert!(AestheticInput::new("context", "street wall").with_weight(0.0).validate().is_ok());

        let input: AestheticInput =
            serde_json::from_str(r#"{"content": "street wall", "weight": -0.5}"#).unwrap();
        let err = input.validate().unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
        assert!(
            AestheticInput::new("massing", "tower")
                .with_weight(f64::NAN)
                .validate()
                .is_err()
        );
    }
}
