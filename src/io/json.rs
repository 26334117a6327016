//! JSON I/O for evaluation requests and results.
//!
//! The on-disk layout is the serde representation of [`EvaluationRequest`] and
//! [`Evaluation`], written pretty-printed.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::evaluation::{Evaluation, EvaluationRequest};

fn write_json<T: Serialize>(path: &Path, value: &T, what: &str) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)
        .with_context(|| format!("Failed to serialize {what} to: {}", path.display()))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to deserialize {what} from: {}", path.display()))
}

/// Reads an evaluation request from a JSON file.
///
/// # Example
/// ```no_run
/// use massing3d::io::read_request;
/// use std::path::Path;
///
/// let request = read_request(Path::new("request.json")).unwrap();
/// println!("Evaluating {}", request.project.name);
/// ```
pub fn read_request(path: &Path) -> Result<EvaluationRequest> {
    read_json(path, "evaluation request")
}

pub fn write_request(path: &Path, request: &EvaluationRequest) -> Result<()> {
    write_json(path, request, "evaluation request")
}

/// Writes an evaluation (ranked options, solar profile, timings) to a JSON file.
pub fn write_evaluation(path: &Path, evaluation: &Evaluation) -> Result<()> {
    write_json(path, evaluation, "evaluation")
}

pub fn read_evaluation(path: &Path) -> Result<Evaluation> {
    read_json(path, "evaluation")
}

/// Serializes an evaluation to a pretty JSON string.
pub fn to_json_string(evaluation: &Evaluation) -> Result<String> {
    serde_json::to_string_pretty(evaluation).context("Failed to serialize evaluation to string")
}

/// Parses an evaluation request from a JSON string.
pub fn request_from_str(json: &str) -> Result<EvaluationRequest> {
    serde_json::from_str(json).context("Failed to deserialize evaluation request from string")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::evaluation::run_evaluation;
    use tempfile::tempdir;

    const REQUEST: &str = r#"{
        "project": {
            "id": "p-1",
            "name": "Riverside",
            "country_code": "KR",
            "jurisdiction_code": "KR-11",
            "occupancy_type": "residential",
            "site": {
                "type": "Polygon",
                "coordinates": [[[126.978, 37.566], [126.980, 37.566], [126.980, 37.5678], [126.978, 37.5678], [126.978, 37.566]]]
            },
            "requirements": [{"key": "far", "max_value": 400}],
            "aesthetic_inputs": [{"category": "context", "content": "street wall", "weight": 1.2}]
        },
        "rule_sets": [{
            "id": "rs-1",
            "country_code": "KR",
            "jurisdiction_code": "KR-11",
            "category": "zoning",
            "effective_from": "2025-01-01",
            "definitions": [
                {"rule_key": "max_far", "rule_type": "hard", "expression": {"op": "lte", "field": "far", "value": 500}, "priority": 10}
            ]
        }],
        "evaluation_date": "2026-03-01",
        "hours": [15, 9, 12]
    }"#;

    #[test]
    fn test_request_roundtrip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("request.json");

        let original = request_from_str(REQUEST)?;
        write_request(&path, &original)?;
        let loaded = read_request(&path)?;

        assert_eq!(loaded, original);
        assert_eq!(loaded.project.requirements.far_max(), Some(400.0));
        assert_eq!(loaded.hours, Some(vec![15, 9, 12]));
        Ok(())
    }

    #[test]
    fn test_evaluation_roundtrip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("evaluation.json");

        let request = request_from_str(REQUEST)?;
        let evaluation = run_evaluation(&request, &EngineConfig::new())?;
        write_evaluation(&path, &evaluation)?;
        let loaded = read_evaluation(&path)?;

        assert_eq!(loaded.id, evaluation.id);
        assert_eq!(loaded.options.len(), 3);
        assert_eq!(loaded.solar.len(), 3);
        assert_eq!(loaded.options[0].option_type, evaluation.options[0].option_type);

        let text = to_json_string(&evaluation)?;
        assert!(text.contains("\"mesh_payload\""));
        assert!(text.contains("\"runtime_profile\""));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let err = read_request(Path::new("/nonexistent/request.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to open file"));
    }

    #[test]
    fn test_malformed_request() {
        assert!(request_from_str(r#"{"project": {}}"#).is_err());
    }
}
