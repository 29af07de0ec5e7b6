//! Mission spec model and loading from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_mission_schema;

/// Errors that can occur when loading mission specs or rule sets.
#[derive(Error, Debug)]
pub enum MissionError {
    #[error("Failed to read mission file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Mission document does not match schema: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error("Invalid rule set: {0}")]
    InvalidRules(String),
}

/// Descriptive metadata about the mission. Never checked by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Context {
    pub title: String,
    pub description: String,
    pub location: String,
    pub timeframe_start: String,
    pub timeframe_end: String,
    pub owner: String,
}

/// A participant role with its expected head count.
///
/// Informational only: evaluation does not enforce `min` or `max`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantRole {
    /// Role name (e.g., "planter", "verifier")
    pub role: String,

    /// Minimum number of participants in this role
    #[serde(default)]
    pub min: u32,

    /// Maximum number of participants; `None` means no upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{} ({}..={})", self.role, self.min, max),
            None => write!(f, "{} ({}..)", self.role, self.min),
        }
    }
}

/// One weighted unit of proof required by a mission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvidenceSlot {
    /// Identifier, unique within the mission
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// Free-form category label (e.g., "photo", "document")
    #[serde(default)]
    pub category: String,

    /// Relative weight of this slot
    #[serde(default)]
    pub weight: f64,

    /// Declared as required. Every slot is treated as required by the
    /// full-delivery rule regardless of this flag.
    #[serde(default)]
    pub required: bool,
}

/// A declarative mission: context, roles and the evidence that proves it.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct MissionSpec {
    pub spec_version: String,
    pub mission_id: String,
    pub context: Context,
    pub participants: Vec<ParticipantRole>,
    pub evidence_slots: Vec<EvidenceSlot>,
}

impl MissionSpec {
    /// Parse a mission spec from YAML text.
    ///
    /// The document is checked against the mission schema before it is
    /// converted into the typed model. Structural rules (weights, relevance)
    /// are not applied here; see [`crate::SpecValidator`].
    pub fn from_yaml(yaml: &str) -> Result<Self, MissionError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a mission spec from JSON text.
    pub fn from_json(json: &str) -> Result<Self, MissionError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a mission spec from a YAML file (`.reff`, `.yaml`, `.yml`).
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, MissionError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a mission spec from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MissionError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a mission file, choosing the format from its extension.
    ///
    /// `.json` files are read as JSON; everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MissionError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_file(path)
        } else {
            Self::from_yaml_file(path)
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, MissionError> {
        validate_mission_schema(&value).map_err(MissionError::SchemaError)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Sum of all slot weights.
    pub fn total_weight(&self) -> f64 {
        self.evidence_slots.iter().map(|slot| slot.weight).sum()
    }

    /// Look up a slot by id.
    pub fn slot(&self, id: &str) -> Option<&EvidenceSlot> {
        self.evidence_slots.iter().find(|slot| slot.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLANT_TREES: &str = r#"
spec_version: "0.1"
mission_id: "plant_100_trees"
context:
  title: "Plant 100 trees"
  description: "Reforest the riverbank"
  location: "Riverside park"
  timeframe_start: "2025-03-01"
  timeframe_end: "2025-06-30"
  owner: "green_collective"
participants:
  - role: "planter"
    min: 5
  - role: "verifier"
    min: 1
    max: 2
evidence_slots:
  - id: "before_photos"
    description: "Photos of the site before planting"
    category: "photo"
    weight: 0.2
    required: true
  - id: "after_photos"
    description: "Photos of the site after planting"
    category: "photo"
    weight: 0.2
    required: true
"#;

    #[test]
    fn test_parse_yaml_mission() {
        let spec = MissionSpec::from_yaml(PLANT_TREES).unwrap();
        assert_eq!(spec.mission_id, "plant_100_trees");
        assert_eq!(spec.context.owner, "green_collective");
        assert_eq!(spec.participants.len(), 2);
        assert_eq!(spec.participants[0].max, None);
        assert_eq!(spec.participants[1].max, Some(2));
        assert_eq!(spec.evidence_slots.len(), 2);
        assert!(spec.evidence_slots[0].required);
        assert!((spec.total_weight() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_parse_json_mission() {
        let json = r#"{
            "mission_id": "m1",
            "evidence_slots": [{"id": "a", "weight": 0.3}]
        }"#;
        let spec = MissionSpec::from_json(json).unwrap();
        assert_eq!(spec.mission_id, "m1");
        assert_eq!(spec.slot("a").map(|s| s.weight), Some(0.3));
        assert!(spec.slot("b").is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        // Missing values are structural problems, reported by the validator.
        let spec = MissionSpec::from_yaml("spec_version: \"0.1\"\n").unwrap();
        assert!(spec.mission_id.is_empty());
        assert!(spec.evidence_slots.is_empty());
    }

    #[test]
    fn test_wrong_type_rejected_by_schema() {
        let yaml = r#"
mission_id: "m1"
evidence_slots:
  - id: "a"
    weight: "heavy"
"#;
        let result = MissionSpec::from_yaml(yaml);
        assert!(matches!(result, Err(MissionError::SchemaError(_))));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = MissionSpec::from_yaml("mission_id: [unclosed");
        assert!(matches!(result, Err(MissionError::YamlError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = MissionSpec::from_file("does/not/exist.reff");
        assert!(matches!(result, Err(MissionError::IoError(_))));
    }

    #[test]
    fn test_participant_role_display() {
        let bounded = ParticipantRole {
            role: "verifier".to_string(),
            min: 1,
            max: Some(2),
        };
        let open = ParticipantRole {
            role: "planter".to_string(),
            min: 5,
            max: None,
        };
        assert_eq!(bounded.to_string(), "verifier (1..=2)");
        assert_eq!(open.to_string(), "planter (5..)");
    }
}
