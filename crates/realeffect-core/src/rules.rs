//! Acceptance thresholds shared by the validator and the evaluator.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::mission::MissionError;

/// Thresholds applied when validating and evaluating a mission.
///
/// The defaults are the standard RealEffect rules: 80% accepted weight,
/// no slot above 0.4, and at least 3 slots carrying 10% or more of the
/// total weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuleSet {
    /// Minimum normalized accepted weight for a valid mission
    pub min_accepted_ratio: f64,

    /// Absolute cap on a single slot's weight
    pub max_weight_per_slot: f64,

    /// Normalized weight at which a slot counts as relevant
    pub min_relevant_weight: f64,

    /// Minimum number of relevant slots
    pub min_relevant_evidence: usize,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            min_accepted_ratio: 0.8,
            max_weight_per_slot: 0.4,
            min_relevant_weight: 0.10,
            min_relevant_evidence: 3,
        }
    }
}

impl RuleSet {
    /// Parse a rule set from YAML. Missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, MissionError> {
        let rules: RuleSet = serde_yaml::from_str(yaml)?;
        rules.check()?;
        Ok(rules)
    }

    /// Parse a rule set from JSON. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, MissionError> {
        let rules: RuleSet = serde_json::from_str(json)?;
        rules.check()?;
        Ok(rules)
    }

    /// Load a rule set file; `.json` is read as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MissionError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    /// Reject thresholds that would make every mission trivially pass or fail.
    pub fn check(&self) -> Result<(), MissionError> {
        if !(self.min_accepted_ratio > 0.0 && self.min_accepted_ratio <= 1.0) {
            return Err(MissionError::InvalidRules(format!(
                "min_accepted_ratio must be in (0, 1], got {}",
                self.min_accepted_ratio
            )));
        }

        if !(self.max_weight_per_slot > 0.0) {
            return Err(MissionError::InvalidRules(format!(
                "max_weight_per_slot must be > 0, got {}",
                self.max_weight_per_slot
            )));
        }

        if !(0.0..=1.0).contains(&self.min_relevant_weight) {
            return Err(MissionError::InvalidRules(format!(
                "min_relevant_weight must be in [0, 1], got {}",
                self.min_relevant_weight
            )));
        }

        Ok(())
    }

    /// The acceptance threshold as a whole percentage, for messages.
    pub fn acceptance_percent(&self) -> f64 {
        (self.min_accepted_ratio * 100.0).round()
    }
}
