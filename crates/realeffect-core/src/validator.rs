//! Structural validation of mission specs.
//!
//! Checks run in a fixed order and stop at the first violation:
//! 1. `mission_id` is present
//! 2. at least one evidence slot exists
//! 3. per slot: non-empty id, unique id, positive weight, weight within cap
//! 4. total weight is positive
//! 5. enough slots carry a relevant share of the total weight
//!
//! A spec that fails here is never evaluated.

use std::collections::HashSet;
use thiserror::Error;

use crate::mission::MissionSpec;
use crate::rules::RuleSet;

/// Structural problems that make a mission spec unusable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecError {
    #[error("mission_id is required")]
    MissingMissionId,

    #[error("at least one evidence slot is required")]
    NoEvidenceSlots,

    #[error("evidence slot #{index} id cannot be empty")]
    EmptySlotId { index: usize },

    #[error("evidence slot id {id:?} is declared more than once")]
    DuplicateSlotId { id: String },

    #[error("evidence slot {id:?} must have positive weight, got {weight}")]
    NonPositiveWeight { id: String, weight: f64 },

    #[error("evidence slot {id:?} weight {weight:.2} exceeds max allowed {max:.2}")]
    WeightExceedsCap { id: String, weight: f64, max: f64 },

    #[error("total evidence weight must be > 0")]
    NonPositiveTotalWeight,

    #[error(
        "at least {required} evidence slots must have normalized weight >= {threshold:.2}, got {found}"
    )]
    InsufficientRelevantEvidence {
        required: usize,
        threshold: f64,
        found: usize,
    },
}

/// Applies the structural rules of a [`RuleSet`] to mission specs.
pub struct SpecValidator {
    rules: RuleSet,
}

impl SpecValidator {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Validate a mission spec, returning the first violated rule.
    pub fn validate(&self, spec: &MissionSpec) -> Result<(), SpecError> {
        if spec.mission_id.is_empty() {
            return Err(SpecError::MissingMissionId);
        }

        if spec.evidence_slots.is_empty() {
            return Err(SpecError::NoEvidenceSlots);
        }

        let mut seen = HashSet::new();
        let mut total_weight = 0.0;

        for (index, slot) in spec.evidence_slots.iter().enumerate() {
            if slot.id.is_empty() {
                return Err(SpecError::EmptySlotId { index });
            }

            if !seen.insert(slot.id.as_str()) {
                return Err(SpecError::DuplicateSlotId {
                    id: slot.id.clone(),
                });
            }

            // Negated so NaN weights are rejected too.
            if !(slot.weight > 0.0) {
                return Err(SpecError::NonPositiveWeight {
                    id: slot.id.clone(),
                    weight: slot.weight,
                });
            }

            if slot.weight > self.rules.max_weight_per_slot {
                return Err(SpecError::WeightExceedsCap {
                    id: slot.id.clone(),
                    weight: slot.weight,
                    max: self.rules.max_weight_per_slot,
                });
            }

            total_weight += slot.weight;
        }

        if total_weight <= 0.0 {
            return Err(SpecError::NonPositiveTotalWeight);
        }

        let relevant = self.count_relevant(spec, total_weight);
        if relevant < self.rules.min_relevant_evidence {
            return Err(SpecError::InsufficientRelevantEvidence {
                required: self.rules.min_relevant_evidence,
                threshold: self.rules.min_relevant_weight,
                found: relevant,
            });
        }

        tracing::debug!(
            mission_id = %spec.mission_id,
            slots = spec.evidence_slots.len(),
            relevant,
            "mission spec is structurally valid"
        );

        Ok(())
    }

    /// Number of slots whose normalized weight reaches the relevance threshold.
    fn count_relevant(&self, spec: &MissionSpec, total_weight: f64) -> usize {
        spec.evidence_slots
            .iter()
            .filter(|slot| slot.weight / total_weight >= self.rules.min_relevant_weight)
            .count()
    }
}

impl Default for SpecValidator {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}
