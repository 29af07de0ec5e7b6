//! Synthetic evidence states for demonstrations and tests.
//!
//! Each scenario produces a single participant, `participant_1`, with one
//! status per declared slot. Real evidence never passes through here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::mission::MissionSpec;
use crate::types::{EvaluationInput, EvidenceStatus};

/// Participant id used by every synthetic scenario.
pub const SCENARIO_PARTICIPANT: &str = "participant_1";

/// Number of slots accepted by the `low-acceptance` scenario.
const LOW_ACCEPTANCE_ACCEPTED_SLOTS: usize = 3;

/// Named evidence-state policies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Every slot accepted
    #[default]
    AllAccepted,
    /// First slot missing, the rest accepted
    MissingProof,
    /// First three slots accepted, the rest rejected
    LowAcceptance,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [
        Scenario::AllAccepted,
        Scenario::MissingProof,
        Scenario::LowAcceptance,
    ];

    /// Resolve a scenario name. Unknown names fall back to `all-accepted`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "all-accepted" => Scenario::AllAccepted,
            "missing-proof" => Scenario::MissingProof,
            "low-acceptance" => Scenario::LowAcceptance,
            other => {
                tracing::warn!(scenario = other, "unknown scenario, using all-accepted");
                Scenario::AllAccepted
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::AllAccepted => "all-accepted",
            Scenario::MissingProof => "missing-proof",
            Scenario::LowAcceptance => "low-acceptance",
        }
    }

    /// Build the evidence state this scenario describes for a mission.
    pub fn build(&self, spec: &MissionSpec) -> EvaluationInput {
        let mut input = EvaluationInput::new();
        input.add_participant(SCENARIO_PARTICIPANT);

        for (index, slot) in spec.evidence_slots.iter().enumerate() {
            let status = match self {
                Scenario::AllAccepted => EvidenceStatus::Accepted,
                Scenario::MissingProof if index == 0 => EvidenceStatus::Missing,
                Scenario::MissingProof => EvidenceStatus::Accepted,
                Scenario::LowAcceptance if index < LOW_ACCEPTANCE_ACCEPTED_SLOTS => {
                    EvidenceStatus::Accepted
                }
                Scenario::LowAcceptance => EvidenceStatus::Rejected,
            };
            input.record(SCENARIO_PARTICIPANT, slot.id.as_str(), status);
        }

        input
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build a synthetic evidence state for `spec` from a scenario name.
pub fn build(spec: &MissionSpec, scenario_name: &str) -> EvaluationInput {
    Scenario::from_name(scenario_name).build(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::EvidenceSlot;

    fn spec(slots: usize) -> MissionSpec {
        MissionSpec {
            mission_id: "m".to_string(),
            evidence_slots: (1..=slots)
                .map(|i| EvidenceSlot {
                    id: format!("slot{}", i),
                    description: String::new(),
                    category: "doc".to_string(),
                    weight: 0.2,
                    required: true,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn statuses(input: &EvaluationInput, spec: &MissionSpec) -> Vec<EvidenceStatus> {
        spec.evidence_slots
            .iter()
            .map(|slot| input.status(SCENARIO_PARTICIPANT, &slot.id).unwrap())
            .collect()
    }

    #[test]
    fn test_all_accepted() {
        let spec = spec(5);
        let input = build(&spec, "all-accepted");
        assert_eq!(input.participant_count(), 1);
        assert!(statuses(&input, &spec)
            .iter()
            .all(|s| *s == EvidenceStatus::Accepted));
    }

    #[test]
    fn test_missing_proof_marks_first_slot() {
        use crate::types::EvidenceStatus::*;
        let spec = spec(5);
        let input = build(&spec, "missing-proof");
        assert_eq!(
            statuses(&input, &spec),
            vec![Missing, Accepted, Accepted, Accepted, Accepted]
        );
    }

    #[test]
    fn test_low_acceptance_rejects_after_three() {
        use crate::types::EvidenceStatus::*;
        let spec = spec(5);
        let input = build(&spec, "low-acceptance");
        assert_eq!(
            statuses(&input, &spec),
            vec![Accepted, Accepted, Accepted, Rejected, Rejected]
        );
    }

    #[test]
    fn test_low_acceptance_with_few_slots() {
        let spec = spec(2);
        let input = build(&spec, "low-acceptance");
        assert!(statuses(&input, &spec)
            .iter()
            .all(|s| *s == EvidenceStatus::Accepted));
    }

    #[test]
    fn test_unknown_name_falls_back() {
        assert_eq!(Scenario::from_name("everything-burns"), Scenario::AllAccepted);
        assert_eq!(Scenario::from_name(""), Scenario::AllAccepted);
    }

    #[test]
    fn test_names_round_trip() {
        for scenario in Scenario::ALL {
            assert_eq!(Scenario::from_name(scenario.name()), scenario);
        }
        assert_eq!(Scenario::default().to_string(), "all-accepted");
    }

    #[test]
    fn test_empty_spec_still_has_participant() {
        let input = Scenario::MissingProof.build(&spec(0));
        assert_eq!(input.participant_count(), 1);
    }
}
