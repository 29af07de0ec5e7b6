//! Evaluator: applies the acceptance rules to an evidence state.
//!
//! Two ordered passes:
//! 1. **Full delivery (RE-0)**: every participant has a non-missing status
//!    for every declared slot. The first gap ends evaluation.
//! 2. **Weighted acceptance (RE-1)**: each slot's normalized weight counts as
//!    rejected if any participant rejected it, otherwise as accepted if any
//!    participant accepted it. The mission is valid when the accepted share
//!    reaches the rule set's minimum ratio.
//!
//! A slot that is only ever `SUBMITTED` counts toward neither total.

use crate::mission::MissionSpec;
use crate::rules::RuleSet;
use crate::types::{EvaluationInput, EvaluationResult, EvidenceStatus};

/// Accepted and rejected normalized weight after the RE-1 pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct WeightTally {
    accepted: f64,
    rejected: f64,
}

/// The Evaluator applies a [`RuleSet`] to (spec, evidence) pairs.
pub struct Evaluator {
    rules: RuleSet,
}

impl Evaluator {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Evaluate an evidence state against a mission spec.
    ///
    /// Never fails: rule violations, and a spec with no positive total
    /// weight, produce an invalid result with a reason.
    pub fn evaluate(&self, spec: &MissionSpec, input: &EvaluationInput) -> EvaluationResult {
        if let Some((participant, slot_id)) = self.find_missing(spec, input) {
            tracing::debug!(
                mission_id = %spec.mission_id,
                participant,
                slot = slot_id,
                "full-delivery rule failed"
            );
            return EvaluationResult::rejected(format!(
                "participant {} missing required evidence slot {}",
                participant, slot_id
            ));
        }

        let total_weight = spec.total_weight();
        if !(total_weight > 0.0) {
            return EvaluationResult::rejected("invalid spec: total weight <= 0");
        }

        let tally = self.tally(spec, input, total_weight);
        let ratio = tally.accepted;
        let valid = ratio >= self.rules.min_accepted_ratio;

        tracing::debug!(
            mission_id = %spec.mission_id,
            ratio,
            rejected = tally.rejected,
            valid,
            "weighted-acceptance rule evaluated"
        );

        let verdict = if valid { "meets" } else { "failed" };
        EvaluationResult {
            valid,
            ratio,
            accepted_weight: tally.accepted,
            rejected_weight: tally.rejected,
            reason: format!(
                "mission {} RealEffect {}% acceptance rule",
                verdict,
                self.rules.acceptance_percent()
            ),
        }
    }

    /// First (participant, slot) pair with no status or a `MISSING` status.
    ///
    /// Participants are visited in the input's stable order, slots in
    /// declared order.
    fn find_missing<'a>(
        &self,
        spec: &'a MissionSpec,
        input: &'a EvaluationInput,
    ) -> Option<(&'a str, &'a str)> {
        input.participants().find_map(|(participant, statuses)| {
            spec.evidence_slots
                .iter()
                .find(|slot| {
                    matches!(
                        statuses.get(&slot.id),
                        None | Some(EvidenceStatus::Missing)
                    )
                })
                .map(|slot| (participant, slot.id.as_str()))
        })
    }

    fn tally(&self, spec: &MissionSpec, input: &EvaluationInput, total_weight: f64) -> WeightTally {
        let mut tally = WeightTally::default();

        for slot in &spec.evidence_slots {
            let normalized = slot.weight / total_weight;

            let mut has_accepted = false;
            let mut has_rejected = false;
            for (_, statuses) in input.participants() {
                match statuses.get(&slot.id) {
                    Some(EvidenceStatus::Accepted) => has_accepted = true,
                    Some(EvidenceStatus::Rejected) => has_rejected = true,
                    _ => {}
                }
            }

            // Rejection is sticky: one rejecting participant poisons the slot.
            if has_rejected {
                tally.rejected += normalized;
            } else if has_accepted {
                tally.accepted += normalized;
            }
        }

        tally
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}
