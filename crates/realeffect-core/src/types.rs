//! Evidence state and evaluation result types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-participant, per-slot submission state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceStatus {
    /// Nothing delivered
    Missing,
    /// Delivered, not yet reviewed
    Submitted,
    /// Reviewed and accepted
    Accepted,
    /// Reviewed and rejected
    Rejected,
}

impl fmt::Display for EvidenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EvidenceStatus::Missing => "MISSING",
            EvidenceStatus::Submitted => "SUBMITTED",
            EvidenceStatus::Accepted => "ACCEPTED",
            EvidenceStatus::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

/// Evidence statuses of one participant, keyed by slot id.
pub type SlotStatuses = BTreeMap<String, EvidenceStatus>;

/// Evidence delivered for a mission: participant id -> slot id -> status.
///
/// Participants iterate in lexicographic order so that diagnostics naming
/// the first offending participant are reproducible.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct EvaluationInput {
    participants: BTreeMap<String, SlotStatuses>,
}

impl EvaluationInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a status, replacing any previous status for the same pair.
    pub fn record(
        &mut self,
        participant: impl Into<String>,
        slot_id: impl Into<String>,
        status: EvidenceStatus,
    ) {
        self.participants
            .entry(participant.into())
            .or_default()
            .insert(slot_id.into(), status);
    }

    /// Builder-style variant of [`record`](Self::record).
    pub fn with(
        mut self,
        participant: impl Into<String>,
        slot_id: impl Into<String>,
        status: EvidenceStatus,
    ) -> Self {
        self.record(participant, slot_id, status);
        self
    }

    /// Register a participant with no statuses yet.
    pub fn add_participant(&mut self, participant: impl Into<String>) {
        self.participants.entry(participant.into()).or_default();
    }

    /// Status recorded for a participant and slot, if any.
    pub fn status(&self, participant: &str, slot_id: &str) -> Option<EvidenceStatus> {
        self.participants
            .get(participant)
            .and_then(|slots| slots.get(slot_id))
            .copied()
    }

    /// Iterate participants and their statuses in stable order.
    pub fn participants(&self) -> impl Iterator<Item = (&str, &SlotStatuses)> {
        self.participants
            .iter()
            .map(|(id, slots)| (id.as_str(), slots))
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }
}

/// Outcome of evaluating a mission against an evidence state.
///
/// A failed rule is a normal result with `valid == false`, never an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResult {
    /// Whether the mission counts as completed
    pub valid: bool,

    /// Accepted share of normalized weight (0.0 - 1.0)
    pub ratio: f64,

    /// Normalized weight of accepted slots
    pub accepted_weight: f64,

    /// Normalized weight of rejected slots
    pub rejected_weight: f64,

    /// Human-readable explanation
    pub reason: String,
}

impl EvaluationResult {
    /// An invalid result that never reached weight accounting.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            ratio: 0.0,
            accepted_weight: 0.0,
            rejected_weight: 0.0,
            reason: reason.into(),
        }
    }
}
