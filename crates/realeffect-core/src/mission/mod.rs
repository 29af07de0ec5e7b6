//! Mission spec model and loading.
//!
//! Mission specs are YAML (`.reff`) or JSON documents. Loading checks the
//! document shape against the mission JSON Schema and deserializes it into
//! [`MissionSpec`]; structural rules are applied later by the validator.

mod parser;
mod schema;

pub use parser::{Context, EvidenceSlot, MissionError, MissionSpec, ParticipantRole};
pub use schema::validate_mission_schema;
