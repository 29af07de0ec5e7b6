//! # realeffect-core
//!
//! Deterministic mission spec validation and evidence acceptance engine.
//!
//! A mission spec declares weighted evidence slots. This crate answers:
//! - Is the spec structurally sound?
//! - Did every participant deliver every slot?
//! - Does the accepted share of weight reach the acceptance threshold?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same spec and evidence always produce the same result
//! 2. **Fail fast**: A structurally invalid spec is never evaluated
//! 3. **Invalid is a value**: Failed acceptance rules produce a result, not an error
//! 4. **Reproducible diagnostics**: Participants and slots are visited in stable order
//!
//! ## Example
//!
//! ```rust,ignore
//! use realeffect_core::{evaluate_scenario, MissionSpec, RuleSet};
//!
//! let spec = MissionSpec::from_file("missions/plant_100_trees.reff")?;
//! let result = evaluate_scenario(&spec, "low-acceptance", &RuleSet::default())?;
//!
//! println!("valid={} ratio={:.2}: {}", result.valid, result.ratio, result.reason);
//! ```

pub mod evaluator;
pub mod mission;
pub mod rules;
pub mod scenario;
pub mod types;
pub mod validator;

// Re-export main types at crate root
pub use evaluator::Evaluator;
pub use mission::{Context, EvidenceSlot, MissionError, MissionSpec, ParticipantRole};
pub use rules::RuleSet;
pub use scenario::{Scenario, SCENARIO_PARTICIPANT};
pub use types::{EvaluationInput, EvaluationResult, EvidenceStatus, SlotStatuses};
pub use validator::{SpecError, SpecValidator};

/// Engine version reported by the CLI and the service.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Scenario used when a caller does not name one.
pub const DEFAULT_SCENARIO: &str = "all-accepted";

/// Validate a mission spec against the default rule set.
pub fn validate_spec(spec: &MissionSpec) -> Result<(), SpecError> {
    SpecValidator::default().validate(spec)
}

/// Evaluate an evidence state against the default rule set.
///
/// The spec is assumed to be validated already; see [`evaluate_submission`]
/// for the checked variant.
pub fn evaluate(spec: &MissionSpec, input: &EvaluationInput) -> EvaluationResult {
    Evaluator::default().evaluate(spec, input)
}

/// Validate `spec`, synthesize the named scenario and evaluate it.
pub fn evaluate_scenario(
    spec: &MissionSpec,
    scenario_name: &str,
    rules: &RuleSet,
) -> Result<EvaluationResult, SpecError> {
    SpecValidator::new(rules.clone()).validate(spec)?;

    let input = scenario::build(spec, scenario_name);
    let result = Evaluator::new(rules.clone()).evaluate(spec, &input);

    tracing::info!(
        mission_id = %spec.mission_id,
        scenario = scenario_name,
        valid = result.valid,
        ratio = result.ratio,
        "scenario evaluated"
    );

    Ok(result)
}

/// Validate `spec` and evaluate a submitted evidence state against it.
pub fn evaluate_submission(
    spec: &MissionSpec,
    input: &EvaluationInput,
    rules: &RuleSet,
) -> Result<EvaluationResult, SpecError> {
    SpecValidator::new(rules.clone()).validate(spec)?;

    let result = Evaluator::new(rules.clone()).evaluate(spec, input);

    tracing::info!(
        mission_id = %spec.mission_id,
        participants = input.participant_count(),
        valid = result.valid,
        ratio = result.ratio,
        "submission evaluated"
    );

    Ok(result)
}
