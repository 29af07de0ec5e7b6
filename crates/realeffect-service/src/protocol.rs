//! Wire protocol for `POST /evaluate`.
//!
//! A request names a spec either inline (`spec`, YAML or JSON text) or by
//! path (`spec_path`, read by the service). Inline text wins when both are
//! set. The evidence state is either a named scenario or an explicit
//! `evidence` map.

use std::path::Path;

use realeffect_core::{EvaluationInput, EvaluationResult, DEFAULT_SCENARIO};
use serde::{Deserialize, Serialize};

use crate::ServiceError;

/// Body of an evaluation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EvaluationRequest {
    /// Raw mission spec text
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub spec: String,

    /// Path to a mission file, resolved by the service
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub spec_path: String,

    /// Scenario name; empty means `all-accepted`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scenario: String,

    /// Submitted evidence; replaces the scenario when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<EvaluationInput>,
}

/// Where the spec for a request comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpecSource<'a> {
    Text(&'a str),
    Path(&'a Path),
}

impl EvaluationRequest {
    /// Request evaluation of a mission file under a scenario.
    pub fn from_path(spec_path: impl Into<String>, scenario: impl Into<String>) -> Self {
        Self {
            spec_path: spec_path.into(),
            scenario: scenario.into(),
            ..Default::default()
        }
    }

    /// Request evaluation of inline spec text under a scenario.
    pub fn from_text(spec: impl Into<String>, scenario: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            scenario: scenario.into(),
            ..Default::default()
        }
    }

    /// Evaluate submitted evidence instead of a synthetic scenario.
    pub fn with_evidence(mut self, evidence: EvaluationInput) -> Self {
        self.evidence = Some(evidence);
        self
    }

    /// Scenario name, defaulting to `all-accepted`.
    pub fn scenario(&self) -> &str {
        let scenario = self.scenario.trim();
        if scenario.is_empty() {
            DEFAULT_SCENARIO
        } else {
            scenario
        }
    }

    /// Resolve the spec source. Blank fields count as absent.
    pub fn source(&self) -> Result<SpecSource<'_>, ServiceError> {
        if !self.spec.trim().is_empty() {
            return Ok(SpecSource::Text(&self.spec));
        }
        if !self.spec_path.trim().is_empty() {
            return Ok(SpecSource::Path(Path::new(self.spec_path.trim())));
        }
        Err(ServiceError::MissingSpec)
    }
}

/// Body of an evaluation response.
///
/// `error` is set only when the request never reached evaluation; a
/// rejected mission is reported through `valid` and `reason`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EvaluationResponse {
    pub valid: bool,
    pub ratio: f64,
    pub accepted_weight: f64,
    pub rejected_weight: f64,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Convert back into a result, or the reported error message.
    pub fn into_result(self) -> Result<EvaluationResult, String> {
        match self.error {
            Some(error) if !error.is_empty() => Err(error),
            _ => Ok(EvaluationResult {
                valid: self.valid,
                ratio: self.ratio,
                accepted_weight: self.accepted_weight,
                rejected_weight: self.rejected_weight,
                reason: self.reason,
            }),
        }
    }
}

impl From<EvaluationResult> for EvaluationResponse {
    fn from(result: EvaluationResult) -> Self {
        Self {
            valid: result.valid,
            ratio: result.ratio,
            accepted_weight: result.accepted_weight,
            rejected_weight: result.rejected_weight,
            reason: result.reason,
            error: None,
        }
    }
}
