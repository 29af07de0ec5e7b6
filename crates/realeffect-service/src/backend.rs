//! Evaluation backends.
//!
//! [`EvaluationBackend`] is the seam between the transport and whatever
//! actually runs the engine: [`LocalBackend`] runs it in-process, and the
//! remote client forwards to a running daemon.

use async_trait::async_trait;
use realeffect_core::{
    evaluate_scenario, evaluate_submission, EvaluationResult, MissionSpec, RuleSet,
};

use crate::protocol::{EvaluationRequest, SpecSource};
use crate::ServiceError;

/// Something that can turn an evaluation request into a result.
#[async_trait]
pub trait EvaluationBackend: Send + Sync {
    /// Load, validate and evaluate the requested mission.
    async fn evaluate(&self, request: EvaluationRequest) -> Result<EvaluationResult, ServiceError>;

    /// Backend name for logs and health output.
    fn name(&self) -> &str;
}

/// Runs the engine in the current process.
#[derive(Debug, Clone, Default)]
pub struct LocalBackend {
    rules: RuleSet,
}

impl LocalBackend {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    async fn load_spec(&self, request: &EvaluationRequest) -> Result<MissionSpec, ServiceError> {
        let text = match request.source()? {
            SpecSource::Text(text) => text.to_string(),
            SpecSource::Path(path) => {
                let path = std::path::absolute(path).map_err(|source| ServiceError::SpecPath {
                    path: path.to_path_buf(),
                    source,
                })?;
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|source| ServiceError::SpecPath { path, source })?
            }
        };

        // JSON documents are valid YAML, so one parser covers both.
        MissionSpec::from_yaml(&text).map_err(ServiceError::Parse)
    }
}

#[async_trait]
impl EvaluationBackend for LocalBackend {
    async fn evaluate(&self, request: EvaluationRequest) -> Result<EvaluationResult, ServiceError> {
        let spec = self.load_spec(&request).await?;

        let result = match &request.evidence {
            Some(evidence) => evaluate_submission(&spec, evidence, &self.rules)?,
            None => evaluate_scenario(&spec, request.scenario(), &self.rules)?,
        };

        Ok(result)
    }

    fn name(&self) -> &str {
        "local"
    }
}
