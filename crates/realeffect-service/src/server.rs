//! axum server for the evaluation daemon.
//!
//! Routes:
//! - `POST /evaluate` evaluates a mission and returns an [`EvaluationResponse`]
//! - `GET /health` reports liveness, version and backend
//!
//! A completed evaluation is always `200`, whether or not the mission
//! passed. Requests that never reach evaluation get an `error` field and a
//! `400` (caller mistakes), `413` (body over the limit), `408` (timeout) or
//! `5xx` (upstream or server failures).

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::backend::EvaluationBackend;
use crate::config::ServiceConfig;
use crate::protocol::{EvaluationRequest, EvaluationResponse};
use crate::ServiceError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn EvaluationBackend>,
}

impl AppState {
    pub fn new(backend: Arc<dyn EvaluationBackend>) -> Self {
        Self { backend }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::Timeout => StatusCode::REQUEST_TIMEOUT,
            _ if self.is_client_error() => StatusCode::BAD_REQUEST,
            #[cfg(feature = "client")]
            ServiceError::Remote(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "evaluation request failed");
        } else {
            tracing::debug!(error = %self, "rejected evaluation request");
        }

        (status, Json(EvaluationResponse::failure(self.to_string()))).into_response()
    }
}

/// Build the router with body-size, timeout and tracing layers applied.
pub fn router(state: AppState, config: &ServiceConfig) -> Router {
    Router::new()
        .route("/evaluate", post(evaluate))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(middleware::map_response(timeout_as_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until ctrl-c.
pub async fn serve(
    config: ServiceConfig,
    backend: Arc<dyn EvaluationBackend>,
) -> Result<(), ServiceError> {
    let backend_name = backend.name().to_string();
    let app = router(AppState::new(backend), &config);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        backend = %backend_name,
        timeout = ?config.request_timeout,
        "realeffectd listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("realeffectd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

/// The timeout layer answers with an empty body; give it the failure shape.
async fn timeout_as_json(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        return ServiceError::Timeout.into_response();
    }
    response
}

async fn evaluate(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<EvaluationResponse>, ServiceError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServiceError::BodyTooLarge(rejection.body_text())
        } else {
            ServiceError::InvalidBody(rejection.body_text())
        }
    })?;

    let request: EvaluationRequest =
        serde_json::from_slice(&body).map_err(|e| ServiceError::InvalidBody(e.to_string()))?;

    let result = state.backend.evaluate(request).await?;
    tracing::debug!(valid = result.valid, ratio = result.ratio, "evaluation complete");

    Ok(Json(result.into()))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": realeffect_core::VERSION,
        "backend": state.backend.name(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    use crate::backend::LocalBackend;
    use realeffect_core::EvaluationResult;
    use std::time::Duration;

    const SPEC: &str = "mission_id: m\nevidence_slots:\n  - { id: a, weight: 0.2 }\n  - { id: b, weight: 0.2 }\n  - { id: c, weight: 0.2 }\n  - { id: d, weight: 0.2 }\n  - { id: e, weight: 0.2 }\n";

    /// Never answers within any test timeout.
    struct StalledBackend;

    #[async_trait::async_trait]
    impl EvaluationBackend for StalledBackend {
        async fn evaluate(
            &self,
            _request: EvaluationRequest,
        ) -> Result<EvaluationResult, ServiceError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(ServiceError::MissingSpec)
        }

        fn name(&self) -> &str {
            "stalled"
        }
    }

    fn app() -> Router {
        let state = AppState::new(Arc::new(LocalBackend::default()));
        router(state, &ServiceConfig::default())
    }

    async fn send(method: Method, uri: &str, body: impl Into<Body>) -> (StatusCode, Vec<u8>) {
        send_to(app(), method, uri, body).await
    }

    async fn send_to(
        app: Router,
        method: Method,
        uri: &str,
        body: impl Into<Body>,
    ) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn post_json(body: serde_json::Value) -> (StatusCode, EvaluationResponse) {
        let (status, bytes) = send(Method::POST, "/evaluate", body.to_string()).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_evaluate_valid_mission() {
        let (status, response) = post_json(serde_json::json!({ "spec": SPEC })).await;
        assert_eq!(status, StatusCode::OK);
        assert!(response.valid);
        assert!(response.error.is_none());
        assert_eq!(response.reason, "mission meets RealEffect 80% acceptance rule");
    }

    #[tokio::test]
    async fn test_failed_mission_is_still_ok() {
        let (status, response) =
            post_json(serde_json::json!({ "spec": SPEC, "scenario": "missing-proof" })).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!response.valid);
        assert_eq!(
            response.reason,
            "participant participant_1 missing required evidence slot a"
        );
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_bad_json_body() {
        let (status, bytes) = send(Method::POST, "/evaluate", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let response: EvaluationResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(response.error.unwrap().starts_with("invalid JSON body"));
        assert!(!response.valid);
    }

    #[tokio::test]
    async fn test_missing_spec() {
        let (status, response) = post_json(serde_json::json!({ "scenario": "all-accepted" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.error.as_deref(),
            Some("either 'spec' (YAML) or 'spec_path' must be provided")
        );
    }

    #[tokio::test]
    async fn test_structurally_invalid_spec() {
        let spec = "mission_id: m\nevidence_slots:\n  - { id: a, weight: 0.8 }\n";
        let (status, response) = post_json(serde_json::json!({ "spec": spec })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.error.as_deref(),
            Some("spec is INVALID (RealEffect core): evidence slot \"a\" weight 0.80 exceeds max allowed 0.40")
        );
    }

    #[tokio::test]
    async fn test_oversized_body() {
        let config = ServiceConfig {
            max_body_bytes: 64,
            ..Default::default()
        };
        let app = router(AppState::new(Arc::new(LocalBackend::default())), &config);
        let body = serde_json::json!({ "spec": SPEC }).to_string();
        assert!(body.len() > 64);

        let (status, bytes) = send_to(app, Method::POST, "/evaluate", body).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let response: EvaluationResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!response.valid);
        assert!(response.error.unwrap().starts_with("request body too large"));
    }

    #[tokio::test]
    async fn test_slow_evaluation_times_out() {
        let config = ServiceConfig {
            request_timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let app = router(AppState::new(Arc::new(StalledBackend)), &config);
        let body = serde_json::json!({ "spec": SPEC }).to_string();

        let (status, bytes) = send_to(app, Method::POST, "/evaluate", body).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);

        let response: EvaluationResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            response.error.as_deref(),
            Some("request exceeded the server timeout")
        );
    }

    #[tokio::test]
    async fn test_wrong_method() {
        let (status, _) = send(Method::GET, "/evaluate", Body::empty()).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, bytes) = send(Method::GET, "/health", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);

        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "local");
        assert_eq!(body["version"], realeffect_core::VERSION);
    }
}
