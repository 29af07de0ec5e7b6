//! # realeffect-service
//!
//! HTTP transport for RealEffect mission evaluation.
//!
//! This crate wraps the deterministic engine in `realeffect-core` with:
//! - a JSON wire protocol (`POST /evaluate`)
//! - an axum server and the `realeffectd` daemon (feature `server`)
//! - a retrying reqwest client for a running daemon (feature `client`)
//!
//! Both the in-process [`LocalBackend`] and the [`RemoteClient`] implement
//! [`EvaluationBackend`], so callers can switch between evaluating locally
//! and asking a daemon without changing code.
//!
//! ## Example
//!
//! ```rust,ignore
//! use realeffect_service::{ClientConfig, RemoteClient};
//!
//! let client = RemoteClient::new(ClientConfig::new("http://127.0.0.1:8081"))?;
//! let result = client
//!     .evaluate_from_file("missions/plant_100_trees.reff", "missing-proof")
//!     .await?;
//! assert!(!result.valid);
//! ```

use std::path::PathBuf;

use realeffect_core::{MissionError, SpecError};
use thiserror::Error;

pub mod backend;
pub mod config;
pub mod protocol;

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "server")]
pub mod server;

pub use backend::{EvaluationBackend, LocalBackend};
pub use config::{ConfigError, ConfigOverrides, ServiceConfig};
pub use protocol::{EvaluationRequest, EvaluationResponse, SpecSource};

#[cfg(feature = "client")]
pub use client::{ClientConfig, ClientError, RemoteClient};

/// Errors that stop a request before an evaluation result exists.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid JSON body: {0}")]
    InvalidBody(String),

    #[error("request body too large: {0}")]
    BodyTooLarge(String),

    #[error("request exceeded the server timeout")]
    Timeout,

    #[error("either 'spec' (YAML) or 'spec_path' must be provided")]
    MissingSpec,

    #[error("cannot read spec_path {path:?}: {source}")]
    SpecPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing YAML spec: {0}")]
    Parse(#[source] MissionError),

    #[error("spec is INVALID (RealEffect core): {0}")]
    InvalidSpec(#[from] SpecError),

    #[cfg(feature = "client")]
    #[error("remote evaluation failed: {0}")]
    Remote(#[from] ClientError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Whether the caller sent something unusable, as opposed to an
    /// upstream or server-side failure.
    pub fn is_client_error(&self) -> bool {
        match self {
            ServiceError::InvalidBody(_)
            | ServiceError::BodyTooLarge(_)
            | ServiceError::MissingSpec
            | ServiceError::SpecPath { .. }
            | ServiceError::Parse(_)
            | ServiceError::InvalidSpec(_) => true,
            // The upstream daemon rejected what the caller sent.
            #[cfg(feature = "client")]
            ServiceError::Remote(ClientError::Service(_)) => true,
            #[cfg(feature = "client")]
            ServiceError::Remote(_) => false,
            ServiceError::Timeout | ServiceError::Io(_) => false,
        }
    }
}
