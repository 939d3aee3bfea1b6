//! Error taxonomy shared by the API client and the cluster orchestrator

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the sextillion client library
#[derive(Debug, Error)]
pub enum Error {
    /// DNS, connection, TLS or body-read failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with something other than 200
    #[error("failed to call {method} {url}. status code: {status} body: {body}")]
    UnexpectedStatus {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// Structured content type, but neither JSON nor YAML decoding worked
    #[error("malformed response body from {url}: {reason}")]
    MalformedBody { url: String, reason: String },

    #[error("cluster {cluster_id} is not ready (last stage index {stage})")]
    ClusterNotReady { cluster_id: String, stage: i64 },

    #[error("gave up waiting for cluster {cluster_id} after {elapsed:?}")]
    WaitTimedOut { cluster_id: String, elapsed: Duration },

    #[error("wait for cluster {cluster_id} was cancelled")]
    WaitCancelled { cluster_id: String },

    #[error("operation cancelled")]
    Cancelled,

    /// `auth check` failed for a reason other than a rejected credential
    #[error("token is invalid")]
    TokenInvalid { status: Option<u16> },

    /// A required field is absent or has an unexpected type
    #[error("missing or invalid field '{field}' (expected {expected})")]
    MissingField {
        field: String,
        expected: &'static str,
    },

    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn missing_field(field: impl Into<String>, expected: &'static str) -> Self {
        Error::MissingField {
            field: field.into(),
            expected,
        }
    }

    /// HTTP status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UnexpectedStatus { status, .. } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            Error::TokenInvalid { status } => *status,
            _ => None,
        }
    }
}
