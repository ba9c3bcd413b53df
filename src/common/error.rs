//! Error types for minifs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Validation Errors ===
    #[error("file name can not be empty")]
    EmptyFileName,

    #[error("file {0} already exists and cannot be rewritten")]
    DuplicateFileName(String),

    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    #[error("bad node id {0:?}, expected exactly {1} characters")]
    InvalidNodeId(String, usize),

    #[error("bad path for storing files: {0}")]
    BadStoragePath(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    // === Admission Errors ===
    #[error("no quorum, service not ready: need {needed} nodes, have {available}")]
    NoQuorum { needed: usize, available: usize },

    // === Lookup Errors ===
    #[error("file not found: {0}")]
    NotFound(String),

    // === Transport Errors ===
    #[error("shard {shard} transfer to {node} failed: {reason}")]
    ShardTransfer {
        shard: usize,
        node: String,
        reason: String,
    },

    #[error("cant save file: {failed} of {total} shard transfers failed")]
    PartialWrite { failed: usize, total: usize },

    #[error("cant load shard {shard} from {node}: {reason}")]
    ShardFetch {
        shard: usize,
        node: String,
        reason: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("cant register self in coordinator: {0}")]
    RegistrationFailed(String),

    // === Lifecycle Errors ===
    #[error("invalid lifecycle transition: {0}")]
    InvalidState(String),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convert to HTTP status code
    pub fn to_http_status(&self) -> StatusCode {
        match self {
            Error::EmptyFileName
            | Error::DuplicateFileName(_)
            | Error::InvalidFileName(_)
            | Error::InvalidNodeId(..)
            | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::NoQuorum { .. } | Error::PartialWrite { .. } | Error::ShardTransfer { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Error::UnexpectedStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.to_http_status(), self.to_string()).into_response()
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
