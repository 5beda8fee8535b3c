//! Error types for the telemetry pipeline.
//!
//! None of these escape `Analytics::track`. Transport failures are absorbed by the
//! requeue path, identity failures resolve to "no user", and storage failures fall
//! back to in-memory state. They are public so hosts and transports can produce them.

use std::time::Duration;
use thiserror::Error;

/// Failure delivering a payload to the collection endpoint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request never produced a response (connection refused, DNS, reset).
    #[error("network error: {0}")]
    Network(String),
    /// The endpoint answered with a non-success status.
    #[error("collection endpoint returned status {status}")]
    Status { status: u16 },
    /// The request did not complete within the configured limit.
    #[error("delivery timed out after {timeout:?}")]
    Timeout { timeout: Duration },
    /// The endpoint URL could not be used.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// The payload could not be encoded.
    #[error("failed to encode payload: {0}")]
    Encode(String),
}

impl TransportError {
    /// Whether the endpoint was reached at all.
    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Invalid pipeline configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("batch threshold must be at least 1 (got {0})")]
    BatchThreshold(usize),
    #[error("max retained must be at least 1 (got {0})")]
    MaxRetained(usize),
    #[error("flush interval must be non-zero")]
    FlushInterval,
    #[error("request timeout must be non-zero")]
    RequestTimeout,
    #[error("malformed configuration: {0}")]
    Parse(String),
}

/// A host store refused an operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The store is disabled or full (private browsing, quota exceeded).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// The persisted identity blob could not be read.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("stored identity is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("stored identity has no usable `id` field")]
    MissingId,
}
