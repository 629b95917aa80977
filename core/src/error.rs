//! Error types for the release client.
//!
//! # Design
//! Errors are split by the moment they can happen. `ConfigError` and
//! `ClientError::InvalidEndpoint` surface while the client is being built and
//! are fatal to the caller. `TransportError` describes a failed round-trip and
//! never leaves `HttpClient`: it is reported to the event sink and folded into
//! `false` / `None`. The remaining `ClientError` variants describe a request
//! the client refuses to send or a 200 response it cannot honour.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required key is absent from the source.
    #[error("required property '{0}' is missing")]
    MissingKey(String),

    /// The key is present but its value cannot be used.
    #[error("property '{key}' has invalid value '{value}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// The properties file could not be read.
    #[error("failed to load properties file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors returned by `Endpoint` construction and `HttpClient` operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The scheme, domain and port do not assemble into a valid root URI.
    #[error("invalid endpoint '{uri}': {reason}")]
    InvalidEndpoint { uri: String, reason: String },

    /// The request target is not a relative reference.
    #[error("invalid request target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A 200 response carried a body that is not a JSON object.
    #[error("malformed response body: {0}")]
    MalformedResponse(String),
}

/// Network-level failures of a single round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connecting or reading did not finish within the configured timeout.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The host could not be resolved or refused the connection.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Writing the request or reading the response failed.
    #[error("I/O error: {0}")]
    Io(String),
}
