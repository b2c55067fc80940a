//! Error types for toniefinder.

use thiserror::Error;

/// Main error type for toniefinder operations.
///
/// None of these are fatal to a long-running host: every variant describes a
/// single failed lookup or refresh and is meant to be reported, not panicked on.
#[derive(Debug, Error)]
pub enum Error {
    /// A required argument was empty.
    #[error("missing required parameter: {0}")]
    InvalidArgument(&'static str),

    /// The NFC dump did not contain both a UID and a data content line.
    #[error("could not find UID or Data Content in the NFC dump")]
    IncompleteTag,

    /// The tag carries an all-zero auth token.
    #[error("custom tag (blank auth token), not a catalog tonie")]
    CustomTag,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a status other than 200/206.
    #[error("unexpected response code: {0}")]
    UnexpectedStatus(u16),

    /// Response body ended before the declared header length.
    #[error("truncated content header: expected {expected} bytes, got {actual}")]
    TruncatedHeader { expected: usize, actual: usize },

    /// Protobuf decoding error.
    #[error("protobuf error: {0}")]
    Proto(#[from] prost::DecodeError),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No catalog snapshot has been loaded yet.
    #[error("catalog not loaded")]
    CatalogUnavailable,

    /// The audio id is not a number.
    #[error("invalid audio id: {0:?}")]
    InvalidAudioId(String),

    /// The catalog has no entry for this audio id.
    #[error("no matching tonie found for audio id {0}")]
    NotFound(String),

    /// Continuation token could not be decoded.
    #[error("invalid tonie data: {0}")]
    InvalidToken(String),

    /// No registration service is configured.
    #[error("add functionality not available")]
    RegistrationUnavailable,

    /// Bad startup configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
