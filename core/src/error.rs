//! Error types for the FamilyLedger API client.
//!
//! # Design
//! Failures come in two layers. `ApiError` is the closed taxonomy for
//! everything the backend said (or failed to say) once an HTTP exchange
//! happened; exactly one variant is produced per failed call.
//! `TransportError` covers exchanges that never completed. `Error` is what
//! every client operation returns and keeps the two layers apart so callers
//! can match on either.

use thiserror::Error;

use crate::envelope::FieldErrors;

/// Message used for 5xx responses whose body carries no usable message.
pub const GENERIC_SERVER_MESSAGE: &str = "Internal server error";

/// Message used for unsuccessful envelopes that explain nothing.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

/// Classified failure of an HTTP exchange that did complete.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The base URL, endpoint path and query did not compose into a URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The exchange did not produce something interpretable as HTTP.
    #[error("invalid HTTP response")]
    InvalidResponse,

    /// 401. The session observer has already been notified.
    #[error("unauthorized")]
    Unauthorized,

    /// 403.
    #[error("forbidden")]
    Forbidden,

    /// 404.
    #[error("not found")]
    NotFound,

    /// Field-level validation failures reported by the backend.
    #[error("validation failed: {}", describe_fields(.0))]
    Validation(FieldErrors),

    /// The backend reported a general failure.
    #[error("server error: {0}")]
    Server(String),

    /// The body could not be decoded into the expected shape.
    #[error("decoding failed: {0}")]
    Decoding(#[source] serde_json::Error),

    /// 422 without field errors, or a successful envelope missing `data`.
    #[error("invalid data")]
    InvalidData,

    /// Any status the classification table does not name.
    #[error("unexpected HTTP status {0}")]
    UnknownStatus(u16),
}

fn describe_fields(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// The HTTP exchange itself failed.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct TransportError(Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        Self(Box::new(value))
    }
}

/// Errors returned by `ApiClient` operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The request body could not be serialized to JSON.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl Error {
    /// The taxonomy value, if this failure came from the backend.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// Easy alias for error handling
pub type Result<T> = std::result::Result<T, Error>;
