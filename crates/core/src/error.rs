//! Error types for the client.
//!
//! Errors fall into a small closed taxonomy ([`ErrorKind`]) so callers can
//! tell local validation failures from remote, retryable conditions without
//! matching every variant.

use reqwest::StatusCode;
use thiserror::Error;

use crate::params::ParamError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-range request, caught locally or by the server (400).
    Validation,
    /// Bad credentials, expired token or missing subscription (401/402).
    Authentication,
    /// Conflicting request state on the server (409).
    Conflict,
    /// Too many concurrent requests (429).
    RateLimit,
    /// Transport read timeout.
    Timeout,
    /// Connection failure or session closed mid-call.
    Transport,
    /// Unexpected status or response shape from the service.
    Service,
    /// Response body could not be decoded.
    Decode,
}

/// Errors returned by client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Parameters rejected locally; never reaches the network.
    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] ParamError),

    /// Server rejected the request as malformed (400).
    #[error("request rejected by service: {0}")]
    Validation(String),

    /// Credentials, token or subscription refused (401/402).
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Server-side conflict (409).
    #[error("conflicting request: {0}")]
    Conflict(String),

    /// Too many concurrent requests (429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Transport read timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Any other status, verbatim.
    #[error("service error {status}: {reason}")]
    UnknownService { status: u16, reason: String },

    /// Response content type does not match the host.
    #[error("unexpected content type: expected {expected}, got {actual}")]
    UnexpectedContentType { expected: &'static str, actual: String },

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Session was closed while the request was in flight.
    #[error("transport closed while request was in flight")]
    TransportClosed,

    /// Archive payload could not be read.
    #[error("invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Access key derivation failed.
    #[error("credential encoding failed: {0}")]
    Credential(String),

    /// Lazy re-initialization failed, so `operation` could not be serviced.
    #[error("session unavailable for {operation}: {source}")]
    SessionUnavailable {
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns the taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidParams(_) | Error::Validation(_) | Error::Credential(_) => ErrorKind::Validation,
            Error::Authentication(_) => ErrorKind::Authentication,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::RateLimited(_) => ErrorKind::RateLimit,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Transport(_) | Error::TransportClosed => ErrorKind::Transport,
            Error::UnknownService { .. } | Error::UnexpectedContentType { .. } => ErrorKind::Service,
            Error::Archive(_) | Error::Io(_) | Error::Json(_) => ErrorKind::Decode,
            Error::SessionUnavailable { source, .. } => source.kind(),
        }
    }

    /// Returns true if the caller may retry the same request later.
    ///
    /// The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::RateLimit | ErrorKind::Timeout | ErrorKind::Transport)
    }

    /// Returns true for 401/402-class failures.
    pub fn is_authentication(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err.to_string())
        } else {
            Error::Transport(err)
        }
    }
}

/// Maps a non-success status and its body to the matching error.
///
/// `body` is the raw response text; the service's `message` field is used
/// when present.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> Error {
    let message = server_message(body);
    match status.as_u16() {
        400 => Error::Validation(message),
        401 | 402 => Error::Authentication(message),
        409 => Error::Conflict(message),
        429 => Error::RateLimited(message),
        code => Error::UnknownService {
            status: code,
            reason: status.canonical_reason().unwrap_or("unknown status").to_string(),
        },
    }
}

fn server_message(body: &str) -> String {
    match serde_json::from_str::<nai_protocol::ErrorBody>(body) {
        Ok(parsed) if !parsed.message.is_empty() => parsed.message,
        _ => body.trim().to_string(),
    }
}
