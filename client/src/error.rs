//! # Client Errors
//!
//! Typed errors for the HTTP layer and the data providers.
//!
//! Providers report every failure twice: once as a toast on the notification
//! channel and once as a [`ProviderError`] returned to the caller, so UI code
//! can react (disable a button, keep a form open) without listening to toasts.

use shared::ValidationError;

/// Errors raised while talking to the finance API
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// No session is active, so no auth header can be attached
    #[error("not signed in")]
    Unauthenticated,

    /// The request never produced a response (connection refused, timeout, ...)
    #[error("network error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status
    #[error("request failed with status code {status}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The configured base URL is unusable
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),
}

impl ApiError {
    /// HTTP status code, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors returned by the goal, category and transaction providers
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A 2xx answer other than the one the endpoint promises
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Edit/delete called on an entity that was never persisted
    #[error("item has no identifier")]
    MissingId,

    /// Form input rejected before anything was sent
    #[error("invalid input: {}", join_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
