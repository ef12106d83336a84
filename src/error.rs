//! Error taxonomy for the client SDK.
//!
//! Errors are classified by what the caller can do about them:
//! - Network: transport failure before a response was obtained
//! - Auth: the backend rejected our token (session is already cleared)
//! - Api: the backend answered with a non-2xx JSON error
//! - Protocol: the backend answered with something that is not JSON

use thiserror::Error;

/// Errors surfaced by every SDK operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure: DNS, connect, TLS, timeout. No response obtained.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP 401. The session has already been cleared when this is raised.
    #[error("Unauthorized: session cleared, login required")]
    Auth,

    /// Any other non-2xx JSON response, with the server-supplied message.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Non-JSON content type or a body that failed to parse as JSON.
    #[error("Invalid response from server ({status})")]
    Protocol { status: u16 },

    /// Approval id not present in the local pending set.
    #[error("Approval {0} is not in the pending set")]
    UnknownApproval(i64),

    /// Durable session storage failure.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure: session storage or decoding a
    /// response body into a typed model.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// True when the error means the user must log in again.
    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth)
    }

    /// True when a manual retry of the same call could plausibly succeed.
    ///
    /// Policy is fail-fast: the SDK never retries on its own, the caller
    /// decides whether to try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }
}
