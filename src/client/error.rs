use serde_json::Value;
use thiserror::Error;

/// Normalized failures surfaced by the API client. Credential problems are
/// collapsed the same way the server collapses them: the caller only learns
/// that the session is gone, never which check failed.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport produced no response at all (timeout, DNS, refused).
    #[error("Network error - please check your connection")]
    Network(#[source] reqwest::Error),

    /// 401 with no stored refresh token; nothing to retry with.
    #[error("Your session has expired, please log in again")]
    Unauthorized,

    /// The refresh attempt (or the replayed request) was rejected.
    #[error("Your session has expired, please log in again")]
    SessionExpired,

    /// Any other non-success status, message taken from the server body.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    #[error("invalid request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ClientError {
    /// HTTP status of an `Api` rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
