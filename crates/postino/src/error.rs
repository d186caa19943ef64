//! Error taxonomy for calls against the dates API.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response: connection refused, DNS,
    /// deadline exceeded.
    #[error("network failure: {0}")]
    Network(#[source] reqwest::Error),

    /// Non-2xx response. `message` is the `error` field of the body, or a
    /// fallback for the operation when the body has none.
    #[error("{message} (status {status})")]
    Server { status: u16, message: String },

    /// Rejected before sending, e.g. a blank activity name.
    #[error("{0}")]
    Validation(String),

    /// 2xx response whose body could not be decoded.
    #[error("unexpected response body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Text suitable for an inline error region.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(e) if e.is_timeout() => {
                "The dates service did not answer in time".to_string()
            }
            ClientError::Network(_) => "Could not reach the dates service".to_string(),
            ClientError::Server { message, .. } => message.clone(),
            ClientError::Validation(message) => message.clone(),
            ClientError::Decode(_) => "The dates service sent an unreadable response".to_string(),
            ClientError::Config(message) => message.clone(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}
