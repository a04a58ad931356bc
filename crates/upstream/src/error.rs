//! Provider-side failures. These never reach a client; they are logged and
//! isolated to the affected key.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider responded with unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("malformed provider payload: {0}")]
    MalformedPayload(String),

    #[error("client is shut down")]
    Closed,
}

pub type Result<T> = std::result::Result<T, UpstreamError>;
