//! Wire types for the subscribe stream and REST error bodies.

use model::Appointment;
use serde::Serialize;

/// One batch pushed to a subscriber: the initial view after a criteria
/// message (everything reported as `added`), then one per refresh cycle
/// that produced matching changes.
#[derive(Debug, Clone, Serialize)]
pub struct SlotPush {
    pub status: u16,
    pub added: Vec<Appointment>,
    pub removed: Vec<Appointment>,
}

impl SlotPush {
    pub fn new(added: Vec<Appointment>, removed: Vec<Appointment>) -> Self {
        Self {
            status: 200,
            added,
            removed,
        }
    }
}

/// Error body, on the stream and on REST routes alike. Validation failures
/// carry a message naming the offending field; a malformed stream payload
/// gets a bare `{"status": 500}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: u16,
}

impl ErrorReply {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            status: 400,
        }
    }

    pub fn malformed() -> Self {
        Self {
            message: None,
            status: 500,
        }
    }

    pub fn internal() -> Self {
        Self {
            message: Some("Internal Server Error".to_string()),
            status: 500,
        }
    }
}
