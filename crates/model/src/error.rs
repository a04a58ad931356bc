//! Client-input validation errors.

use thiserror::Error;

/// Rejected client-supplied parameters or criteria. The message always names
/// the offending field so it can be returned verbatim in a 400 body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be one of: {allowed}")]
    UnknownValue { field: &'static str, allowed: String },

    #[error("{field} must be an ISO-8601 timestamp, got {value:?}")]
    BadTimestamp { field: &'static str, value: String },

    #[error("{field} must be an ISO-8601 date (YYYY-MM-DD), got {value:?}")]
    BadDate { field: &'static str, value: String },

    #[error("start_date must not be after end_date")]
    InvertedRange,
}

impl ValidationError {
    pub fn unknown_value<I, S>(field: &'static str, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = allowed
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        ValidationError::UnknownValue { field, allowed }
    }
}
