//! Serde shapes for provider payloads.

use crate::error::{Result, UpstreamError};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// Entry of the site list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteEntry {
    pub id: i64,
    pub name: String,
}

/// Entry of the vehicle-type list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleTypeEntry {
    pub id: i64,
    pub name: String,
}

/// Body the provider sends with HTTP 400 when a combination has no bookable
/// slots (e.g. a site that does not inspect motorcycles). Only the
/// documented `code=1/type=TECHNICAL` shape means "zero results"; anything
/// else on a 400 is a real failure.
#[derive(Debug, Clone, Deserialize)]
pub struct TechnicalError {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TechnicalError {
    pub fn is_no_results(&self) -> bool {
        self.code == "1" && self.kind == "TECHNICAL"
    }
}

/// Availability payload: time of day (`"08H30"`) -> list of dates
/// (`"2026-08-20"`).
pub type AvailabilityPayload = BTreeMap<String, Vec<String>>;

/// Provider timestamp format once a date and a time are joined:
/// `2026-08-20T08H30`.
const SLOT_FORMAT: &str = "%Y-%m-%dT%HH%M";

/// Flatten the nested time -> date-list mapping into a sorted set of unique
/// timestamps.
pub fn flatten_availability(payload: &AvailabilityPayload) -> Result<BTreeSet<NaiveDateTime>> {
    let mut slots = BTreeSet::new();
    for (time, dates) in payload {
        for date in dates {
            let joined = format!("{date}T{time}");
            let slot = NaiveDateTime::parse_from_str(&joined, SLOT_FORMAT).map_err(|err| {
                UpstreamError::MalformedPayload(format!("bad slot {joined:?}: {err}"))
            })?;
            slots.insert(slot);
        }
    }
    Ok(slots)
}
