//! Diff output and the slot objects pushed to subscribers.

use crate::key::{ControlType, Key, Organism, UserType};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Direction of a per-key change between two successful snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotChange {
    Added,
    Removed,
}

/// One timestamp appearing in or vanishing from a key's slot set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEvent {
    pub key: Key,
    pub timestamp: NaiveDateTime,
    pub kind: SlotChange,
}

/// One appointment slot as exposed to clients: the key fields flattened next
/// to the timestamp, matching the wire schema of the subscribe stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Appointment {
    pub user_type: UserType,
    pub control_type: ControlType,
    pub vehicle_type: String,
    pub organism: Organism,
    pub site: String,
    pub timestamp: NaiveDateTime,
}

impl Appointment {
    pub fn new(key: &Key, timestamp: NaiveDateTime) -> Self {
        Self {
            user_type: key.user_type,
            control_type: key.control_type,
            vehicle_type: key.vehicle_type.clone(),
            organism: key.organism,
            site: key.site.clone(),
            timestamp,
        }
    }
}
