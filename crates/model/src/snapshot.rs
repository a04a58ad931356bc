//! One refresh cycle's fetch result.

use crate::key::Key;
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};

/// Fetch outcome for one key: the sorted set of free slots, or a marker that
/// the fetch was attempted and failed. A failed key must never clear the
/// previously stored slots for that key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotSet {
    Slots(BTreeSet<NaiveDateTime>),
    Failed,
}

impl SlotSet {
    pub fn from_slots<I: IntoIterator<Item = NaiveDateTime>>(slots: I) -> Self {
        SlotSet::Slots(slots.into_iter().collect())
    }
}

/// Result of one availability refresh: keys absent from the map were never
/// attempted this cycle and keep whatever was stored before.
pub type Snapshot = HashMap<Key, SlotSet>;
