//! Current best-known slot set per key, with incremental diffing.

use chrono::NaiveDateTime;
use model::{Appointment, Criterion, Key, SlotChange, SlotEvent, SlotSet, Snapshot};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use tracing::warn;

/// In-memory store of the latest successful fetch per key. Mutated only by
/// the dispatcher while it holds its store lock.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    slots: HashMap<Key, BTreeSet<NaiveDateTime>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one refresh result. Per key:
    /// - first observation: store as-is, no events;
    /// - failure marker: keep the previous slots, warn;
    /// - otherwise `added = new - old`, `removed = old - new`, replace the
    ///   whole value.
    ///
    /// Returns the cycle's event batch; callers fan it out after every key
    /// has been processed.
    pub fn apply(&mut self, snapshot: Snapshot) -> Vec<SlotEvent> {
        let mut events = Vec::new();
        for (key, slot_set) in snapshot {
            let new = match slot_set {
                SlotSet::Failed => {
                    warn!("refresh failed for {key}, keeping previous slots");
                    continue;
                }
                SlotSet::Slots(new) => new,
            };
            match self.slots.entry(key) {
                Entry::Vacant(entry) => {
                    entry.insert(new);
                }
                Entry::Occupied(mut entry) => {
                    let old = entry.get();
                    for &timestamp in new.difference(old) {
                        events.push(SlotEvent {
                            key: entry.key().clone(),
                            timestamp,
                            kind: SlotChange::Added,
                        });
                    }
                    for &timestamp in old.difference(&new) {
                        events.push(SlotEvent {
                            key: entry.key().clone(),
                            timestamp,
                            kind: SlotChange::Removed,
                        });
                    }
                    entry.insert(new);
                }
            }
        }
        events
    }

    pub fn slots_for(&self, key: &Key) -> Option<&BTreeSet<NaiveDateTime>> {
        self.slots.get(key)
    }

    /// Everything currently stored that matches any of the given criteria,
    /// deduplicated and ordered. This is the initial push a fresh
    /// subscription receives.
    pub fn matching(&self, criteria: &[Criterion]) -> Vec<Appointment> {
        let mut matched: BTreeSet<(Key, NaiveDateTime)> = BTreeSet::new();
        for criterion in criteria {
            if let Some(slots) = self.slots.get(&criterion.key) {
                for &timestamp in slots.range(criterion.start..=criterion.end) {
                    matched.insert((criterion.key.clone(), timestamp));
                }
            }
        }
        matched
            .into_iter()
            .map(|(key, timestamp)| Appointment::new(&key, timestamp))
            .collect()
    }

    pub fn key_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.values().map(BTreeSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use model::{ControlType, Organism, UserType};

    fn key(site: &str) -> Key {
        Key {
            user_type: UserType::Private,
            control_type: ControlType::Regular,
            vehicle_type: "car".into(),
            organism: Organism::Snct,
            site: site.into(),
        }
    }

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 20)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn snapshot_of(key: Key, slots: &[NaiveDateTime]) -> Snapshot {
        let mut snapshot = Snapshot::new();
        snapshot.insert(key, SlotSet::from_slots(slots.iter().copied()));
        snapshot
    }

    #[test]
    fn first_observation_stores_without_events() {
        let mut store = SnapshotStore::new();
        let events = store.apply(snapshot_of(key("a"), &[ts(10, 0), ts(11, 0)]));
        assert!(events.is_empty());
        assert_eq!(store.slots_for(&key("a")).unwrap().len(), 2);
    }

    #[test]
    fn diff_emits_added_and_removed() {
        let mut store = SnapshotStore::new();
        store.apply(snapshot_of(key("a"), &[ts(10, 0), ts(11, 0)]));

        let events = store.apply(snapshot_of(key("a"), &[ts(11, 0), ts(12, 0)]));
        let added: Vec<_> = events
            .iter()
            .filter(|e| e.kind == SlotChange::Added)
            .map(|e| e.timestamp)
            .collect();
        let removed: Vec<_> = events
            .iter()
            .filter(|e| e.kind == SlotChange::Removed)
            .map(|e| e.timestamp)
            .collect();
        assert_eq!(added, vec![ts(12, 0)]);
        assert_eq!(removed, vec![ts(10, 0)]);
    }

    #[test]
    fn applying_added_then_removed_reconstructs_the_new_set() {
        let mut store = SnapshotStore::new();
        let before: BTreeSet<_> = [ts(8, 0), ts(9, 30), ts(10, 0)].into_iter().collect();
        let after: BTreeSet<_> = [ts(9, 30), ts(13, 0), ts(14, 0)].into_iter().collect();

        store.apply(snapshot_of(key("a"), &before.iter().copied().collect::<Vec<_>>()));
        let events = store.apply(snapshot_of(key("a"), &after.iter().copied().collect::<Vec<_>>()));

        let mut reconstructed = before;
        for event in &events {
            match event.kind {
                SlotChange::Added => {
                    reconstructed.insert(event.timestamp);
                }
                SlotChange::Removed => {
                    reconstructed.remove(&event.timestamp);
                }
            }
        }
        assert_eq!(reconstructed, after);
    }

    #[test]
    fn identical_snapshot_is_idempotent() {
        let mut store = SnapshotStore::new();
        let slots = [ts(10, 0), ts(11, 0)];
        store.apply(snapshot_of(key("a"), &slots));
        assert!(store.apply(snapshot_of(key("a"), &slots)).is_empty());
    }

    #[test]
    fn failed_key_retains_previous_slots_and_stays_silent() {
        let mut store = SnapshotStore::new();
        store.apply(snapshot_of(key("a"), &[ts(10, 0)]));

        let mut snapshot = Snapshot::new();
        snapshot.insert(key("a"), SlotSet::Failed);
        let events = store.apply(snapshot);

        assert!(events.is_empty());
        assert_eq!(store.slots_for(&key("a")).unwrap().len(), 1);
    }

    #[test]
    fn failure_on_one_key_leaves_other_keys_untouched() {
        let mut store = SnapshotStore::new();
        store.apply(snapshot_of(key("a"), &[ts(10, 0)]));
        store.apply(snapshot_of(key("b"), &[ts(10, 0)]));

        let mut snapshot = Snapshot::new();
        snapshot.insert(key("a"), SlotSet::Failed);
        snapshot.insert(key("b"), SlotSet::from_slots([ts(10, 0), ts(12, 0)]));
        let events = store.apply(snapshot);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key, key("b"));
        assert_eq!(events[0].timestamp, ts(12, 0));
        assert_eq!(store.slots_for(&key("a")).unwrap().len(), 1);
    }

    #[test]
    fn matching_filters_by_key_and_inclusive_window() {
        let mut store = SnapshotStore::new();
        store.apply(snapshot_of(key("a"), &[ts(9, 0), ts(10, 30), ts(11, 0)]));

        let criterion = Criterion {
            key: key("a"),
            start: ts(10, 30),
            end: ts(11, 0),
        };
        let matched = store.matching(&[criterion]);
        let timestamps: Vec<_> = matched.iter().map(|a| a.timestamp).collect();
        assert_eq!(timestamps, vec![ts(10, 30), ts(11, 0)]);
    }

    #[test]
    fn matching_merges_overlapping_criteria_without_duplicates() {
        let mut store = SnapshotStore::new();
        store.apply(snapshot_of(key("a"), &[ts(10, 0), ts(11, 0)]));

        let wide = Criterion {
            key: key("a"),
            start: ts(9, 0),
            end: ts(12, 0),
        };
        let narrow = Criterion {
            key: key("a"),
            start: ts(10, 0),
            end: ts(10, 0),
        };
        assert_eq!(store.matching(&[wide, narrow]).len(), 2);
    }
}
