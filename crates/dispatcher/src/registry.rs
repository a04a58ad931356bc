//! Live subscriptions and per-cycle fan-out.

use dashmap::DashMap;
use model::{Appointment, Criterion, SlotChange, SlotEvent};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Unique identifier of one live subscriber (one WebSocket connection).
pub type SubscriptionId = Uuid;

/// Delivery capability of a subscriber. One operation, fire-and-forget:
/// implementations must not block — a slow or dead consumer is dropped on
/// the floor, never propagated back into the refresh cycle.
pub trait Subscriber: Send + Sync {
    fn deliver(&self, added: &[Appointment], removed: &[Appointment]);
}

struct Subscription {
    criteria: Vec<Criterion>,
    subscriber: Arc<dyn Subscriber>,
}

/// Registry of live subscriptions. Entries are inserted/replaced on each
/// valid criteria message and removed on disconnect.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: DashMap<SubscriptionId, Subscription>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the subscription for `id`. A replacement drops the
    /// previous criteria list entirely (last message wins).
    pub fn insert(
        &self,
        id: SubscriptionId,
        criteria: Vec<Criterion>,
        subscriber: Arc<dyn Subscriber>,
    ) {
        self.subscriptions.insert(id, Subscription { criteria, subscriber });
    }

    /// Remove the subscription if present. Idempotent.
    pub fn remove(&self, id: &SubscriptionId) -> bool {
        self.subscriptions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Deliver one cycle's event batch. For each subscription the matches of
    /// all its criteria are merged and delivered as a single push; a
    /// subscription with no matching event receives nothing this cycle.
    pub fn fan_out(&self, events: &[SlotEvent]) {
        for entry in self.subscriptions.iter() {
            let subscription = entry.value();
            let mut added = Vec::new();
            let mut removed = Vec::new();
            for event in events {
                let matches = subscription
                    .criteria
                    .iter()
                    .any(|criterion| criterion.matches(&event.key, event.timestamp));
                if !matches {
                    continue;
                }
                let appointment = Appointment::new(&event.key, event.timestamp);
                match event.kind {
                    SlotChange::Added => added.push(appointment),
                    SlotChange::Removed => removed.push(appointment),
                }
            }
            if added.is_empty() && removed.is_empty() {
                continue;
            }
            debug!(
                "delivering {} added / {} removed to subscription {}",
                added.len(),
                removed.len(),
                entry.key()
            );
            subscription.subscriber.deliver(&added, &removed);
        }
    }
}
