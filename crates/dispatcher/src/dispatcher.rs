//! The dispatcher: sole owner of the catalog, the snapshot and the
//! subscription registry.

use crate::registry::{Subscriber, SubscriptionId, SubscriptionRegistry};
use crate::store::SnapshotStore;
use chrono::NaiveDateTime;
use metrics::{counter, gauge};
use model::{
    parse_date, Catalog, Criterion, CriterionSpec, Organism, Snapshot, ValidationError,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

/// Owns all shared mutable state and exposes the only mutation paths.
///
/// The store lock is synchronous and never held across an await point: one
/// `update` computes every per-key diff under the lock, releases it, and
/// only then fans the batch out. Two mutations can therefore never
/// interleave, whatever the runtime does.
pub struct Dispatcher {
    catalog: RwLock<Catalog>,
    store: Mutex<SnapshotStore>,
    registry: SubscriptionRegistry,
    /// Set once the first availability refresh has been applied.
    ready: AtomicBool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(Catalog::default()),
            store: Mutex::new(SnapshotStore::new()),
            registry: SubscriptionRegistry::new(),
            ready: AtomicBool::new(false),
        }
    }

    /// Install a freshly discovered catalog, replacing the previous one.
    pub fn set_catalog(&self, catalog: Catalog) {
        *self.catalog.write().unwrap() = catalog;
    }

    /// Clone of the current catalog, for the fetcher.
    pub fn catalog(&self) -> Catalog {
        self.catalog.read().unwrap().clone()
    }

    pub fn has_catalog(&self) -> bool {
        self.catalog.read().unwrap().is_complete()
    }

    /// Whether the first refresh cycle has completed.
    pub fn ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    /// Apply one refresh result: diff every key against the stored state,
    /// then fan the accumulated batch out once.
    pub fn update(&self, snapshot: Snapshot) {
        let events = {
            let mut store = self.store.lock().unwrap();
            let events = store.apply(snapshot);
            gauge!("dispatcher_stored_keys").set(store.key_count() as f64);
            gauge!("dispatcher_stored_slots").set(store.slot_count() as f64);
            events
        };
        self.ready.store(true, Ordering::Relaxed);

        if events.is_empty() {
            debug!("refresh cycle produced no changes");
            return;
        }
        counter!("dispatcher_events_total").increment(events.len() as u64);
        info!(
            "fanning out {} events to {} subscriptions",
            events.len(),
            self.registry.len()
        );
        self.registry.fan_out(&events);
    }

    /// Validate and install a subscription's criteria, then deliver the
    /// initial push: everything currently stored that matches, reported as
    /// `added`. The first invalid criterion fails the whole call and leaves
    /// any previous subscription for `id` untouched.
    pub fn register(
        &self,
        id: SubscriptionId,
        specs: &[CriterionSpec],
        subscriber: Arc<dyn Subscriber>,
    ) -> Result<(), ValidationError> {
        let criteria: Vec<Criterion> = {
            let catalog = self.catalog.read().unwrap();
            specs
                .iter()
                .map(|spec| spec.validate(&catalog))
                .collect::<Result<_, _>>()?
        };

        // Compute the initial view and install the subscription under the
        // store lock so no refresh cycle can slip in between.
        let initial = {
            let store = self.store.lock().unwrap();
            let initial = store.matching(&criteria);
            self.registry.insert(id, criteria, Arc::clone(&subscriber));
            initial
        };

        info!(
            "subscription {id} registered with {} criteria, initial push of {} slots",
            specs.len(),
            initial.len()
        );
        counter!("dispatcher_registrations_total").increment(1);
        subscriber.deliver(&initial, &[]);
        Ok(())
    }

    /// Remove a subscription. Safe to call any number of times.
    pub fn unregister(&self, id: SubscriptionId) {
        if self.registry.remove(&id) {
            info!("subscription {id} unregistered");
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    /// Stored slots for one validated key within `[start_date, end_date)`
    /// (end date exclusive, as the REST contract documents).
    #[allow(clippy::too_many_arguments)]
    pub fn query(
        &self,
        user_type: &str,
        control_type: &str,
        vehicle_type: &str,
        organism: &str,
        site: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<NaiveDateTime>, ValidationError> {
        let key = self.catalog.read().unwrap().validate_key(
            user_type,
            control_type,
            vehicle_type,
            organism,
            site,
        )?;
        let start = parse_date("start_date", start_date)?;
        let end = parse_date("end_date", end_date)?;
        if start > end {
            return Err(ValidationError::InvertedRange);
        }

        let store = self.store.lock().unwrap();
        Ok(store
            .slots_for(&key)
            .map(|slots| {
                slots
                    .iter()
                    .filter(|slot| {
                        let date = slot.date();
                        start <= date && date < end
                    })
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Current site enumeration, grouped by organism.
    pub fn sites(&self) -> BTreeMap<Organism, Vec<String>> {
        self.catalog.read().unwrap().sites_by_organism()
    }

    /// Current vehicle-type enumeration.
    pub fn vehicle_types(&self) -> Vec<String> {
        self.catalog.read().unwrap().vehicle_types()
    }

    /// (stored key count, stored slot count), for the health endpoint.
    pub fn store_stats(&self) -> (usize, usize) {
        let store = self.store.lock().unwrap();
        (store.key_count(), store.slot_count())
    }
}
