//! Shared vocabulary for the appointment-slot watcher.
//!
//! Every other crate speaks in these types:
//! - [`Key`]: one (user type, control type, vehicle type, organism, site)
//!   category out of the finite combinatorial space.
//! - [`Catalog`]: the enumerations currently known from the provider, used
//!   both to span the key space and to validate client input.
//! - [`Snapshot`] / [`SlotSet`]: one refresh cycle's fetch result per key.
//! - [`Criterion`]: a subscriber's exact-match key filter plus time window.
//! - [`SlotEvent`] / [`Appointment`]: what the diff engine emits and what
//!   subscribers receive.

pub mod catalog;
pub mod criterion;
pub mod error;
pub mod event;
pub mod key;
pub mod snapshot;

pub use catalog::Catalog;
pub use criterion::{parse_date, parse_timestamp, Criterion, CriterionSpec};
pub use error::ValidationError;
pub use event::{Appointment, SlotChange, SlotEvent};
pub use key::{ControlType, Key, Organism, UserType};
pub use snapshot::{SlotSet, Snapshot};
