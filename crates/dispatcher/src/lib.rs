//! Diff/fan-out engine.
//!
//! The [`Dispatcher`] owns the only shared mutable state in the process: the
//! current snapshot, the provider catalog, and the subscription registry.
//! Everything else talks to it through its methods:
//!
//! ```text
//! RefreshService (60s timer, never overlapping)
//!         |
//!   upstream::SnctClient -> Snapshot
//!         |
//!   Dispatcher::update   -> per-key added/removed diff
//!         |
//!   SubscriptionRegistry -> one merged push per subscription per cycle
//! ```

pub mod dispatcher;
pub mod registry;
pub mod service;
mod store;

pub use dispatcher::Dispatcher;
pub use registry::{Subscriber, SubscriptionId, SubscriptionRegistry};
pub use service::{RefreshConfig, RefreshService};
