//! Client for the SNCT appointment-booking API.
//!
//! Two concerns live here:
//! - catalog discovery: the site and vehicle-type lists, normalized into the
//!   stable identifiers used as `Key` components;
//! - availability fan-out: one GET per key-space combination, bounded by a
//!   fixed permit pool, assembled into a [`model::Snapshot`] with per-key
//!   failure isolation.
//!
//! Nothing in this crate touches shared state; it produces values that the
//! dispatcher applies.

pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

pub use client::{SnctClient, SnctClientConfig};
pub use error::UpstreamError;
