//! HTTP and WebSocket transport.
//!
//! This crate terminates connections and parses requests; everything it
//! learns is handed to the [`dispatcher::Dispatcher`] as already-decoded
//! values, and every reply or push is transmitted verbatim.
//!
//! Routes:
//! - `GET /appointments/{user_type}/{control_type}/{vehicle_type}/{organism}/{site}/{start_date}/{end_date}`
//!   - stored slots for one category and date window
//! - `GET /sites` - current organism/site enumeration
//! - `GET /vehicles` - current vehicle-type enumeration
//! - `GET /appointments/ws` - subscribe stream (one criteria array per
//!   message, pushes per refresh cycle)
//! - `GET /health` - readiness and counters

pub mod api;
pub mod protocol;
pub mod ws_server;

pub use api::{create_router, AppState};
pub use protocol::{ErrorReply, SlotPush};
