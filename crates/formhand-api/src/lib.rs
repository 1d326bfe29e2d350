//! # FormHand API
//!
//! The HTTP control plane between the browser Probe and the coordinator.
//! The Probe POSTs cursor/hover/viewport reports and DOM snapshots here and
//! polls for pending queries; external clients park command lists and
//! trigger runs.
//!
//! Every handler is short and non-blocking: parse, mutate the state store
//! through its setters, reply. Malformed bodies get 400 with no side
//! effects; unknown paths 404.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
