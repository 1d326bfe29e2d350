//! # FormHand Engine
//!
//! The coordinator's moving parts: the process-wide state store, the
//! request/response registry for Probe queries, the Injector serial link,
//! the motion planner, the typing generator, and the verify-before-proceed
//! action engine.
//!
//! Everything here is transport-agnostic at the seams: actions talk to the
//! browser through [`ProbeTransport`] and to the Injector through
//! [`CommandSink`], so the engine runs unmodified against scripted fakes in
//! tests.

pub mod actions;
pub mod link;
pub mod motion;
pub mod probe;
pub mod state;
pub mod typing;

#[cfg(test)]
pub(crate) mod testkit;

pub use actions::ActionEngine;
pub use link::{CommandSink, InjectorLink, LinkError};
pub use motion::{MotionEngine, MotionError, PathProfile};
pub use probe::{ProbeClient, ProbeTransport};
pub use state::StateStore;
