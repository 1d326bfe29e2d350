//! Application state shared across handlers.

use std::sync::Arc;

use formhand_engine::{ActionEngine, MotionEngine, ProbeClient, StateStore};

/// Everything the handlers reach for: the state store, the Probe
/// request/response client, the action engine, and a motion handle for the
/// debug move path.
pub struct AppState {
    pub store: Arc<StateStore>,
    pub probe: Arc<ProbeClient>,
    pub engine: Arc<ActionEngine>,
    pub motion: Arc<MotionEngine>,
}

impl AppState {
    pub fn new(
        store: Arc<StateStore>,
        probe: Arc<ProbeClient>,
        engine: Arc<ActionEngine>,
        motion: Arc<MotionEngine>,
    ) -> Self {
        Self {
            store,
            probe,
            engine,
            motion,
        }
    }
}
