//! Shared error taxonomy for the control plane and action engine.

use thiserror::Error;

/// Failures talking to the browser Probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("DOM query {request_id} timed out after {seconds}s")]
    QueryTimeout { request_id: u64, seconds: u64 },

    #[error("Scan {request_id} timed out after {seconds}s")]
    ScanTimeout { request_id: u64, seconds: u64 },

    #[error("Probe channel closed before a response arrived")]
    ChannelClosed,
}

/// Failures of one high-level action.
///
/// Per-attempt failures feed the handler's retry budget; `Unverified` is the
/// terminal outcome that halts the sequencer.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element stayed outside the viewport: {0}")]
    OutOfView(String),

    #[error("No viewport bounds available")]
    NoViewport,

    #[error("{action} on {selector} unverified after {attempts} attempts")]
    Unverified {
        action: &'static str,
        selector: String,
        attempts: u32,
    },

    #[error("Automation already running")]
    AlreadyRunning,

    #[error("No command list parked")]
    NothingParked,

    #[error("Emergency stop engaged")]
    Stopped,

    #[error("Injector link failure: {0}")]
    Link(String),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}
