//! Request/response correlation with the browser Probe.
//!
//! The Probe cannot accept inbound sockets, so the coordinator parks one
//! pending query at a time in the state store; the Probe polls it over HTTP
//! and POSTs the answer back. This module owns the waiter registry that
//! bridges the two sides: the action engine awaits a oneshot, the HTTP
//! response handler resolves it by request id. Timeouts lookup-remove their
//! own entry, so the registry never leaks a waiter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use formhand_protocols::{DomQuery, DomSnapshot, Point, ProbeError, ScanQuery, ScanResult};

use crate::state::StateStore;

/// DOM query deadline.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);
/// Bulk scan deadline.
pub const SCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// The action engine's view of the Probe.
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    /// Ask for a fresh DOM snapshot for one selector, optionally matching a
    /// label inside the selected container.
    async fn query(
        &self,
        selector: &str,
        label_text: Option<&str>,
    ) -> Result<DomSnapshot, ProbeError>;

    /// Ask for a bulk scan of every question on the page.
    async fn scan(&self) -> Result<ScanResult, ProbeError>;
}

/// Production [`ProbeTransport`]: parks requests in the state store and
/// awaits resolution from the HTTP handlers.
pub struct ProbeClient {
    store: Arc<StateStore>,
    request_id: AtomicU64,
    query_waiters: Mutex<HashMap<u64, oneshot::Sender<DomSnapshot>>>,
    scan_waiters: Mutex<HashMap<u64, oneshot::Sender<ScanResult>>>,
}

impl ProbeClient {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self {
            store,
            request_id: AtomicU64::new(1),
            query_waiters: Mutex::new(HashMap::new()),
            scan_waiters: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a pending DOM query. Returns false when the id is unknown
    /// (late delivery after timeout); such responses are discarded.
    pub fn resolve_query(&self, snapshot: DomSnapshot) -> bool {
        let id = snapshot.request_id;
        if let Some(bounds) = snapshot.viewport() {
            self.store.set_viewport(bounds);
        }
        self.store.clear_pending_query(id);

        let waiter = self.query_waiters.lock().remove(&id);
        match waiter {
            Some(tx) => {
                let _ = tx.send(snapshot);
                true
            }
            None => {
                debug!("Discarding DOM response with unknown id {}", id);
                false
            }
        }
    }

    /// Resolve a pending scan. Unknown ids are discarded.
    pub fn resolve_scan(&self, result: ScanResult) -> bool {
        let id = result.request_id;
        if let Some(bounds) = result.viewport() {
            self.store.set_viewport(bounds);
        }
        if let (Some(x), Some(y)) = (result.cursor_x, result.cursor_y) {
            self.store.set_cursor(Point::new(x, y));
        }
        self.store.clear_pending_scan(id);

        let waiter = self.scan_waiters.lock().remove(&id);
        match waiter {
            Some(tx) => {
                let _ = tx.send(result);
                true
            }
            None => {
                debug!("Discarding scan response with unknown id {}", id);
                false
            }
        }
    }
}

#[async_trait]
impl ProbeTransport for ProbeClient {
    async fn query(
        &self,
        selector: &str,
        label_text: Option<&str>,
    ) -> Result<DomSnapshot, ProbeError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = oneshot::channel();
        self.query_waiters.lock().insert(id, tx);

        // Parking the query overwrites any prior occupant of the slot; its
        // waiter still receives its own timeout.
        self.store.set_pending_query(DomQuery {
            request_id: id,
            selector: selector.to_string(),
            label_text: label_text.map(|s| s.to_string()),
        });
        debug!("DOM query {}: {} (label: {:?})", id, selector, label_text);

        match tokio::time::timeout(QUERY_TIMEOUT, rx).await {
            Ok(Ok(snapshot)) => Ok(snapshot),
            Ok(Err(_)) => Err(ProbeError::ChannelClosed),
            Err(_) => {
                self.query_waiters.lock().remove(&id);
                self.store.clear_pending_query(id);
                warn!("DOM query {} timed out", id);
                Err(ProbeError::QueryTimeout {
                    request_id: id,
                    seconds: QUERY_TIMEOUT.as_secs(),
                })
            }
        }
    }

    async fn scan(&self) -> Result<ScanResult, ProbeError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = oneshot::channel();
        self.scan_waiters.lock().insert(id, tx);
        self.store.set_pending_scan(ScanQuery { request_id: id });
        debug!("Scan {} requested", id);

        match tokio::time::timeout(SCAN_TIMEOUT, rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(ProbeError::ChannelClosed),
            Err(_) => {
                self.scan_waiters.lock().remove(&id);
                self.store.clear_pending_scan(id);
                warn!("Scan {} timed out", id);
                Err(ProbeError::ScanTimeout {
                    request_id: id,
                    seconds: SCAN_TIMEOUT.as_secs(),
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
