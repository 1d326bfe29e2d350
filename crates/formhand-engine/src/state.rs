//! Process-wide shared state.
//!
//! One owned structure behind a mutex, mutated only through narrow setters.
//! Critical sections are field-granular; nothing is held across an await.

use parking_lot::Mutex;

use formhand_protocols::{Action, DomQuery, HoverTarget, Point, ScanQuery, ViewportBounds};

#[derive(Default)]
struct Inner {
    cursor: Point,
    cursor_valid: bool,
    hover: HoverTarget,
    viewport: Option<ViewportBounds>,
    pending_query: Option<DomQuery>,
    pending_scan: Option<ScanQuery>,
    automating: bool,
    parked: Option<Vec<Action>>,
    last_form: Option<serde_json::Value>,
}

/// Shared coordinator state: cursor, hover, viewport, pending slots, and the
/// parked command list.
#[derive(Default)]
pub struct StateStore {
    inner: Mutex<Inner>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the cursor position.
    ///
    /// `(0,0)` is the sentinel legacy hover events carry and never
    /// overwrites a previously valid reading.
    pub fn set_cursor(&self, p: Point) {
        let mut inner = self.inner.lock();
        if p.x == 0.0 && p.y == 0.0 && inner.cursor_valid {
            return;
        }
        inner.cursor = p;
        inner.cursor_valid = true;
    }

    pub fn cursor(&self) -> Point {
        self.inner.lock().cursor
    }

    /// Update the hover target. Never touches cursor position.
    pub fn set_hover(&self, hover: HoverTarget) {
        self.inner.lock().hover = hover;
    }

    pub fn hover(&self) -> HoverTarget {
        self.inner.lock().hover.clone()
    }

    pub fn set_viewport(&self, bounds: ViewportBounds) {
        self.inner.lock().viewport = Some(bounds);
    }

    pub fn viewport(&self) -> Option<ViewportBounds> {
        self.inner.lock().viewport
    }

    pub fn set_pending_query(&self, query: DomQuery) {
        self.inner.lock().pending_query = Some(query);
    }

    /// Clear the pending query slot if it still holds `request_id`.
    ///
    /// A newer query may have overwritten the slot; its owner clears it.
    pub fn clear_pending_query(&self, request_id: u64) {
        let mut inner = self.inner.lock();
        if inner
            .pending_query
            .as_ref()
            .is_some_and(|q| q.request_id == request_id)
        {
            inner.pending_query = None;
        }
    }

    pub fn pending_query(&self) -> Option<DomQuery> {
        self.inner.lock().pending_query.clone()
    }

    pub fn set_pending_scan(&self, scan: ScanQuery) {
        self.inner.lock().pending_scan = Some(scan);
    }

    pub fn clear_pending_scan(&self, request_id: u64) {
        let mut inner = self.inner.lock();
        if inner
            .pending_scan
            .as_ref()
            .is_some_and(|s| s.request_id == request_id)
        {
            inner.pending_scan = None;
        }
    }

    pub fn pending_scan(&self) -> Option<ScanQuery> {
        self.inner.lock().pending_scan.clone()
    }

    /// Atomically claim the automating flag. Returns false when a run is
    /// already in progress.
    pub fn try_begin_automation(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.automating {
            false
        } else {
            inner.automating = true;
            true
        }
    }

    pub fn end_automation(&self) {
        self.inner.lock().automating = false;
    }

    pub fn automating(&self) -> bool {
        self.inner.lock().automating
    }

    /// Park a command list for a later `/start`. Overwrites any previously
    /// parked list; never cancels a running one.
    pub fn park_commands(&self, actions: Vec<Action>) {
        self.inner.lock().parked = Some(actions);
    }

    pub fn take_parked_commands(&self) -> Option<Vec<Action>> {
        self.inner.lock().parked.take()
    }

    pub fn has_parked_commands(&self) -> bool {
        self.inner.lock().parked.is_some()
    }

    /// Store the last form snapshot reported by the Probe (diagnostic).
    pub fn set_last_form(&self, form: serde_json::Value) {
        self.inner.lock().last_form = Some(form);
    }

    pub fn last_form(&self) -> Option<serde_json::Value> {
        self.inner.lock().last_form.clone()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
