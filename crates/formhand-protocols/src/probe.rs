//! The browser Probe's HTTP wire contract.
//!
//! The Probe runs inside a browser tab and cannot accept inbound sockets, so
//! it polls `/coord-request` and `/scan-request` for work and POSTs results
//! back. All bodies are UTF-8 JSON. Fields the Probe may omit carry serde
//! defaults so partial reports still parse.

use serde::{Deserialize, Serialize};

use crate::types::ViewportBounds;

/// Cursor/hover/viewport report posted to `/cursor-position`.
///
/// Coordinates are optional: legacy hover-only events carry zeros (or nothing
/// at all) and must not overwrite a previously valid cursor reading.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CursorReport {
    pub x: Option<f64>,
    pub y: Option<f64>,
    #[serde(default)]
    pub hovered_id: Option<String>,
    #[serde(default)]
    pub hovered_name: Option<String>,
    #[serde(default)]
    pub vp_left: Option<f64>,
    #[serde(default)]
    pub vp_top: Option<f64>,
    #[serde(default)]
    pub vp_right: Option<f64>,
    #[serde(default)]
    pub vp_bottom: Option<f64>,
}

impl CursorReport {
    /// Viewport bounds, when all four edges are present.
    pub fn viewport(&self) -> Option<ViewportBounds> {
        match (self.vp_left, self.vp_top, self.vp_right, self.vp_bottom) {
            (Some(l), Some(t), Some(r), Some(b)) => Some(ViewportBounds::new(l, t, r, b)),
            _ => None,
        }
    }
}

/// Hover-only report posted to `/cursor-hover`. Never carries coordinates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HoverReport {
    #[serde(default)]
    pub hovered_id: Option<String>,
    #[serde(default)]
    pub hovered_name: Option<String>,
}

/// One pending DOM query, served to the Probe via `GET /coord-request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomQuery {
    pub request_id: u64,
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_text: Option<String>,
}

/// The Probe's answer to a [`DomQuery`], posted to `/coord-response`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomSnapshot {
    pub request_id: u64,
    #[serde(default)]
    pub found: bool,
    /// Absolute-screen center of the click target (the associated label for
    /// radio/checkbox inputs when one exists, otherwise the element itself).
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// The Probe's live cursor reading at response time.
    #[serde(default)]
    pub cursor_x: f64,
    #[serde(default)]
    pub cursor_y: f64,
    #[serde(default)]
    pub value: String,
    /// Tri-state: `Some(_)` for checkable inputs, `None` for everything else.
    #[serde(default)]
    pub checked: Option<bool>,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub input_type: String,
    #[serde(default)]
    pub in_viewport: bool,
    #[serde(default)]
    pub viewport_top: f64,
    #[serde(default)]
    pub viewport_h: f64,
    /// Scroll distance to center the element; positive scrolls down.
    #[serde(default)]
    pub scroll_delta_needed: f64,
    /// Text of the label currently under the cursor (label queries only).
    #[serde(default)]
    pub hovered_label_text: Option<String>,
    #[serde(default)]
    pub vp_left: Option<f64>,
    #[serde(default)]
    pub vp_top: Option<f64>,
    #[serde(default)]
    pub vp_right: Option<f64>,
    #[serde(default)]
    pub vp_bottom: Option<f64>,
}

impl DomSnapshot {
    /// Viewport bounds, when all four edges are present.
    pub fn viewport(&self) -> Option<ViewportBounds> {
        match (self.vp_left, self.vp_top, self.vp_right, self.vp_bottom) {
            (Some(l), Some(t), Some(r), Some(b)) => Some(ViewportBounds::new(l, t, r, b)),
            _ => None,
        }
    }
}

/// One pending bulk scan, served via `GET /scan-request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanQuery {
    pub request_id: u64,
}

/// Question type as classified by the Probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Radio,
    Checkbox,
    Textarea,
}

/// One question descriptor in a scan result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub uuid: String,
    pub selector: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub in_viewport: bool,
    #[serde(default)]
    pub checked_label: Option<String>,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub viewport_top: f64,
}

/// Full scan result posted to `/scan-response`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    pub request_id: u64,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub visible: usize,
    #[serde(default)]
    pub vp_left: Option<f64>,
    #[serde(default)]
    pub vp_top: Option<f64>,
    #[serde(default)]
    pub vp_right: Option<f64>,
    #[serde(default)]
    pub vp_bottom: Option<f64>,
    #[serde(default)]
    pub cursor_x: Option<f64>,
    #[serde(default)]
    pub cursor_y: Option<f64>,
}

impl ScanResult {
    /// Viewport bounds, when all four edges are present.
    pub fn viewport(&self) -> Option<ViewportBounds> {
        match (self.vp_left, self.vp_top, self.vp_right, self.vp_bottom) {
            (Some(l), Some(t), Some(r), Some(b)) => Some(ViewportBounds::new(l, t, r, b)),
            _ => None,
        }
    }
}

/// Command list submission posted to `/automation`.
///
/// The legacy client spells the cursor hint in camelCase; both spellings are
/// accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutomationRequest {
    pub commands: Vec<String>,
    #[serde(default, alias = "cursorX")]
    pub cursor_x: Option<f64>,
    #[serde(default, alias = "cursorY")]
    pub cursor_y: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_report_viewport_requires_all_edges() {
        let report: CursorReport =
            serde_json::from_str(r#"{"x": 10.0, "y": 20.0, "vp_left": 0.0}"#).unwrap();
        assert!(report.viewport().is_none());

        let report: CursorReport = serde_json::from_str(
            r#"{"x": 10.0, "y": 20.0, "vp_left": 0.0, "vp_top": 40.0, "vp_right": 1280.0, "vp_bottom": 840.0}"#,
        )
        .unwrap();
        let vp = report.viewport().unwrap();
        assert_eq!(vp.top, 40.0);
        assert_eq!(vp.right, 1280.0);
    }

    #[test]
    fn test_hover_report_has_no_coordinates() {
        let report: HoverReport =
            serde_json::from_str(r#"{"hovered_id": "q1", "hovered_name": "choice"}"#).unwrap();
        assert_eq!(report.hovered_id.as_deref(), Some("q1"));
    }

    #[test]
    fn test_dom_query_omits_absent_label() {
        let q = DomQuery {
            request_id: 7,
            selector: "#field".to_string(),
            label_text: None,
        };
        let json = serde_json::to_string(&q).unwrap();
        assert!(!json.contains("label_text"));
    }

    #[test]
    fn test_dom_snapshot_partial_body_parses() {
        let snap: DomSnapshot =
            serde_json::from_str(r#"{"request_id": 3, "found": false}"#).unwrap();
        assert!(!snap.found);
        assert_eq!(snap.value, "");
        assert!(snap.checked.is_none());
        assert!(snap.viewport().is_none());
    }

    #[test]
    fn test_dom_snapshot_checked_tristate() {
        let snap: DomSnapshot =
            serde_json::from_str(r#"{"request_id": 1, "found": true, "checked": false}"#).unwrap();
        assert_eq!(snap.checked, Some(false));
    }

    #[test]
    fn test_question_kind_lowercase() {
        let q: Question = serde_json::from_str(
            r##"{"uuid": "u1", "selector": "#q", "label": "Rating", "type": "radio"}"##,
        )
        .unwrap();
        assert_eq!(q.kind, QuestionKind::Radio);
    }

    #[test]
    fn test_automation_request_accepts_camel_case_hint() {
        let req: AutomationRequest =
            serde_json::from_str(r#"{"commands": ["CLICK"], "cursorX": 12.0, "cursorY": 0.0}"#)
                .unwrap();
        assert_eq!(req.cursor_x, Some(12.0));
        assert_eq!(req.cursor_y, Some(0.0));

        let req: AutomationRequest =
            serde_json::from_str(r#"{"commands": [], "cursor_x": 5.0}"#).unwrap();
        assert_eq!(req.cursor_x, Some(5.0));
    }
}
