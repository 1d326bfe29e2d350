//! Control plane handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use formhand_engine::ProbeTransport;
use formhand_protocols::{
    Action, AutomationRequest, CursorReport, DomSnapshot, HoverReport, HoverTarget, Point,
    ScanResult,
};

use crate::state::AppState;

/// Generic acknowledgement body.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

fn ok() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message.into() })),
    )
}

/// Cursor, hover, and viewport intake.
///
/// POST /cursor-position
pub async fn cursor_position(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CursorReport>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(report)) = body else {
        return bad_request("malformed cursor report").into_response();
    };

    // Missing coordinates mean a hover-only legacy event; the store itself
    // refuses the (0,0) sentinel so a stale reading cannot corrupt state.
    if let (Some(x), Some(y)) = (report.x, report.y) {
        state.store.set_cursor(Point::new(x, y));
    }
    if report.hovered_id.is_some() || report.hovered_name.is_some() {
        state.store.set_hover(HoverTarget {
            id: report.hovered_id.clone().unwrap_or_default(),
            name: report.hovered_name.clone().unwrap_or_default(),
        });
    }
    if let Some(bounds) = report.viewport() {
        state.store.set_viewport(bounds);
    }
    ok().into_response()
}

/// Hover-only intake. Must never touch cursor position.
///
/// POST /cursor-hover
pub async fn cursor_hover(
    State(state): State<Arc<AppState>>,
    body: Result<Json<HoverReport>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(report)) = body else {
        return bad_request("malformed hover report").into_response();
    };

    state.store.set_hover(HoverTarget {
        id: report.hovered_id.unwrap_or_default(),
        name: report.hovered_name.unwrap_or_default(),
    });
    ok().into_response()
}

/// The Probe's poll for a pending DOM query. Idempotent; empty object when
/// nothing is pending.
///
/// GET /coord-request
pub async fn coord_request(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.pending_query() {
        Some(query) => Json(serde_json::json!(query)),
        None => Json(serde_json::json!({})),
    }
}

/// DOM snapshot delivery. Resolves the waiter and clears the pending slot;
/// snapshots with unknown ids are discarded.
///
/// POST /coord-response
pub async fn coord_response(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DomSnapshot>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(snapshot)) = body else {
        return bad_request("malformed DOM snapshot").into_response();
    };

    if !state.probe.resolve_query(snapshot) {
        debug!("Late DOM response discarded");
    }
    ok().into_response()
}

/// The Probe's poll for a pending scan.
///
/// GET /scan-request
pub async fn scan_request(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.pending_scan() {
        Some(scan) => Json(serde_json::json!(scan)),
        None => Json(serde_json::json!({})),
    }
}

/// Scan result delivery.
///
/// POST /scan-response
pub async fn scan_response(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ScanResult>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(result)) = body else {
        return bad_request("malformed scan result").into_response();
    };

    if !state.probe.resolve_scan(result) {
        debug!("Late scan response discarded");
    }
    ok().into_response()
}

/// Response to a parked command list.
#[derive(Debug, Serialize)]
pub struct AutomationResponse {
    pub status: &'static str,
    pub count: usize,
}

/// Park a command list for a later `/start`. Never executes, never cancels
/// a running list.
///
/// POST /automation
pub async fn automation(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AutomationRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(request)) = body else {
        return bad_request("malformed automation request").into_response();
    };

    if let (Some(x), Some(y)) = (request.cursor_x, request.cursor_y) {
        state.store.set_cursor(Point::new(x, y));
    }

    let actions = Action::parse_list(&request.commands);
    let count = actions.len();
    state.store.park_commands(actions);
    info!("Parked {} actions", count);

    Json(AutomationResponse {
        status: "parked",
        count,
    })
    .into_response()
}

/// Dispatch the parked command list.
///
/// POST /start
pub async fn start(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.engine.start() {
        Ok(count) => Json(AutomationResponse {
            status: "started",
            count,
        })
        .into_response(),
        Err(e) => {
            warn!("Start rejected: {}", e);
            bad_request(e.to_string()).into_response()
        }
    }
}

/// Diagnostic sink for DOM mutation reports.
///
/// POST /dom-change
pub async fn dom_change(body: Result<Json<serde_json::Value>, JsonRejection>) -> impl IntoResponse {
    if let Ok(Json(event)) = body {
        debug!("DOM change: {}", event);
    }
    ok()
}

/// Stores the last detected form snapshot for `/status`.
///
/// POST /form-fields
pub async fn form_fields(
    State(state): State<Arc<AppState>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(fields)) = body else {
        return bad_request("malformed form fields").into_response();
    };
    debug!("Form fields detected");
    state.store.set_last_form(fields);
    ok().into_response()
}

/// Diagnostic sink.
///
/// POST /bottom-reached
pub async fn bottom_reached() -> impl IntoResponse {
    debug!("Probe reports bottom of page");
    ok()
}

/// Coordinator status.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub cursor_x: f64,
    pub cursor_y: f64,
    pub hovered_id: String,
    pub hovered_name: String,
    pub automating: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_form: Option<serde_json::Value>,
}

/// GET /status
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cursor = state.store.cursor();
    let hover = state.store.hover();
    Json(StatusResponse {
        cursor_x: cursor.x,
        cursor_y: cursor.y,
        hovered_id: hover.id,
        hovered_name: hover.name,
        automating: state.store.automating(),
        last_form: state.store.last_form(),
    })
}

/// One target of a debug move sequence.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TestMovePoint {
    pub x: f64,
    pub y: f64,
}

/// Debug move request: absolute targets walked after an optional delay.
#[derive(Debug, Deserialize)]
pub struct TestMoveRequest {
    pub moves: Vec<TestMovePoint>,
    #[serde(default)]
    pub delay_ms: u64,
}

/// Schedule a delayed sequence of absolute moves. Debug only; runs in
/// degraded mode when no viewport bounds are known yet.
///
/// POST /test-move
pub async fn test_move(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TestMoveRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Ok(Json(request)) = body else {
        return bad_request("malformed test-move request").into_response();
    };

    let count = request.moves.len();
    let motion = state.motion.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(request.delay_ms)).await;
        for target in request.moves {
            if let Err(e) = motion
                .move_to_unclamped(Point::new(target.x, target.y), None)
                .await
            {
                warn!("Test move failed: {}", e);
                break;
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
    });

    Json(serde_json::json!({ "scheduled": count })).into_response()
}

/// Issue a scan and wait for the result.
///
/// POST /trigger-scan
pub async fn trigger_scan(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.probe.scan().await {
        Ok(result) => Json(serde_json::json!(result)).into_response(),
        Err(e) => {
            warn!("Scan failed: {}", e);
            bad_request(e.to_string()).into_response()
        }
    }
}
