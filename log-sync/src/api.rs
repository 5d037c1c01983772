use crate::batch;
use crate::entry::{LogEntry, NormalizedRow};
use crate::errors::RelayError;
use crate::metrics_defs::{APPEND_DURATION, ENTRIES_RECEIVED, REQUEST_ERRORS, ROWS_APPENDED};
use crate::sheets::{AppendResult, SheetAppender, SheetsError};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub const LIVENESS_MESSAGE: &str = "Attendance log relay for Google Sheets is running.";

const LOG_META: &str = "log_meta";
const SYNC_HISTORY: &str = "sync_history";

#[derive(Clone)]
pub struct AppState {
    sheets: Arc<dyn SheetAppender>,
}

impl AppState {
    pub fn new(sheets: Arc<dyn SheetAppender>) -> Self {
        AppState { sheets }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/log_meta", post(log_meta))
        .route("/sync_history", post(sync_history))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize, Debug)]
struct ApiResponse {
    success: bool,
    message: String,
}

impl ApiResponse {
    fn ok(message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

async fn index() -> &'static str {
    LIVENESS_MESSAGE
}

/// Appends a single `{name, id, timestamp}` entry.
async fn log_meta(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<ApiResponse, RelayError> {
    shared::counter!(ENTRIES_RECEIVED, "route" => LOG_META).increment(1);
    append_entry(state.sheets.as_ref(), &body)
        .await
        .inspect_err(|e| record_error(LOG_META, e))
}

/// Appends every valid entry of a JSON list in one call.
async fn sync_history(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<ApiResponse, RelayError> {
    // An absent or non-JSON body is reported like any other non-list payload.
    let payload = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    let submitted = payload.as_array().map_or(0, Vec::len);
    shared::counter!(ENTRIES_RECEIVED, "route" => SYNC_HISTORY).increment(submitted as u64);

    append_batch(state.sheets.as_ref(), &payload)
        .await
        .inspect_err(|e| record_error(SYNC_HISTORY, e))
}

async fn append_entry(sheets: &dyn SheetAppender, body: &[u8]) -> Result<ApiResponse, RelayError> {
    sheets.connect().await.map_err(RelayError::SheetsUnavailable)?;

    let entry = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| LogEntry::from_value(&value).ok())
        .ok_or(RelayError::MissingFields)?;

    let result = append(sheets, &[entry.into_row()], LOG_META)
        .await
        .map_err(RelayError::AppendFailed)?;

    tracing::info!(
        updated_cells = result.updated_cells,
        "Appended {} cells via /log_meta",
        result.updated_cells
    );
    Ok(ApiResponse::ok("Data logged to Google Sheet"))
}

async fn append_batch(sheets: &dyn SheetAppender, payload: &Value) -> Result<ApiResponse, RelayError> {
    sheets.connect().await.map_err(RelayError::SheetsUnavailable)?;

    let batch = batch::assemble(payload).map_err(RelayError::InvalidBatch)?;
    if batch.rows.is_empty() {
        tracing::info!(skipped = batch.skipped.len(), "No valid entries to sync");
        return Ok(ApiResponse::ok("No valid entries to sync"));
    }

    let result = append(sheets, &batch.rows, SYNC_HISTORY)
        .await
        .map_err(RelayError::BulkAppendFailed)?;

    tracing::info!(
        updated_cells = result.updated_cells,
        rows = batch.rows.len(),
        skipped = batch.skipped.len(),
        "Appended {} cells via /sync_history",
        result.updated_cells
    );
    Ok(ApiResponse::ok(format!(
        "{} entries synced to Google Sheet",
        batch.rows.len()
    )))
}

fn record_error(route: &'static str, err: &RelayError) {
    shared::counter!(REQUEST_ERRORS, "route" => route, "reason" => err.reason()).increment(1);
}

async fn append(
    sheets: &dyn SheetAppender,
    rows: &[NormalizedRow],
    route: &'static str,
) -> Result<AppendResult, SheetsError> {
    let start = Instant::now();
    let result = sheets.append(rows).await;
    shared::histogram!(APPEND_DURATION, "route" => route).record(start.elapsed().as_secs_f64());

    if result.is_ok() {
        shared::counter!(ROWS_APPENDED, "route" => route).increment(rows.len() as u64);
    }
    result
}
