use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::domain::toasts::{DEFAULT_DURATION_MS, Toast, ToastKind, ToastPosition};
use crate::infra::http::AppState;
use crate::infra::http::error::ApiError;
use crate::infra::http::models::SaveResponse;

/// `GET /api/load`: the stored collection verbatim, defaulting to the empty
/// never-saved state. Only unparseable stored bytes produce an error.
pub async fn load_toasts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let collection = state.toasts.load().await?;
    Ok(Json(collection))
}

/// `POST /api/save`: validation pipeline over the raw body, short-circuiting
/// on the first failure, then a stamped atomic replace of the store. Any
/// incoming `timestamp` field is discarded.
pub async fn save_toasts(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("No data received"));
    }

    let document: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|err| ApiError::bad_request(format!("Invalid JSON: {err}")))?;

    let entries = match document.get("toasts") {
        Some(serde_json::Value::Array(entries)) => entries,
        _ => {
            return Err(ApiError::bad_request(
                "Invalid data structure: toasts array required",
            ));
        }
    };
    let toasts: Vec<Toast> = entries.iter().map(lenient_toast).collect();

    let outcome = state.toasts.save(toasts).await?;
    Ok(Json(SaveResponse {
        success: true,
        message: "Toasts saved successfully".to_string(),
        timestamp: outcome.timestamp,
        count: outcome.count,
    }))
}

/// Field-level salvage for a single entry. A well-typed entry deserializes
/// directly; anything else keeps whichever fields do parse and defaults the
/// rest, so a `null` or non-string title still reads as an absent title and
/// validation can name the offending entry instead of the request dying on a
/// type error.
fn lenient_toast(entry: &serde_json::Value) -> Toast {
    match Toast::deserialize(entry) {
        Ok(toast) => toast,
        Err(_) => Toast {
            id: text_field(entry, "id"),
            title: text_field(entry, "title"),
            message: text_field(entry, "message"),
            kind: entry
                .get("type")
                .and_then(|value| ToastKind::deserialize(value).ok())
                .unwrap_or_default(),
            position: entry
                .get("position")
                .and_then(|value| ToastPosition::deserialize(value).ok())
                .unwrap_or_default(),
            duration: entry
                .get("duration")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(DEFAULT_DURATION_MS),
            auto_hide: entry
                .get("autoHide")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(true),
        },
    }
}

fn text_field(entry: &serde_json::Value, key: &str) -> String {
    entry
        .get(key)
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Capability pre-flight: always succeeds, no body processing.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}
