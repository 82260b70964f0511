use axum::{Json, body::Bytes, extract::State};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::AppState;
use crate::error::{ApiError, RevalidateError};

/// `POST /api/revalidate` with `{"path": "...", "secret": "..."}`.
///
/// Blog reads always go to disk, so a valid request only acknowledges the path.
pub(super) async fn revalidate(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let request: Value = serde_json::from_slice(&body).map_err(|err| {
        error!(error = %err, "revalidation request unreadable");
        RevalidateError::from(err)
    })?;

    let Some(expected) = state.settings.revalidate_secret() else {
        error!("REVALIDATE_SECRET is not configured");
        return Err(RevalidateError::NotConfigured.into());
    };
    if request.get("secret").and_then(Value::as_str) != Some(expected) {
        warn!("invalid revalidation secret");
        return Err(RevalidateError::InvalidSecret.into());
    }

    let path = request
        .get("path")
        .and_then(Value::as_str)
        .filter(|path| !path.is_empty())
        .ok_or(RevalidateError::MissingPath)?;

    info!(path, "revalidated path");
    Ok(Json(json!({
        "revalidated": true,
        "path": path,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })))
}
