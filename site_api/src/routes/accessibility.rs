use axum::{Json, body::Bytes, extract::State};
use serde_json::Value;
use tracing::error;
use wcag_core::accessibility::StaticReport;

use crate::error::{ApiError, ScanError};
use crate::{AppState, scanner};

/// `POST /api/tools/accessibility-test` with `{"url": "..."}`.
pub(super) async fn accessibility_test(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<StaticReport>, ApiError> {
    let request: Value = serde_json::from_slice(&body).map_err(|err| ScanError::Failed(err.to_string()))?;
    let url = request
        .get("url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .ok_or(ScanError::MissingUrl)?;
    match scanner::scan(&state.scan_http, url, state.settings.scan_timeout()).await {
        Ok(report) => Ok(Json(report)),
        Err(err) => {
            error!(url, error = %err, "accessibility test failed");
            Err(err.into())
        }
    }
}
