use axum::{Json, extract::State};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

use crate::AppState;

pub(super) async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "service": "TheWCAG.com",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.settings.environment,
    }))
}
