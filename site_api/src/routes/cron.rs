use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
};
use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::blog::{self, FeedExtractor, HttpRevalidator, OpenRouterWriter};
use crate::error::ApiError;
use crate::AppState;

const VERCEL_CRON_AGENT: &str = "vercel-cron/1.0";
const CRON_SECRET_HEADER: &str = "x-vercel-cron-secret";

fn header_str<'a>(headers: &'a HeaderMap, name: impl header::AsHeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Rejects only a request that presents a wrong bearer token, has no matching
/// cron secret header, and does not come from the scheduler's user agent.
/// Without a configured secret everything is allowed.
pub fn cron_authorized(headers: &HeaderMap, secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return true;
    };
    let Some(authorization) = header_str(headers, header::AUTHORIZATION) else {
        return true;
    };
    if authorization == format!("Bearer {secret}") {
        return true;
    }
    if header_str(headers, CRON_SECRET_HEADER) == Some(secret) {
        return true;
    }
    header_str(headers, header::USER_AGENT) == Some(VERCEL_CRON_AGENT)
}

pub(super) async fn generate_blog(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    if !cron_authorized(&headers, state.settings.cron_secret()) {
        warn!("invalid cron secret");
        return Err(ApiError::Unauthorized);
    }
    if header_str(&headers, header::USER_AGENT) == Some(VERCEL_CRON_AGENT) {
        info!("received scheduled cron request");
    }

    let source = FeedExtractor::from_settings(&state.http, &state.settings);
    let writer = OpenRouterWriter::from_settings(&state.http, &state.settings);
    let revalidator = HttpRevalidator::from_settings(&state.http, &state.settings);
    let outcome = blog::run(
        &source,
        &writer,
        &state.blog,
        &revalidator,
        state.settings.blog_auto_publish,
        Utc::now(),
    )
    .await
    .map_err(|err| {
        error!(error = %err, "blog generation process failed");
        ApiError::from(err)
    })?;
    Ok(Json(outcome.to_json()))
}
