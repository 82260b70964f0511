use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info};

use crate::AppState;
use crate::error::{ApiError, QuizError};
use crate::quiz::{Leaderboard, NewScore};

const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Default, Deserialize)]
pub(super) struct LeaderboardQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    limit: Option<String>,
}

/// `GET /api/quiz/scores?type=all-time|daily|stats&limit=N`
pub(super) async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Value>, ApiError> {
    let kind = query.kind.unwrap_or_else(|| "all-time".to_string());
    let limit = query
        .limit
        .and_then(|limit| limit.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_LIMIT);
    let now = Utc::now();
    let failed = |err: QuizError| {
        error!(error = %err, "failed to retrieve leaderboard");
        ApiError::quiz("Failed to retrieve leaderboard", err)
    };

    if kind == "stats" {
        let stats = state.quiz.stats(now).await.map_err(failed)?;
        return Ok(Json(json!({ "success": true, "data": stats })));
    }
    let board = if kind == "daily" {
        Leaderboard::Daily
    } else {
        Leaderboard::AllTime
    };
    let scores = state.quiz.leaderboard(board, limit, now).await.map_err(failed)?;
    Ok(Json(json!({
        "success": true,
        "data": scores,
        "type": kind,
        "limit": limit,
    })))
}

/// `POST /api/quiz/scores` with `{score, total, name?}`.
pub(super) async fn save_score(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let failed = |err: QuizError| {
        if err.status().is_server_error() {
            error!(error = %err, "failed to save score");
        }
        ApiError::quiz("Failed to save score", err)
    };
    let body: Value = serde_json::from_slice(&body).map_err(|err| failed(QuizError::from(err)))?;
    let entry = NewScore::from_json(&body).map_err(failed)?;
    let saved = state.quiz.save(entry, Utc::now()).await.map_err(failed)?;
    info!(id = %saved.id, percentage = saved.percentage, "quiz score saved");
    Ok(Json(json!({ "success": true, "data": saved })))
}
