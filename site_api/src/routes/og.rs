use axum::{
    extract::Query,
    http::header,
    response::IntoResponse,
};
use tracing::error;

use crate::error::{ApiError, OgError};
use crate::og::{self, OgParams};

pub(super) async fn og_image(Query(params): Query<OgParams>) -> Result<impl IntoResponse, ApiError> {
    let params = params.normalized();
    let png = tokio::task::spawn_blocking(move || og::render_card(&params))
        .await
        .map_err(OgError::from)?
        .map_err(|err| {
            error!(error = %err, "OG image generation failed");
            err
        })?;
    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, immutable, no-transform, max-age=31536000"),
        ],
        png,
    ))
}
