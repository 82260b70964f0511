//! Error types for each route family and their HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("URL is required and must be a string")]
    MissingUrl,

    #[error("Invalid URL format or URL not allowed for security reasons")]
    InvalidUrl,

    #[error("The page took too long to respond. Please try again.")]
    Timeout,

    #[error("HTTP {status}: {reason}")]
    Blocked { status: u16, reason: String },

    #[error("HTTP {status}: {reason}")]
    Upstream { status: u16, reason: String },

    #[error("Unable to access the URL. Please check if the URL is correct and accessible.")]
    Network(#[source] reqwest::Error),

    #[error("{0}")]
    Failed(String),
}

impl ScanError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingUrl | Self::InvalidUrl | Self::Upstream { .. } | Self::Network(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Blocked { .. } => StatusCode::FORBIDDEN,
            Self::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label sent as `error`; `None` when the message is the label.
    fn label(&self) -> Option<&'static str> {
        match self {
            Self::MissingUrl | Self::InvalidUrl => None,
            Self::Timeout => Some("Timeout"),
            Self::Blocked { .. } => Some("Access blocked"),
            Self::Upstream { .. } => Some("Page not accessible"),
            Self::Network(_) => Some("Network error"),
            Self::Failed(_) => Some("Test failed"),
        }
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Network(err)
        } else {
            Self::Failed(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("OPENROUTER_API_KEY is not configured")]
    MissingApiKey,

    #[error("No articles provided for blog generation")]
    NoArticles,

    #[error("OpenRouter API error: {status} - {body}")]
    Provider { status: u16, body: String },

    #[error("No response from OpenRouter API")]
    EmptyChoices,

    #[error("Empty response from OpenRouter API")]
    EmptyContent,

    #[error("Failed to parse fact-check response as JSON")]
    UnparsableVerdict,

    #[error("Invalid fact-check result format")]
    InvalidVerdict,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Failed to save blog post {slug}: {source}")]
    Storage {
        slug: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Blog index is corrupt: {0}")]
    Index(#[from] serde_json::Error),
}

impl BlogError {
    fn label(&self) -> &'static str {
        match self {
            Self::Storage { .. } | Self::Index(_) => "Failed to save blog post",
            _ => "Blog generation failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("Invalid score or total")]
    NotNumbers,

    #[error("Score must be between 0 and total")]
    OutOfRange,

    #[error("Name must be a string")]
    InvalidName,

    #[error("Failed to read quiz scores: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to write quiz scores: {0}")]
    Write(#[source] std::io::Error),

    #[error("Quiz score file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl QuizError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotNumbers | Self::OutOfRange | Self::InvalidName => StatusCode::BAD_REQUEST,
            Self::Read(_) | Self::Write(_) | Self::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Error)]
pub enum OgError {
    #[error("invalid SVG: {0}")]
    Svg(#[from] resvg::usvg::Error),

    #[error("cannot allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum RevalidateError {
    #[error("Revalidation not configured")]
    NotConfigured,

    #[error("Invalid secret")]
    InvalidSecret,

    #[error("Path is required")]
    MissingPath,

    #[error("Revalidation failed")]
    Failed(#[from] serde_json::Error),
}

impl RevalidateError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidSecret => StatusCode::UNAUTHORIZED,
            Self::MissingPath => StatusCode::BAD_REQUEST,
            Self::NotConfigured | Self::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Blog(#[from] BlogError),

    /// `context` is the failed quiz operation, sent as `error` for 5xx.
    #[error("{source}")]
    Quiz {
        context: &'static str,
        #[source]
        source: QuizError,
    },

    #[error(transparent)]
    Og(#[from] OgError),

    #[error(transparent)]
    Revalidate(#[from] RevalidateError),
}

impl ApiError {
    pub fn quiz(context: &'static str, source: QuizError) -> Self {
        Self::Quiz { context, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response()
            }
            Self::Scan(err) => {
                let body = match err.label() {
                    Some(label) => json!({ "error": label, "message": err.to_string() }),
                    None => json!({ "error": err.to_string() }),
                };
                (err.status(), Json(body)).into_response()
            }
            Self::Blog(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": err.label(),
                    "message": err.to_string(),
                })),
            )
                .into_response(),
            Self::Quiz { context, source } => {
                let status = source.status();
                let error = if status.is_client_error() {
                    source.to_string()
                } else {
                    context.to_string()
                };
                (status, Json(json!({ "success": false, "error": error }))).into_response()
            }
            Self::Og(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to generate the image: {err}"),
            )
                .into_response(),
            Self::Revalidate(err) => {
                let body = match &err {
                    RevalidateError::Failed(cause) => {
                        json!({ "error": err.to_string(), "message": cause.to_string() })
                    }
                    _ => json!({ "error": err.to_string() }),
                };
                (err.status(), Json(body)).into_response()
            }
        }
    }
}
