//! HTTP routes of the WCAG reference site: the static accessibility scanner,
//! the cron blog pipeline, Open Graph cards, quiz leaderboards and health.
//!
//! ```no_run
//! use wcag_site_api::{AppState, Settings, routes};
//!
//! # async fn serve() -> anyhow::Result<()> {
//! let settings = Settings::load_with_dotenv()?;
//! let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
//! let app = routes::router(AppState::new(settings)?);
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod blog;
pub mod config;
pub mod error;
pub mod og;
pub mod quiz;
pub mod routes;
pub mod scanner;

use std::sync::Arc;

pub use config::Settings;
pub use error::ApiError;

use blog::BlogStore;
use quiz::QuizStore;

/// Shared handler state; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub http: reqwest::Client,
    /// Client for user-supplied scan targets; refuses redirects into
    /// private address space.
    pub scan_http: reqwest::Client,
    pub blog: Arc<BlogStore>,
    pub quiz: Arc<QuizStore>,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().build()?;
        Self::with_client(settings, http)
    }

    pub fn with_client(settings: Settings, http: reqwest::Client) -> Result<Self, reqwest::Error> {
        let scan_http = scanner::client()?;
        let blog = BlogStore::new(settings.blog_dir());
        let quiz = QuizStore::new(settings.quiz_scores_path(), settings.quiz_max_scores);
        Ok(Self {
            settings: Arc::new(settings),
            http,
            scan_http,
            blog: Arc::new(blog),
            quiz: Arc::new(quiz),
        })
    }
}
