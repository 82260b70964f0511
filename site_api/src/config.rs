//! Layered settings: built-in defaults, then `.env`, then the process
//! environment.
//!
//! Keys are the plain environment variable names (`DATA_DIR`, `CRON_SECRET`,
//! ...), matched case-insensitively onto the lowercase fields of [`Settings`].

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variables read into [`Settings`].
pub const ENV_KEYS: &[&str] = &[
    "BIND_ADDR",
    "DATA_DIR",
    "BASE_URL",
    "CRON_SECRET",
    "REVALIDATE_SECRET",
    "BLOG_AUTO_PUBLISH",
    "OPENROUTER_API_KEY",
    "OPENROUTER_BLOG_MODEL",
    "OPENROUTER_FACT_CHECK_MODEL",
    "OPENROUTER_BASE_URL",
    "NEWS_API_KEY",
    "RSS_FEEDS",
    "SCAN_TIMEOUT_MS",
    "QUIZ_MAX_SCORES",
    "ENVIRONMENT",
];

const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bind_addr: String,
    /// Holds `blog/` and `quiz-scores.json`.
    pub data_dir: PathBuf,
    /// Site root used for cache revalidation calls.
    pub base_url: String,
    #[serde(default)]
    pub cron_secret: Option<String>,
    #[serde(default)]
    pub revalidate_secret: Option<String>,
    pub blog_auto_publish: bool,
    #[serde(default)]
    pub openrouter_api_key: Option<String>,
    pub openrouter_blog_model: String,
    pub openrouter_fact_check_model: String,
    pub openrouter_base_url: String,
    #[serde(default)]
    pub news_api_key: Option<String>,
    /// Comma separated feed URLs replacing the built-in list.
    #[serde(default)]
    pub rss_feeds: Option<String>,
    pub scan_timeout_ms: u64,
    pub quiz_max_scores: usize,
    pub environment: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            data_dir: PathBuf::from("data"),
            base_url: "http://localhost:3000".into(),
            cron_secret: None,
            revalidate_secret: None,
            blog_auto_publish: false,
            openrouter_api_key: None,
            openrouter_blog_model: DEFAULT_MODEL.into(),
            openrouter_fact_check_model: DEFAULT_MODEL.into(),
            openrouter_base_url: "https://openrouter.ai/api/v1".into(),
            news_api_key: None,
            rss_feeds: None,
            scan_timeout_ms: 25_000,
            quiz_max_scores: 1000,
            environment: "development".into(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Settings {
    /// Loads `.env` when present, then extracts from the environment.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load()
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(Env::raw().only(ENV_KEYS))
    }

    pub fn cron_secret(&self) -> Option<&str> {
        non_empty(&self.cron_secret)
    }

    pub fn revalidate_secret(&self) -> Option<&str> {
        non_empty(&self.revalidate_secret)
    }

    pub fn openrouter_api_key(&self) -> Option<&str> {
        non_empty(&self.openrouter_api_key)
    }

    pub fn news_api_key(&self) -> Option<&str> {
        non_empty(&self.news_api_key)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }

    pub fn blog_dir(&self) -> PathBuf {
        self.data_dir.join("blog")
    }

    pub fn quiz_scores_path(&self) -> PathBuf {
        self.data_dir.join("quiz-scores.json")
    }
}
