//! Article extraction from RSS feeds and NewsAPI.

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::{Client, header::USER_AGENT};
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, info, warn};
use wcag_core::convert::markdown::html_to_text;

use super::sources::{self, FeedSource};
use super::{ArticleSource, ExtractedArticle};
use crate::config::Settings;
use crate::error::BlogError;

pub const FETCH_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; TheWCAG Blog Generator/1.0; +https://thewcag.com)";
const NEWS_API_URL: &str = "https://newsapi.org/v2/everything";
const WINDOW_HOURS: i64 = 48;
const MIN_CONTENT_CHARS: usize = 100;
const MAX_ARTICLES: usize = 7;
const EXCERPT_CHARS: usize = 200;

pub fn within_window(published: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let age = now - published;
    age >= Duration::zero() && age <= Duration::hours(WINDOW_HOURS)
}

/// RFC 2822 (RSS `pubDate`) or RFC 3339.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    DateTime::parse_from_rfc2822(input)
        .or_else(|_| DateTime::parse_from_rfc3339(input))
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

fn content_selectors() -> &'static [Selector] {
    static SELECTORS: OnceLock<Vec<Selector>> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        ["article", "main", "[role=\"main\"]", "body"]
            .iter()
            .map(|css| Selector::parse(css).unwrap())
            .collect()
    })
}

/// Plain text of the most specific content region (`article`, then `main`,
/// then the body).
pub fn main_content(html: &str) -> String {
    let document = Html::parse_document(html);
    let region = content_selectors()
        .iter()
        .find_map(|selector| document.select(selector).next())
        .map(|element| element.html())
        .unwrap_or_default();
    html_to_text(&region).trim().to_string()
}

/// Collapses whitespace and cuts at the last word boundary before `max`
/// characters.
pub fn excerpt(content: &str, max: usize) -> String {
    let cleaned = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.chars().count() <= max {
        return cleaned;
    }
    let truncated: String = cleaned.chars().take(max).collect();
    match truncated.rfind(' ') {
        Some(space) if space > 0 => format!("{}...", &truncated[..space]),
        _ => format!("{truncated}..."),
    }
}

/// Drops repeated URLs (case-insensitive), then keeps the newest
/// [`MAX_ARTICLES`].
pub fn dedupe_and_rank(articles: Vec<ExtractedArticle>) -> Vec<ExtractedArticle> {
    let mut seen = HashSet::new();
    let mut unique: Vec<ExtractedArticle> = articles
        .into_iter()
        .filter(|article| seen.insert(article.url.trim().to_lowercase()))
        .collect();
    unique.sort_by(|a, b| b.published_date.cmp(&a.published_date));
    unique.truncate(MAX_ARTICLES);
    unique
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsArticle {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
    source: Option<NewsSource>,
}

#[derive(Debug, Deserialize)]
struct NewsSource {
    name: Option<String>,
}

pub struct FeedExtractor {
    client: Client,
    feeds: Vec<FeedSource>,
    news_api_key: Option<String>,
    news_api_url: String,
}

impl FeedExtractor {
    pub fn new(client: Client, feeds: Vec<FeedSource>, news_api_key: Option<String>) -> Self {
        Self {
            client,
            feeds,
            news_api_key,
            news_api_url: NEWS_API_URL.to_string(),
        }
    }

    pub fn from_settings(client: &Client, settings: &Settings) -> Self {
        Self::new(
            client.clone(),
            sources::feeds(settings.rss_feeds.as_deref()),
            settings.news_api_key().map(str::to_string),
        )
    }

    pub fn with_news_api_url(mut self, url: impl Into<String>) -> Self {
        self.news_api_url = url.into();
        self
    }

    async fn fetch_html(&self, url: &str) -> Option<String> {
        let result = async {
            self.client
                .get(url)
                .header(USER_AGENT, FETCH_USER_AGENT)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await
        }
        .await;
        match result {
            Ok(html) if !html.is_empty() => Some(html),
            Ok(_) => None,
            Err(err) => {
                warn!(url, error = %err, "failed to fetch article content");
                None
            }
        }
    }

    async fn from_feed(&self, feed: &FeedSource, now: DateTime<Utc>) -> Result<Vec<ExtractedArticle>, BlogError> {
        let bytes = self
            .client
            .get(&feed.url)
            .header(USER_AGENT, FETCH_USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        let channel = match rss::Channel::read_from(&bytes[..]) {
            Ok(channel) => channel,
            Err(err) => {
                warn!(feed = %feed.url, error = %err, "failed to parse RSS feed");
                return Ok(Vec::new());
            }
        };

        let mut articles = Vec::new();
        for item in channel.items() {
            let (Some(link), Some(title)) = (item.link(), item.title()) else {
                continue;
            };
            let Some(published) = item.pub_date().and_then(parse_date) else {
                continue;
            };
            if !within_window(published, now) {
                continue;
            }
            let Some(html) = self.fetch_html(link).await else {
                continue;
            };
            let content = main_content(&html);
            if content.chars().count() < MIN_CONTENT_CHARS {
                continue;
            }
            let haystack = format!("{title} {} {content}", item.description().unwrap_or_default());
            if sources::is_off_topic(&haystack) {
                debug!(title, "skipping off-topic feed item");
                continue;
            }
            articles.push(ExtractedArticle {
                title: title.to_string(),
                url: link.to_string(),
                source: feed.name.clone(),
                published_date: published,
                excerpt: excerpt(&content, EXCERPT_CHARS),
                content,
            });
        }
        Ok(articles)
    }

    async fn from_news_api(&self, api_key: &str, now: DateTime<Utc>) -> Result<Vec<ExtractedArticle>, BlogError> {
        let from = (now - Duration::hours(WINDOW_HOURS)).to_rfc3339_opts(SecondsFormat::Millis, true);
        let query = sources::news_query();
        let response: NewsResponse = self
            .client
            .get(&self.news_api_url)
            .query(&[
                ("apiKey", api_key),
                ("q", query.as_str()),
                ("language", "en"),
                ("sortBy", "relevancy"),
                ("from", from.as_str()),
                ("pageSize", "20"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut articles = Vec::new();
        for entry in response.articles {
            let (Some(url), Some(title)) = (entry.url, entry.title) else {
                continue;
            };
            let Some(published) = entry.published_at.as_deref().and_then(parse_date) else {
                continue;
            };
            if !within_window(published, now) {
                continue;
            }
            let description = entry.description.unwrap_or_default();
            if !sources::is_accessibility_related(&format!("{title} {description}")) {
                debug!(title, "skipping non-accessibility news article");
                continue;
            }
            let source = entry
                .source
                .and_then(|source| source.name)
                .unwrap_or_else(|| "News API".to_string());

            let Some(html) = self.fetch_html(&url).await else {
                if !description.is_empty() && sources::is_accessibility_related(&description) {
                    articles.push(ExtractedArticle {
                        title,
                        url,
                        source,
                        published_date: published,
                        excerpt: description.chars().take(EXCERPT_CHARS).collect(),
                        content: description,
                    });
                }
                continue;
            };
            let content = main_content(&html);
            if content.chars().count() < MIN_CONTENT_CHARS || !sources::is_accessibility_related(&content) {
                continue;
            }
            articles.push(ExtractedArticle {
                title,
                url,
                source,
                published_date: published,
                excerpt: excerpt(&content, EXCERPT_CHARS),
                content,
            });
        }
        Ok(articles)
    }
}

impl ArticleSource for FeedExtractor {
    async fn extract(&self, now: DateTime<Utc>) -> Vec<ExtractedArticle> {
        let mut all = Vec::new();
        info!(feeds = self.feeds.len(), "extracting from RSS feeds");
        for feed in &self.feeds {
            match self.from_feed(feed, now).await {
                Ok(articles) => {
                    info!(feed = %feed.name, count = articles.len(), "extracted feed articles");
                    all.extend(articles);
                }
                Err(err) => warn!(feed = %feed.name, error = %err, "failed to extract RSS feed"),
            }
        }
        if let Some(key) = self.news_api_key.as_deref() {
            match self.from_news_api(key, now).await {
                Ok(articles) => {
                    info!(count = articles.len(), "extracted News API articles");
                    all.extend(articles);
                }
                Err(err) => warn!(error = %err, "failed to fetch from News API"),
            }
        }
        let ranked = dedupe_and_rank(all);
        info!(count = ranked.len(), "selected accessibility articles");
        ranked
    }
}
