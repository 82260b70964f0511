//! The cron run: extract, generate, title and slug, fact-check, save,
//! revalidate.

use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::{
    ArticleSource, BlogPost, BlogStore, BlogWriter, FactCheckStatus, Revalidator, SourceRef,
};
use crate::error::BlogError;

pub const POST_TAGS: [&str; 4] = ["accessibility", "wcag", "news", "roundup"];
const EXCERPT_CHARS: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoArticles,
    Created {
        slug: String,
        title: String,
        is_published: bool,
        fact_check_status: FactCheckStatus,
        articles_count: usize,
    },
}

impl Outcome {
    pub fn to_json(&self) -> Value {
        match self {
            Self::NoArticles => json!({
                "success": true,
                "message": "No articles found",
                "articlesCount": 0,
                "blogPostCreated": false,
            }),
            Self::Created {
                slug,
                title,
                is_published,
                fact_check_status,
                articles_count,
            } => json!({
                "success": true,
                "message": "Blog post generated successfully",
                "blogPost": {
                    "slug": slug,
                    "title": title,
                    "isPublished": is_published,
                    "factCheckStatus": fact_check_status,
                },
                "articlesCount": articles_count,
                "blogPostCreated": true,
            }),
        }
    }
}

fn regex_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^#\s+(.+)$").unwrap())
}

/// Takes the first level-one heading as the title and removes it from the
/// body; without one the title is dated.
pub fn split_title(content: &str, now: DateTime<Utc>) -> (String, String) {
    match regex_heading().captures(content) {
        Some(caps) => {
            let title = caps[1].trim_end().to_string();
            let body = regex_heading().replace(content, "").trim().to_string();
            (title, body)
        }
        None => (
            format!("Accessibility News Roundup - {}", now.format("%B %-d, %Y")),
            content.to_string(),
        ),
    }
}

pub fn post_excerpt(content: &str) -> String {
    let head: String = content.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", head.replace('\n', " "))
}

pub async fn run<S, W, R>(
    source: &S,
    writer: &W,
    store: &BlogStore,
    revalidator: &R,
    auto_publish: bool,
    now: DateTime<Utc>,
) -> Result<Outcome, BlogError>
where
    S: ArticleSource,
    W: BlogWriter,
    R: Revalidator,
{
    info!("extracting articles");
    let articles = source.extract(now).await;
    if articles.is_empty() {
        info!("no articles found in the last 48 hours");
        return Ok(Outcome::NoArticles);
    }

    info!(count = articles.len(), "generating blog post");
    let generated = writer.generate(&articles).await?;
    let (title, content) = split_title(&generated, now);
    let slug = store.unique_slug(&title).await;

    info!(%slug, "fact-checking blog post");
    let verdict = writer.fact_check(&content, &title).await;
    let is_published = auto_publish && verdict.verified;
    let fact_check_status = if verdict.verified {
        FactCheckStatus::Verified
    } else {
        FactCheckStatus::NeedsReview
    };

    let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let post = BlogPost {
        slug: slug.clone(),
        title: title.clone(),
        excerpt: post_excerpt(&content),
        content,
        published_at: stamp.clone(),
        generated_at: stamp,
        sources: articles.iter().map(SourceRef::from).collect(),
        fact_check_status,
        fact_check_notes: Some(verdict.notes),
        is_published,
        tags: POST_TAGS.iter().map(|tag| tag.to_string()).collect(),
    };
    store.save(&post).await?;

    for path in ["/blog".to_string(), format!("/blog/{slug}")] {
        if let Err(err) = revalidator.revalidate(&path).await {
            warn!(%path, error = %err, "revalidation failed (non-critical)");
        }
    }

    info!(%slug, is_published, "blog post created");
    Ok(Outcome::Created {
        slug,
        title,
        is_published,
        fact_check_status,
        articles_count: articles.len(),
    })
}
