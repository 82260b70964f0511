//! Automated accessibility news roundup: extract recent articles, have an
//! LLM write and fact-check a post, store it, and ask the site to refresh.

pub mod extractor;
pub mod llm;
pub mod pipeline;
pub mod sources;
pub mod storage;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BlogError;

pub use extractor::FeedExtractor;
pub use llm::{HttpRevalidator, OpenRouterWriter};
pub use pipeline::{Outcome, run};
pub use storage::{BlogStore, generate_slug};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedArticle {
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_date: DateTime<Utc>,
    pub content: String,
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
    pub source: String,
}

impl From<&ExtractedArticle> for SourceRef {
    fn from(article: &ExtractedArticle) -> Self {
        Self {
            title: article.title.clone(),
            url: article.url.clone(),
            source: article.source.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactCheckStatus {
    Verified,
    NeedsReview,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub published_at: String,
    pub generated_at: String,
    pub sources: Vec<SourceRef>,
    pub fact_check_status: FactCheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fact_check_notes: Option<String>,
    pub is_published: bool,
    pub tags: Vec<String>,
}

/// Entry of `index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostMetadata {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub published_at: String,
    pub fact_check_status: FactCheckStatus,
    pub is_published: bool,
}

impl From<&BlogPost> for BlogPostMetadata {
    fn from(post: &BlogPost) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            published_at: post.published_at.clone(),
            fact_check_status: post.fact_check_status,
            is_published: post.is_published,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FactCheckResult {
    pub verified: bool,
    pub notes: String,
}

/// Where the pipeline gets its raw material.
pub trait ArticleSource {
    /// Recent accessibility articles, newest first. Source failures are
    /// logged and yield fewer articles rather than an error.
    fn extract(&self, now: DateTime<Utc>) -> impl Future<Output = Vec<ExtractedArticle>> + Send;
}

pub trait BlogWriter {
    fn generate(
        &self,
        articles: &[ExtractedArticle],
    ) -> impl Future<Output = Result<String, BlogError>> + Send;

    /// Never fails: problems turn into an unverified result.
    fn fact_check(&self, content: &str, title: &str) -> impl Future<Output = FactCheckResult> + Send;
}

pub trait Revalidator {
    fn revalidate(&self, path: &str) -> impl Future<Output = Result<(), BlogError>> + Send;
}
