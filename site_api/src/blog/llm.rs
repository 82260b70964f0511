//! OpenRouter chat completions for writing and fact-checking posts, plus the
//! revalidation call that refreshes cached blog pages.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::{BlogWriter, ExtractedArticle, FactCheckResult, Revalidator};
use crate::config::Settings;
use crate::error::BlogError;

const REFERER: &str = "https://thewcag.com";
const ARTICLE_CONTENT_CHARS: usize = 2000;

const WRITER_SYSTEM_PROMPT: &str = "You are an expert accessibility content writer who creates well-structured, informative blog posts about web accessibility and WCAG compliance.";

const FACT_CHECK_SYSTEM_PROMPT: &str = "You are a fact-checker for accessibility content. You verify the accuracy of WCAG guidelines, accessibility standards, legal information, and technical details. Always respond with valid JSON only.";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub fn generation_prompt(articles: &[ExtractedArticle]) -> String {
    let articles_text = articles
        .iter()
        .enumerate()
        .map(|(index, article)| {
            let mut content: String = article.content.chars().take(ARTICLE_CONTENT_CHARS).collect();
            if article.content.chars().count() > ARTICLE_CONTENT_CHARS {
                content.push_str("...");
            }
            format!(
                "Article {}:\nTitle: {}\nSource: {}\nURL: {}\nPublished: {}\nContent: {}",
                index + 1,
                article.title,
                article.source,
                article.url,
                article.published_date.to_rfc3339(),
                content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    format!(
        "You are a professional accessibility content writer. Create a comprehensive, well-structured blog post that consolidates and synthesizes the following accessibility articles from the last 48 hours.

Articles:
{articles_text}

Requirements:
1. Create a single, cohesive blog post (not a list of articles)
2. Synthesize information from all articles into a unified narrative
3. Use proper markdown formatting with headings, paragraphs, and lists
4. Include a \"Sources\" section at the end with all article titles, sources, and URLs
5. Write in a professional, engaging tone suitable for accessibility professionals
6. Focus on key insights, trends, and important information
7. Ensure the content is accurate and well-organized
8. The blog post should be substantial (at least 800 words)
9. Use H2 headings for main sections
10. Include an introduction and conclusion

Format the response as clean markdown. Do not include a title in the markdown (we'll add that separately)."
    )
}

pub fn fact_check_prompt(content: &str, title: &str) -> String {
    format!(
        "You are a fact-checker specializing in web accessibility and WCAG compliance. Review the following blog post for factual accuracy.

Title: {title}

Content:
{content}

Please check for:
1. Accuracy of WCAG compliance claims and guidelines
2. Correctness of dates, statistics, and technical information
3. Verification of accessibility standards and best practices
4. Any misleading or incorrect statements about accessibility
5. Accuracy of legal information (ADA, Section 508, etc.)
6. Technical accuracy of implementation details

Respond with a JSON object in this exact format:
{{
  \"verified\": true or false,
  \"notes\": \"Detailed explanation of any issues found, or 'All facts verified' if everything is correct\"
}}

If the content is factually correct, set \"verified\" to true. If there are any factual errors, inaccuracies, or unverified claims, set \"verified\" to false and provide detailed notes.

Return ONLY the JSON object, no other text."
    )
}

fn regex_fenced_json() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:json)?\s*(\{[\s\S]*\})\s*```").unwrap())
}

fn regex_bare_json() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{[\s\S]*\}").unwrap())
}

/// Reads the verdict from a model reply, tolerating code fences or chatter
/// around the JSON object.
pub fn parse_verdict(reply: &str) -> Result<FactCheckResult, BlogError> {
    let value: Value = match serde_json::from_str(reply) {
        Ok(value) => value,
        Err(_) => {
            let candidate = regex_fenced_json()
                .captures(reply)
                .and_then(|caps| caps.get(1))
                .or_else(|| regex_bare_json().find(reply))
                .ok_or(BlogError::UnparsableVerdict)?;
            serde_json::from_str(candidate.as_str()).map_err(|_| BlogError::UnparsableVerdict)?
        }
    };
    match (value.get("verified"), value.get("notes")) {
        (Some(Value::Bool(verified)), Some(Value::String(notes))) => Ok(FactCheckResult {
            verified: *verified,
            notes: notes.clone(),
        }),
        _ => Err(BlogError::InvalidVerdict),
    }
}

pub struct OpenRouterWriter {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    blog_model: String,
    fact_check_model: String,
}

impl OpenRouterWriter {
    pub fn from_settings(client: &Client, settings: &Settings) -> Self {
        Self {
            client: client.clone(),
            api_key: settings.openrouter_api_key().map(str::to_string),
            base_url: settings.openrouter_base_url.trim_end_matches('/').to_string(),
            blog_model: settings.openrouter_blog_model.clone(),
            fact_check_model: settings.openrouter_fact_check_model.clone(),
        }
    }

    async fn complete(&self, title_header: &str, body: Value) -> Result<String, BlogError> {
        let api_key = self.api_key.as_deref().ok_or(BlogError::MissingApiKey)?;
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", title_header)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BlogError::Provider {
                status: status.as_u16(),
                body,
            });
        }
        let reply: ChatResponse = response.json().await?;
        let first = reply.choices.into_iter().next().ok_or(BlogError::EmptyChoices)?;
        first
            .message
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .ok_or(BlogError::EmptyContent)
    }

    async fn try_fact_check(&self, content: &str, title: &str) -> Result<FactCheckResult, BlogError> {
        let body = json!({
            "model": self.fact_check_model,
            "messages": [
                { "role": "system", "content": FACT_CHECK_SYSTEM_PROMPT },
                { "role": "user", "content": fact_check_prompt(content, title) },
            ],
            "temperature": 0.3,
            "max_tokens": 1000,
            "response_format": { "type": "json_object" },
        });
        let reply = self.complete("TheWCAG Fact Checker", body).await?;
        parse_verdict(&reply)
    }
}

impl BlogWriter for OpenRouterWriter {
    async fn generate(&self, articles: &[ExtractedArticle]) -> Result<String, BlogError> {
        if self.api_key.is_none() {
            return Err(BlogError::MissingApiKey);
        }
        if articles.is_empty() {
            return Err(BlogError::NoArticles);
        }
        let body = json!({
            "model": self.blog_model,
            "messages": [
                { "role": "system", "content": WRITER_SYSTEM_PROMPT },
                { "role": "user", "content": generation_prompt(articles) },
            ],
            "temperature": 0.7,
            "max_tokens": 4000,
        });
        let content = self.complete("TheWCAG Blog Generator", body).await?;
        info!(chars = content.len(), "blog post generated");
        Ok(content)
    }

    async fn fact_check(&self, content: &str, title: &str) -> FactCheckResult {
        match self.try_fact_check(content, title).await {
            Ok(result) => {
                info!(verified = result.verified, "fact-check completed");
                result
            }
            Err(err) => {
                warn!(error = %err, "fact-check failed");
                FactCheckResult {
                    verified: false,
                    notes: format!("Fact-checking failed: {err}. Manual review required."),
                }
            }
        }
    }
}

/// Posts `{path, secret}` to the site's `/api/revalidate`.
pub struct HttpRevalidator {
    client: Client,
    endpoint: String,
    secret: Option<String>,
}

impl HttpRevalidator {
    pub fn from_settings(client: &Client, settings: &Settings) -> Self {
        Self {
            client: client.clone(),
            endpoint: format!("{}/api/revalidate", settings.base_url.trim_end_matches('/')),
            secret: settings.revalidate_secret().map(str::to_string),
        }
    }
}

impl Revalidator for HttpRevalidator {
    async fn revalidate(&self, path: &str) -> Result<(), BlogError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "path": path, "secret": self.secret }))
            .send()
            .await?;
        if !response.status().is_success() {
            warn!(path, status = response.status().as_u16(), "revalidation rejected");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use chrono::{TimeZone, Utc};
    use tokio::net::TcpListener;

    fn article(content: &str) -> ExtractedArticle {
        ExtractedArticle {
            title: "Focus styles".into(),
            url: "https://example.com/focus".into(),
            source: "Example".into(),
            published_date: Utc.with_ymd_and_hms(2026, 5, 1, 8, 0, 0).single().expect("date"),
            content: content.into(),
            excerpt: String::new(),
        }
    }

    #[test]
    fn prompt_lists_articles_and_truncates_content() {
        let long = "x".repeat(2500);
        let prompt = generation_prompt(&[article("short body"), article(&long)]);
        assert!(prompt.contains("Article 1:\nTitle: Focus styles\nSource: Example\nURL: https://example.com/focus"));
        assert!(prompt.contains("Content: short body\n\n---\n\nArticle 2:"));
        assert!(prompt.contains(&format!("Content: {}...", "x".repeat(2000))));
        assert!(!prompt.contains(&"x".repeat(2001)));
    }

    #[test]
    fn verdicts_parse_from_plain_fenced_or_wrapped_json() {
        let plain = parse_verdict(r#"{"verified": true, "notes": "All facts verified"}"#).expect("plain");
        assert!(plain.verified);
        let fenced = parse_verdict("```json\n{\"verified\": false, \"notes\": \"Date wrong\"}\n```").expect("fenced");
        assert_eq!(fenced.notes, "Date wrong");
        let wrapped = parse_verdict("Here you go: {\"verified\": true, \"notes\": \"ok\"} thanks").expect("wrapped");
        assert!(wrapped.verified);
    }

    #[test]
    fn malformed_verdicts_are_rejected() {
        assert!(matches!(parse_verdict("no json here"), Err(BlogError::UnparsableVerdict)));
        assert!(matches!(
            parse_verdict(r#"{"verified": "yes", "notes": "x"}"#),
            Err(BlogError::InvalidVerdict)
        ));
    }

    async fn writer_against(app: Router, api_key: Option<&str>) -> OpenRouterWriter {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let base = format!("http://{}", listener.local_addr().expect("addr"));
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        OpenRouterWriter {
            client: Client::new(),
            api_key: api_key.map(str::to_string),
            base_url: base,
            blog_model: "test/blog".into(),
            fact_check_model: "test/check".into(),
        }
    }

    #[tokio::test]
    async fn generate_sends_model_and_returns_content() {
        let app = Router::new().route(
            "/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "test/blog");
                assert_eq!(body["temperature"], 0.7);
                assert_eq!(body["max_tokens"], 4000);
                Json(json!({"choices": [{"message": {"role": "assistant", "content": "# Title\n\nBody"}}]}))
            }),
        );
        let writer = writer_against(app, Some("key")).await;
        let content = writer.generate(&[article("text")]).await.expect("content");
        assert_eq!(content, "# Title\n\nBody");
    }

    #[tokio::test]
    async fn provider_errors_surface_status_and_body() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let writer = writer_against(app, Some("key")).await;
        let err = writer.generate(&[article("text")]).await.unwrap_err();
        assert_eq!(err.to_string(), "OpenRouter API error: 429 - slow down");

        let verdict = writer.fact_check("body", "title").await;
        assert!(!verdict.verified);
        assert_eq!(
            verdict.notes,
            "Fact-checking failed: OpenRouter API error: 429 - slow down. Manual review required."
        );
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let writer = writer_against(Router::new(), None).await;
        assert!(matches!(writer.generate(&[article("x")]).await, Err(BlogError::MissingApiKey)));
        let verdict = writer.fact_check("body", "title").await;
        assert_eq!(
            verdict.notes,
            "Fact-checking failed: OPENROUTER_API_KEY is not configured. Manual review required."
        );
    }

    #[tokio::test]
    async fn empty_choices_are_an_error() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { Json(json!({"choices": []})) }),
        );
        let writer = writer_against(app, Some("key")).await;
        assert!(matches!(writer.generate(&[article("x")]).await, Err(BlogError::EmptyChoices)));
    }
}
