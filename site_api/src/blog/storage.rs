//! Blog posts as JSON files under `<data>/blog`, with an `index.json`
//! metadata list kept newest first.

use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use tokio::sync::Mutex;
use tracing::info;

use super::{BlogPost, BlogPostMetadata};
use crate::error::BlogError;

const INDEX_FILE: &str = "index.json";

fn regex_disallowed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\s-]").unwrap())
}

fn regex_separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s_-]+").unwrap())
}

/// URL slug for a post title.
///
/// ```
/// use wcag_site_api::blog::generate_slug;
/// assert_eq!(generate_slug("  WCAG 2.2: What's New?  "), "wcag-22-whats-new");
/// assert_eq!(generate_slug("snake_case -- and spaces"), "snake-case-and-spaces");
/// ```
pub fn generate_slug(title: &str) -> String {
    let lower = title.to_lowercase();
    let kept = regex_disallowed().replace_all(lower.trim(), "");
    let dashed = regex_separators().replace_all(&kept, "-");
    dashed.trim_matches('-').to_string()
}

pub struct BlogStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl BlogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    fn post_path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{slug}.json"))
    }

    pub async fn exists(&self, slug: &str) -> bool {
        tokio::fs::try_exists(self.post_path(slug)).await.unwrap_or(false)
    }

    /// First free slug among `base`, `base-1`, `base-2`, ... Not atomic
    /// across processes.
    pub async fn unique_slug(&self, title: &str) -> String {
        let base = generate_slug(title);
        let mut slug = base.clone();
        let mut counter = 1;
        while self.exists(&slug).await {
            slug = format!("{base}-{counter}");
            counter += 1;
        }
        slug
    }

    /// Metadata of every stored post, newest first. A missing index is empty.
    pub async fn all_posts(&self) -> Result<Vec<BlogPostMetadata>, BlogError> {
        match tokio::fs::read(self.dir.join(INDEX_FILE)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(BlogError::Storage {
                slug: INDEX_FILE.to_string(),
                source,
            }),
        }
    }

    pub async fn published_posts(&self) -> Result<Vec<BlogPostMetadata>, BlogError> {
        let mut posts = self.all_posts().await?;
        posts.retain(|post| post.is_published);
        Ok(posts)
    }

    pub async fn post(&self, slug: &str) -> Result<Option<BlogPost>, BlogError> {
        match tokio::fs::read(self.post_path(slug)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(BlogError::Storage {
                slug: slug.to_string(),
                source,
            }),
        }
    }

    /// Writes the post file, then updates its index entry in place or
    /// prepends a new one.
    pub async fn save(&self, post: &BlogPost) -> Result<(), BlogError> {
        let storage_err = |source: io::Error| BlogError::Storage {
            slug: post.slug.clone(),
            source,
        };
        let _guard = self.lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await.map_err(storage_err)?;
        tokio::fs::write(self.post_path(&post.slug), serde_json::to_vec_pretty(post)?)
            .await
            .map_err(storage_err)?;

        let mut index = self.all_posts().await?;
        let metadata = BlogPostMetadata::from(post);
        match index.iter_mut().find(|entry| entry.slug == post.slug) {
            Some(entry) => *entry = metadata,
            None => index.insert(0, metadata),
        }
        tokio::fs::write(self.dir.join(INDEX_FILE), serde_json::to_vec_pretty(&index)?)
            .await
            .map_err(storage_err)?;
        info!(slug = %post.slug, "blog post saved");
        Ok(())
    }
}
