//! # contract: the two collaborators of a synchronisation run
//!
//! A run needs exactly two things from the outside world:
//! - a [`ContentSource`] that yields the Hugo posts and knows the site's URL
//!   and heading-slug conventions
//! - an [`ArticleApi`] that lists, reads and updates DEV articles
//!
//! Both traits are annotated for `mockall` so tests can drive the reconciler
//! and the sync loop without a site on disk or a network.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ContentError};
use crate::front_matter::FrontMatter;

/// A post as produced by the content source. Immutable for the whole run.
#[derive(Debug, Clone)]
pub struct SourcePost {
    /// Markdown file the post was read from.
    pub source_path: PathBuf,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub date: DateTime<Utc>,
    /// Absolute URL of the rendered post, with a trailing slash.
    pub permalink: String,
    pub draft: bool,
    /// Raw Markdown body, front matter excluded.
    pub body: String,
    /// Every front matter field, standard ones included.
    pub params: FrontMatter,
}

/// An article as returned by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteArticle {
    pub id: i64,
    pub title: String,
    #[serde(rename = "body_markdown", default)]
    pub body: String,
    #[serde(default)]
    pub published: bool,
    pub url: String,
}

impl RemoteArticle {
    /// Unpublished articles can only be reached through their `/edit` page.
    pub fn edit_url(&self, published: bool) -> String {
        edit_url(&self.url, published)
    }
}

pub fn edit_url(url: &str, published: bool) -> String {
    if published {
        url.to_string()
    } else {
        format!("{url}/edit")
    }
}

/// Which of the account's article listings to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Unpublished,
    Published,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Unpublished => "unpublished",
            Visibility::Published => "published",
        }
    }
}

/// Trait for the remote article platform.
///
/// Implementors handle authentication and transport. Every non-2xx answer
/// must surface as [`ApiError::Status`] so callers can tell a rate limit
/// (429) or a missing article (404) from anything else.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ArticleApi: Send + Sync {
    /// Fetch one page (1-based) of the authenticated user's articles.
    async fn list_my_articles(
        &self,
        visibility: Visibility,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RemoteArticle>, ApiError>;

    /// Fetch a single published article by id.
    async fn get_article(&self, id: i64) -> Result<RemoteArticle, ApiError>;

    /// Replace the Markdown body of an article and return the platform's
    /// canonical representation of it.
    async fn update_article(&self, id: i64, body_markdown: &str) -> Result<RemoteArticle, ApiError>;
}

/// Trait for the static site that owns the posts.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait ContentSource: Send + Sync {
    /// All regular pages of the site, in a stable order.
    fn pages(&self) -> Result<Vec<SourcePost>, ContentError>;

    /// A single page, given as a file path or as a URL path.
    fn find_page(&self, path: &str) -> Result<SourcePost, ContentError>;

    /// Absolute URL for a path relative to the site root.
    fn abs_url(&self, path: &str) -> String;

    /// The site's own heading-to-anchor algorithm.
    fn anchor_slug(&self, heading: &str) -> String;
}
