//! Error types shared across the crate.
//!
//! Fatal errors ([`SyncError`], [`ContentError`]) abort a run before any post
//! is processed. Everything that concerns a single post ([`PostError`]) is
//! recorded in that post's report and the batch moves on.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by the remote article API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The platform answered with a non-2xx status.
    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("request to {path} failed: {message}")]
    Transport { path: String, message: String },

    /// The response body could not be decoded.
    #[error("decoding response from {path}: {message}")]
    Decode { path: String, message: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// HTTP 429. The only condition worth retrying.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Failure while loading the Hugo site or one of its pages.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: invalid site config: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("no site config found in {}, tried config.yaml, config.yml and hugo.yaml", .root.display())]
    MissingConfig { root: PathBuf },

    #[error("{}: invalid front matter: {message}", .path.display())]
    FrontMatter { path: PathBuf, message: String },

    #[error(
        "wasn't able to find the source file for the URL path {arg}, tried:\n  - as a Markdown file ({})\n  - as an index file ({})",
        .as_file.display(),
        .as_index.display()
    )]
    NotFound {
        arg: String,
        as_file: PathBuf,
        as_index: PathBuf,
    },

    #[error("{} was found but does not seem to be a page", .path.display())]
    NotAPage { path: PathBuf },
}

/// Failure while reading or rewriting a front matter block.
#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("no front matter block delimited by '---'")]
    Missing,

    #[error("front matter is not valid YAML: {0}")]
    Yaml(String),

    #[error("front matter is not a mapping")]
    NotAMapping,

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A title match found while looking for a post's remote counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMatch {
    pub id: i64,
    pub edit_url: String,
}

/// What the platform says about an id that was not in the listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdProbe {
    /// `GET /articles/{id}` answered 404.
    NotFound,
    /// The article exists but belongs to another account, or is not listed.
    NotListed { url: String },
    /// The probe itself failed.
    Unavailable(String),
}

/// A per-post validation or push failure. Recoverable at batch level.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("missing {field} field")]
    MissingPublished { field: String },

    #[error("field {field} is expected to be {expected}, got '{actual}'")]
    WrongType {
        field: String,
        expected: &'static str,
        actual: String,
    },

    #[error("{field} {id} is unknown{}", unknown_id_hint(.title_match, .probe))]
    UnknownId {
        field: String,
        id: i64,
        title_match: Option<TitleMatch>,
        probe: Option<IdProbe>,
    },

    #[error("updating article {id}: {source}")]
    Update {
        id: i64,
        #[source]
        source: ApiError,
    },
}

fn unknown_id_hint(title_match: &Option<TitleMatch>, probe: &Option<IdProbe>) -> String {
    let mut hint = String::new();
    match probe {
        Some(IdProbe::NotFound) => hint.push_str(" (no such article on the platform)"),
        Some(IdProbe::NotListed { url }) => {
            hint.push_str(&format!(" (article exists at {url} but is not listed for this account)"))
        }
        Some(IdProbe::Unavailable(msg)) => hint.push_str(&format!(" (lookup failed: {msg})")),
        None => {}
    }
    match title_match {
        Some(m) => hint.push_str(&format!(" but title matches {}: {}", m.id, m.edit_url)),
        None => hint.push_str(" and title cannot be found in your account"),
    }
    hint
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("listing the account's articles: {0}")]
    ListArticles(#[source] ApiError),

    #[error(transparent)]
    Content(#[from] ContentError),
}
