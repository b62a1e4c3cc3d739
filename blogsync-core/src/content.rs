//! The Hugo site as a [`ContentSource`].
//!
//! This is deliberately a small subset of Hugo: YAML front matter, `baseURL`
//! from the site config, and Hugo's default permalink rules (`url` and `slug`
//! front matter fields, page bundles with `index.md`).

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_yaml::Value;
use tracing::{debug, info, warn};

use crate::anchor::github_slug;
use crate::contract::{ContentSource, SourcePost};
use crate::error::ContentError;
use crate::front_matter::{self, FrontMatter, Param};

const CONFIG_FILES: [&str; 3] = ["config.yaml", "config.yml", "hugo.yaml"];

#[derive(Debug, Deserialize)]
struct SiteConfig {
    #[serde(rename = "baseURL", alias = "baseurl", default)]
    base_url: String,
}

pub struct HugoSite {
    root: PathBuf,
    base_url: String,
}

impl HugoSite {
    /// Read the site config found at `root`.
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self, ContentError> {
        let root = root.as_ref().to_path_buf();
        let config_path = CONFIG_FILES
            .iter()
            .map(|name| root.join(name))
            .find(|p| p.is_file())
            .ok_or_else(|| ContentError::MissingConfig { root: root.clone() })?;

        let raw = std::fs::read_to_string(&config_path).map_err(|source| ContentError::Io {
            path: config_path.clone(),
            source,
        })?;
        let config: SiteConfig =
            serde_yaml::from_str(&raw).map_err(|e| ContentError::Config {
                path: config_path.clone(),
                message: e.to_string(),
            })?;
        if config.base_url.is_empty() {
            warn!(config = %config_path.display(), "baseURL is not set, permalinks will be relative");
        }

        info!(root = %root.display(), base_url = %config.base_url, "Loaded Hugo site");
        Ok(Self {
            root,
            base_url: config.base_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn content_dir(&self) -> PathBuf {
        self.root.join("content")
    }

    /// Build a post from one Markdown file under `content/`.
    pub fn page_from_file(&self, path: &Path) -> Result<SourcePost, ContentError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let fm_err = |message: String| ContentError::FrontMatter {
            path: path.to_path_buf(),
            message,
        };

        let (yaml, body) = match front_matter::split(&raw) {
            Ok(parts) => parts,
            Err(_) => ("", raw.as_str()),
        };
        let params = FrontMatter::parse(yaml).map_err(|e| fm_err(e.to_string()))?;

        let title = standard_string(&params, "title").map_err(&fm_err)?;
        let description = standard_string(&params, "description").map_err(&fm_err)?;
        let keywords = match params.string_list("keywords") {
            Param::Absent => Vec::new(),
            Param::Value(k) => k,
            Param::WrongType(kind) => {
                return Err(fm_err(format!("keywords must be a list of strings, got {kind}")))
            }
        };
        let draft = match params.bool("draft") {
            Param::Absent => false,
            Param::Value(d) => d,
            Param::WrongType(kind) => return Err(fm_err(format!("draft must be a bool, got {kind}"))),
        };
        let date = match params.get("date") {
            None => hugo_zero_date(),
            Some(Value::String(s)) => {
                parse_date(s).ok_or_else(|| fm_err(format!("cannot parse date {s:?}")))?
            }
            Some(other) => return Err(fm_err(format!("cannot parse date {other:?}"))),
        };

        let rel = self.relative_permalink(path, &params)?;
        let permalink = self.abs_url(&rel);
        debug!(path = %path.display(), %permalink, "Loaded page");

        Ok(SourcePost {
            source_path: path.to_path_buf(),
            title,
            description,
            keywords,
            date,
            permalink,
            draft,
            body: body.to_string(),
            params,
        })
    }

    /// `/section/post/`, from the `url` field or the content path.
    fn relative_permalink(&self, path: &Path, params: &FrontMatter) -> Result<String, ContentError> {
        if let Param::Value(url) = params.string("url") {
            return Ok(with_slashes(&url));
        }

        let rel = path
            .strip_prefix(self.content_dir())
            .map_err(|_| ContentError::NotAPage {
                path: path.to_path_buf(),
            })?;
        let mut segments: Vec<String> = rel
            .iter()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        match segments.last().map(String::as_str) {
            Some("index.md") => {
                segments.pop();
            }
            Some(file) => {
                let stem = file.strip_suffix(".md").unwrap_or(file).to_string();
                segments.pop();
                segments.push(stem);
            }
            None => {}
        }
        if let Param::Value(slug) = params.string("slug") {
            segments.pop();
            segments.push(slug);
        }
        Ok(with_slashes(&segments.join("/").to_lowercase()))
    }
}

impl ContentSource for HugoSite {
    fn pages(&self) -> Result<Vec<SourcePost>, ContentError> {
        let content_dir = self.content_dir();
        let mut files = Vec::new();
        collect_markdown(&content_dir, &mut files)?;
        files.sort();
        info!(count = files.len(), dir = %content_dir.display(), "Collected content pages");
        files.iter().map(|f| self.page_from_file(f)).collect()
    }

    fn find_page(&self, path: &str) -> Result<SourcePost, ContentError> {
        let file = resolve_post_path(&self.root, path)?;
        if file.file_name().is_some_and(|n| n == "_index.md") {
            return Err(ContentError::NotAPage { path: file });
        }
        self.page_from_file(&file)
    }

    fn abs_url(&self, path: &str) -> String {
        if path.contains("://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn anchor_slug(&self, heading: &str) -> String {
        github_slug(heading)
    }
}

/// Recursively collect `*.md` files, section `_index.md` files excluded.
fn collect_markdown(dir: &Path, results: &mut Vec<PathBuf>) -> Result<(), ContentError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ContentError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ContentError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_markdown(&path, results)?;
        } else if path.extension().is_some_and(|e| e == "md")
            && path.file_name().is_some_and(|n| n != "_index.md")
        {
            results.push(path);
        }
    }
    Ok(())
}

/// Find the Markdown file for a post given on the command line.
///
/// `arg` is either an existing file (relative to the working directory or to
/// `root`) or a URL path such as `my-article`, tried as
/// `content/my-article.md` and then `content/my-article/index.md`.
pub fn resolve_post_path(root: &Path, arg: &str) -> Result<PathBuf, ContentError> {
    for candidate in [PathBuf::from(arg), root.join(arg)] {
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    let trimmed = arg.trim_matches('/');
    let as_file = root.join("content").join(format!("{trimmed}.md"));
    let as_index = root.join("content").join(trimmed).join("index.md");
    for candidate in [&as_file, &as_index] {
        match std::fs::metadata(candidate) {
            Ok(meta) if meta.is_file() => return Ok(candidate.clone()),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ContentError::Io {
                    path: candidate.clone(),
                    source,
                })
            }
        }
    }
    Err(ContentError::NotFound {
        arg: arg.to_string(),
        as_file,
        as_index,
    })
}

fn standard_string(params: &FrontMatter, key: &str) -> Result<String, String> {
    match params.string(key) {
        Param::Absent => Ok(String::new()),
        Param::Value(s) => Ok(s),
        Param::WrongType(kind) => Err(format!("{key} must be a string, got {kind}")),
    }
}

fn with_slashes(path: &str) -> String {
    let inner = path.trim_matches('/');
    if inner.is_empty() {
        "/".to_string()
    } else {
        format!("/{inner}/")
    }
}

/// Hugo reports a missing date as the zero time, 0001-01-01T00:00:00Z.
fn hugo_zero_date() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}
