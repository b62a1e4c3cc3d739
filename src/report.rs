//! Terminal rendering of a sync report.
//!
//! Lines are built as plain text and only the `info:`/`error:`/`success:`
//! prefixes are coloured, and only when the stream supports it.

use blogsync_core::contract::{edit_url, RemoteArticle};
use blogsync_core::reconcile::{Action, FieldNames, SkipReason};
use blogsync_core::synchronise::{PostReport, SyncReport};
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
    Success,
    /// Printed as is on stdout: previews and diffs.
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub level: Level,
    pub text: String,
}

impl Line {
    fn new(level: Level, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

fn visibility(published: bool) -> &'static str {
    if published {
        "published"
    } else {
        "unpublished"
    }
}

/// What to tell the user about one post. Drafts produce nothing.
pub fn post_lines(post: &PostReport, fields: &FieldNames) -> Vec<Line> {
    let path = post.path.display();
    let mut lines = Vec::new();

    match &post.action {
        Action::Skip {
            reason: SkipReason::Draft,
        } => {}
        Action::Skip {
            reason: SkipReason::SkipField,
        } => lines.push(Line::new(
            Level::Info,
            format!("{path}: field {} is true, skipping this post.", fields.skip),
        )),
        Action::MissingMapping {
            suggestion: Some(m),
        } => lines.push(Line::new(
            Level::Error,
            format!(
                "{path}: missing {} field in front matter, might be {}: {}",
                fields.id, m.id, m.edit_url
            ),
        )),
        Action::MissingMapping { suggestion: None } => lines.push(Line::new(
            Level::Error,
            format!(
                "{path}: missing {} field in front matter and title cannot be found on your DEV account",
                fields.id
            ),
        )),
        Action::TitleMismatch {
            remote_title,
            local_title,
            edit_url,
        } => lines.push(Line::new(
            Level::Error,
            format!(
                "there seems to be a title mismatch in {path}.\n\
                 --- dev.to title\n\
                 +++ hugo title\n\
                 - {remote_title}\n\
                 + {local_title}\n\
                 To fix the mismatch, go to: {edit_url}"
            ),
        )),
        Action::UpToDate { .. } => {
            lines.push(Line::new(Level::Info, format!("{path}: no change, skipping")))
        }
        Action::Preview { document } => lines.push(Line::new(Level::Raw, document.clone())),
        Action::DryRunReport {
            id,
            published,
            edit_url,
        } => lines.push(Line::new(
            Level::Info,
            format!(
                "{path} will be pushed {} to {edit_url} ({}: {id}, {}: {published})",
                visibility(*published),
                fields.id,
                fields.published
            ),
        )),
        Action::Diff { diff, .. } => {
            lines.push(Line::new(Level::Info, format!("{path}: found differences")));
            if diff.is_empty() {
                lines.push(Line::new(Level::Raw, "(differences are in trailing whitespace only)\n"));
            } else {
                lines.push(Line::new(Level::Raw, diff.clone()));
            }
        }
        Action::Pushed { article, published } => lines.push(Line::new(
            Level::Success,
            format!(
                "{path} pushed {} to {} ({}: {}, {}: {published})",
                visibility(*published),
                edit_url(&article.url, *published),
                fields.id,
                article.id,
                fields.published
            ),
        )),
        Action::Error(e) => lines.push(Line::new(Level::Error, format!("{path}: {e}"))),
    }

    for warning in &post.warnings {
        lines.push(Line::new(Level::Warning, format!("{path}: {warning}")));
    }
    lines
}

/// `ID: published|unpublished at <edit url> (<title>)`
pub fn list_line(article: &RemoteArticle) -> String {
    format!(
        "{}: {} at {} ({})",
        article.id,
        visibility(article.published),
        article.edit_url(article.published),
        article.title
    )
}

pub fn print_line(line: &Line) {
    match line.level {
        Level::Raw => print!("{}", line.text),
        Level::Info => println!(
            "{}: {}",
            "info".if_supports_color(Stream::Stdout, |t| t.yellow()),
            line.text
        ),
        Level::Success => println!(
            "{}: {}",
            "success".if_supports_color(Stream::Stdout, |t| t.green()),
            line.text
        ),
        Level::Warning => eprintln!(
            "{}: {}",
            "warning".if_supports_color(Stream::Stderr, |t| t.yellow()),
            line.text
        ),
        Level::Error => eprintln!(
            "{}: {}",
            "error".if_supports_color(Stream::Stderr, |t| t.red()),
            line.text
        ),
    }
}

pub fn print_report(report: &SyncReport, fields: &FieldNames) {
    for post in &report.posts {
        for line in post_lines(post, fields) {
            print_line(&line);
        }
    }
}

pub fn print_list(articles: &[RemoteArticle]) {
    for article in articles {
        println!("{}", list_line(article));
    }
}

