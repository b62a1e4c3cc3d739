//! Anchor ID remapping between Hugo and DEV.
//!
//! Hugo derives heading anchors the GitHub way, DEV has its own scheme, so an
//! in-page link such as `[see below](#go-get--u-vs-gomod)` written against the
//! Hugo rendering points nowhere once the post is on DEV. The fix is to find
//! the heading each anchor was derived from and derive the DEV anchor from
//! that same heading text:
//!
//! ```text
//! # `go get -u` vs. `go.mod` (= *_problem_*)
//! [...](#go-get--u-vs-gomod--_problem_)
//!   => [...](#-raw-go-get-u-endraw-vs-raw-gomod-endraw-problem)
//! ```
//!
//! Only ATX headings (`# Title`) are indexed.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use pulldown_cmark::{Event, Parser, Tag};
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::warn;

static ANCHOR_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]\n]*)\]\(#([^)\n]*)\)").expect("literal regex"));
static CODE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("`([^`]*)`").expect("literal regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("literal regex"));
static NOT_ALNUM_DASH_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^-a-zA-Z0-9 ]").expect("literal regex"));
static DASH_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("literal regex"));

/// A problem found while remapping anchors. The text around it is left as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorProblem {
    #[error("unexpected heading spanning several lines: {heading:?}")]
    MultiLineHeading { heading: String },

    #[error("anchor {anchor:?} in link {link} doesn't exist in the document{}", did_you_mean(.suggestion))]
    BrokenAnchor {
        anchor: String,
        link: String,
        suggestion: Option<String>,
    },
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(". Did you mean {s}?"),
        None => String::new(),
    }
}

/// DEV's anchor for a heading, computed from the heading's Markdown text.
pub fn devto_slug(heading: &str) -> String {
    // `foo` becomes -raw-foo-endraw-
    let s = CODE_SPAN.replace_all(heading, "-raw-$1-endraw-");
    let s = WHITESPACE.replace_all(&s, "-");
    let s = NOT_ALNUM_DASH_SPACE.replace_all(&s, "");
    let s = DASH_RUN.replace_all(&s, "-");
    s.to_lowercase()
}

/// GitHub-style anchor, as Hugo's default `SanitizeAnchorName` produces it.
pub fn github_slug(heading: &str) -> String {
    let mut slug = String::with_capacity(heading.len());
    for c in heading.trim().chars() {
        if c.is_alphanumeric() || c == '_' || c == '-' {
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() {
            slug.push('-');
        }
    }
    slug
}

/// Hugo anchor -> heading text, for one document.
#[derive(Debug, Default)]
pub struct HeadingIndex {
    by_slug: HashMap<String, String>,
    /// Slugs in document order, for deterministic suggestions.
    order: Vec<String>,
}

impl HeadingIndex {
    /// Index every single-line heading of `doc`. Multi-line headings are
    /// returned as problems and left out.
    pub fn build(doc: &str, slug_fn: impl Fn(&str) -> String) -> (Self, Vec<AnchorProblem>) {
        let mut index = HeadingIndex::default();
        let mut problems = Vec::new();

        for (event, range) in Parser::new(doc).into_offset_iter() {
            if let Event::Start(Tag::Heading { .. }) = event {
                let source = doc[range].trim_end_matches(['\n', '\r']);
                if source.contains('\n') {
                    problems.push(AnchorProblem::MultiLineHeading {
                        heading: source.to_string(),
                    });
                    continue;
                }
                let heading = atx_heading_text(source);
                index.insert(slug_fn(heading), heading.to_string());
            }
        }
        (index, problems)
    }

    /// First registration wins.
    fn insert(&mut self, slug: String, heading: String) {
        if !self.by_slug.contains_key(&slug) {
            self.order.push(slug.clone());
            self.by_slug.insert(slug, heading);
        }
    }

    pub fn heading(&self, slug: &str) -> Option<&str> {
        self.by_slug.get(slug).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The known slug closest to `anchor` by edit distance.
    pub fn closest(&self, anchor: &str) -> Option<&str> {
        self.order
            .iter()
            .min_by_key(|slug| levenshtein(slug, anchor))
            .map(String::as_str)
    }
}

/// Strip the ATX opening and optional closing sequences.
fn atx_heading_text(line: &str) -> &str {
    let text = line.trim_start().trim_start_matches('#').trim();
    let without_closing = text.trim_end_matches('#');
    if without_closing.is_empty() {
        return "";
    }
    if without_closing.len() != text.len() && without_closing.ends_with([' ', '\t']) {
        return without_closing.trim_end();
    }
    text
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Ranges of code blocks and inline code spans; links inside them are text.
fn code_ranges(doc: &str) -> Vec<Range<usize>> {
    Parser::new(doc)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::CodeBlock(_)) | Event::Code(_) => Some(range),
            _ => None,
        })
        .collect()
}

/// The rewritten document and whatever could not be rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorConversion {
    pub text: String,
    pub problems: Vec<AnchorProblem>,
}

/// Rewrite every `[text](#anchor)` link from Hugo anchors to DEV anchors.
///
/// `slug_fn` is Hugo's heading-to-anchor function. The link text is never
/// modified; unknown anchors are reported with the closest known anchor.
pub fn convert_anchor_ids(doc: &str, slug_fn: impl Fn(&str) -> String) -> AnchorConversion {
    let (index, mut problems) = HeadingIndex::build(doc, slug_fn);
    let code = code_ranges(doc);

    let text = ANCHOR_LINK
        .replace_all(doc, |caps: &Captures| {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            if code.iter().any(|r| r.contains(&whole.start)) {
                return caps[0].to_string();
            }
            let anchor = &caps[2];
            match index.heading(anchor) {
                Some(heading) => format!("[{}](#{})", &caps[1], devto_slug(heading)),
                None => {
                    let problem = AnchorProblem::BrokenAnchor {
                        anchor: anchor.to_string(),
                        link: caps[0].to_string(),
                        suggestion: index.closest(anchor).map(str::to_string),
                    };
                    warn!(%problem, "Cannot remap anchor");
                    problems.push(problem);
                    caps[0].to_string()
                }
            }
        })
        .into_owned();

    AnchorConversion { text, problems }
}
