//! Per-post decisions: which remote article a post maps to, what the DEV
//! document for it looks like, and what should happen to it.
//!
//! The reconciler never talks to the network. It reads an [`ArticleIndex`]
//! fetched once per run and returns a [`Decision`]; the sync loop carries out
//! pushes.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use crate::anchor::{convert_anchor_ids, AnchorProblem};
use crate::contract::{edit_url, ContentSource, RemoteArticle, SourcePost};
use crate::diff::unified_diff;
use crate::error::{PostError, TitleMatch};
use crate::front_matter::{quote, Param};
use crate::transform::transform_body;

/// The account's articles, keyed by id and by title.
#[derive(Debug, Default, Clone)]
pub struct ArticleIndex {
    by_id: HashMap<i64, RemoteArticle>,
    by_title: HashMap<String, i64>,
}

impl ArticleIndex {
    /// When two articles share a title, the one listed last is kept in the
    /// title index.
    pub fn new(articles: Vec<RemoteArticle>) -> Self {
        let mut index = Self::default();
        for article in articles {
            index.insert(article);
        }
        index
    }

    pub fn by_id(&self, id: i64) -> Option<&RemoteArticle> {
        self.by_id.get(&id)
    }

    pub fn by_title(&self, title: &str) -> Option<&RemoteArticle> {
        self.by_title.get(title).and_then(|id| self.by_id.get(id))
    }

    /// Add or replace an article, e.g. with the response of an update.
    pub fn insert(&mut self, article: RemoteArticle) {
        if let Some(previous) = self.by_id.get(&article.id) {
            if previous.title != article.title
                && self.by_title.get(&previous.title) == Some(&article.id)
            {
                self.by_title.remove(&previous.title);
            }
        }
        self.by_title.insert(article.title.clone(), article.id);
        self.by_id.insert(article.id, article);
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Names of the front matter fields that drive the sync.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldNames {
    #[serde(default = "default_id_field")]
    pub id: String,
    #[serde(default = "default_published_field")]
    pub published: String,
    #[serde(default = "default_skip_field")]
    pub skip: String,
    /// Where to record the DEV URL after a push. Unset disables write-back.
    #[serde(default)]
    pub url: Option<String>,
}

fn default_id_field() -> String {
    "devtoId".to_string()
}

fn default_published_field() -> String {
    "devtoPublished".to_string()
}

fn default_skip_field() -> String {
    "devtoSkip".to_string()
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            id: default_id_field(),
            published: default_published_field(),
            skip: default_skip_field(),
            url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Report what a push would do.
    Status,
    /// Print the composed document.
    Preview,
    /// Show how the composed document differs from the remote body.
    Diff,
    Push,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Draft,
    SkipField,
}

/// The outcome for one post. Exactly one per post per run.
#[derive(Debug)]
pub enum Action {
    Skip {
        reason: SkipReason,
    },
    MissingMapping {
        suggestion: Option<TitleMatch>,
    },
    TitleMismatch {
        remote_title: String,
        local_title: String,
        edit_url: String,
    },
    UpToDate {
        id: i64,
    },
    Preview {
        document: String,
    },
    DryRunReport {
        id: i64,
        published: bool,
        edit_url: String,
    },
    Diff {
        id: i64,
        diff: String,
    },
    Pushed {
        article: RemoteArticle,
        published: bool,
    },
    Error(PostError),
}

impl Action {
    /// Whether the post needs fixing before it can be synchronised. Any such
    /// post fails the run.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Action::Error(_) | Action::MissingMapping { .. } | Action::TitleMismatch { .. }
        )
    }
}

/// An update the sync loop has to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushPlan {
    pub id: i64,
    pub document: String,
    pub published: bool,
}

#[derive(Debug)]
pub enum Decision {
    Done(Action),
    Push(PushPlan),
}

#[derive(Debug)]
pub struct Reconciled {
    pub decision: Decision,
    /// Anchor problems found while composing the document.
    pub warnings: Vec<AnchorProblem>,
}

impl Reconciled {
    fn done(action: Action) -> Self {
        Self {
            decision: Decision::Done(action),
            warnings: Vec::new(),
        }
    }
}

/// The DEV document for a post: front matter followed by the transformed
/// body, plus any anchor problems hit on the way.
pub fn compose_document(
    post: &SourcePost,
    published: bool,
    cover_image: &str,
    content: &(impl ContentSource + ?Sized),
) -> (String, Vec<AnchorProblem>) {
    let base = if post.permalink.ends_with('/') {
        post.permalink.clone()
    } else {
        format!("{}/", post.permalink)
    };
    let body = transform_body(&post.body, &base);
    let converted = convert_anchor_ids(&body, |heading| content.anchor_slug(heading));

    let mut document = String::with_capacity(converted.text.len() + 256);
    document.push_str("---\n");
    document.push_str(&format!("title: {}\n", quote(&post.title)));
    document.push_str(&format!("description: {}\n", quote(&post.description)));
    document.push_str(&format!("published: {published}\n"));
    document.push_str(&format!("tags: {}\n", quote(&post.keywords.join(", "))));
    document.push_str(&format!("date: {}\n", post.date.format("%Y%m%dT%H:%MZ")));
    document.push_str("series: \"\"\n");
    document.push_str(&format!("canonical_url: {}\n", quote(&post.permalink)));
    document.push_str(&format!("cover_image: {}\n", quote(cover_image)));
    document.push_str("---\n");
    document.push_str(&converted.text);

    (document, converted.problems)
}

fn title_match(index: &ArticleIndex, title: &str, published: bool) -> Option<TitleMatch> {
    index.by_title(title).map(|article| TitleMatch {
        id: article.id,
        edit_url: article.edit_url(published),
    })
}

/// Decide what to do with one post. The first rule that applies wins.
pub fn reconcile_post(
    post: &SourcePost,
    index: &ArticleIndex,
    content: &(impl ContentSource + ?Sized),
    fields: &FieldNames,
    mode: Mode,
) -> Reconciled {
    if post.draft {
        return Reconciled::done(Action::Skip {
            reason: SkipReason::Draft,
        });
    }

    match post.params.bool(&fields.skip) {
        Param::Value(true) => {
            debug!(path = %post.source_path.display(), field = %fields.skip, "Skip field is set");
            return Reconciled::done(Action::Skip {
                reason: SkipReason::SkipField,
            });
        }
        Param::WrongType(actual) => {
            return Reconciled::done(Action::Error(PostError::WrongType {
                field: fields.skip.clone(),
                expected: "a boolean",
                actual,
            }))
        }
        Param::Value(false) | Param::Absent => {}
    }

    let published = match post.params.bool(&fields.published) {
        Param::Value(p) => p,
        Param::Absent => {
            return Reconciled::done(Action::Error(PostError::MissingPublished {
                field: fields.published.clone(),
            }))
        }
        Param::WrongType(actual) => {
            return Reconciled::done(Action::Error(PostError::WrongType {
                field: fields.published.clone(),
                expected: "a boolean",
                actual,
            }))
        }
    };

    let id = match post.params.int(&fields.id) {
        Param::Value(id) => id,
        Param::Absent => {
            return Reconciled::done(Action::MissingMapping {
                suggestion: title_match(index, &post.title, published),
            })
        }
        Param::WrongType(actual) => {
            return Reconciled::done(Action::Error(PostError::WrongType {
                field: fields.id.clone(),
                expected: "an integer",
                actual,
            }))
        }
    };

    let Some(remote) = index.by_id(id) else {
        return Reconciled::done(Action::Error(PostError::UnknownId {
            field: fields.id.clone(),
            id,
            title_match: title_match(index, &post.title, published),
            probe: None,
        }));
    };

    if remote.title != post.title {
        return Reconciled::done(Action::TitleMismatch {
            remote_title: remote.title.clone(),
            local_title: post.title.clone(),
            edit_url: remote.edit_url(published),
        });
    }

    let images = match post.params.string_list("images") {
        Param::Value(images) => images,
        Param::Absent => Vec::new(),
        Param::WrongType(actual) => {
            return Reconciled::done(Action::Error(PostError::WrongType {
                field: "images".to_string(),
                expected: "a list of strings",
                actual,
            }))
        }
    };
    let cover_image = images
        .first()
        .map(|image| content.abs_url(image))
        .unwrap_or_default();

    let (document, warnings) = compose_document(post, published, &cover_image, content);
    let done = |action| Reconciled {
        decision: Decision::Done(action),
        warnings: warnings.clone(),
    };

    if mode == Mode::Preview {
        return done(Action::Preview { document });
    }
    if document == remote.body {
        return done(Action::UpToDate { id });
    }

    match mode {
        Mode::Diff => done(Action::Diff {
            id,
            diff: unified_diff(&remote.body, &document, "dev.to", "hugo", 3),
        }),
        Mode::Status => done(Action::DryRunReport {
            id,
            published,
            edit_url: edit_url(&remote.url, published),
        }),
        Mode::Push | Mode::Preview => Reconciled {
            decision: Decision::Push(PushPlan {
                id,
                document,
                published,
            }),
            warnings,
        },
    }
}
