//! High-level pipeline: fetch the account's articles, reconcile every post,
//! push what changed.
//!
//! # Flow
//! 1. [`list_all`] reads every unpublished then every published article into
//!    an [`ArticleIndex`].
//! 2. Each post from the [`ContentSource`] goes through
//!    [`reconcile_post`], in the content source's order.
//! 3. Pushes go through [`update_with_retry`]; the response replaces the
//!    index entry and, when configured, the DEV URL is recorded in the post's
//!    front matter.
//!
//! A failure concerning one post ends up in that post's [`PostReport`] and
//! the batch continues. Only listing the articles or loading the content can
//! abort a run.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::anchor::AnchorProblem;
use crate::contract::{ArticleApi, ContentSource, RemoteArticle, SourcePost, Visibility};
use crate::error::{ApiError, FrontMatterError, IdProbe, PostError, SyncError};
use crate::front_matter::record_field;
use crate::reconcile::{
    reconcile_post, Action, ArticleIndex, Decision, FieldNames, Mode, PushPlan,
};

pub const MAX_PER_PAGE: u32 = 1000;

/// Every article of the account: all unpublished pages, then all published
/// pages. A page shorter than `per_page` ends a listing.
pub async fn list_all<A>(api: &A, per_page: u32) -> Result<Vec<RemoteArticle>, ApiError>
where
    A: ArticleApi + ?Sized,
{
    let per_page = per_page.clamp(1, MAX_PER_PAGE);
    let mut all = Vec::new();
    for visibility in [Visibility::Unpublished, Visibility::Published] {
        let mut page = 1;
        loop {
            let batch = api.list_my_articles(visibility, page, per_page).await?;
            let count = batch.len();
            debug!(visibility = visibility.as_str(), page, count, "[SYNC] Fetched article page");
            all.extend(batch);
            if count < per_page as usize {
                break;
            }
            page += 1;
        }
    }
    info!(count = all.len(), "[SYNC] Fetched all articles");
    Ok(all)
}

/// Send an update, sleeping `backoff` and retrying for as long as the
/// platform answers 429. Any other error is returned as is.
pub async fn update_with_retry<A>(
    api: &A,
    id: i64,
    body_markdown: &str,
    backoff: Duration,
) -> Result<RemoteArticle, ApiError>
where
    A: ArticleApi + ?Sized,
{
    let mut attempt: u32 = 1;
    loop {
        match api.update_article(id, body_markdown).await {
            Err(e) if e.is_rate_limited() => {
                warn!(id, attempt, backoff_ms = backoff.as_millis() as u64, "[SYNC] Rate limited, retrying");
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub mode: Mode,
    pub fields: FieldNames,
    /// Wait between two attempts of a rate-limited update.
    pub backoff: Duration,
    pub per_page: u32,
    /// Restrict the run to one post, given as a file path or URL path.
    pub only: Option<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Status,
            fields: FieldNames::default(),
            backoff: Duration::from_secs(1),
            per_page: MAX_PER_PAGE,
            only: None,
        }
    }
}

/// Something that went wrong for a post without changing its action.
#[derive(Debug)]
pub enum Warning {
    Anchor(AnchorProblem),
    /// The push succeeded but the URL could not be recorded locally.
    WriteBack(FrontMatterError),
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::Anchor(problem) => write!(f, "{problem}"),
            Warning::WriteBack(e) => write!(f, "recording the article URL: {e}"),
        }
    }
}

#[derive(Debug)]
pub struct PostReport {
    pub path: PathBuf,
    pub title: String,
    pub action: Action,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub posts: Vec<PostReport>,
}

impl SyncReport {
    pub fn error_count(&self) -> usize {
        self.posts.iter().filter(|p| p.action.is_error()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

/// Entrypoint: reconcile the site's posts against the account's articles.
pub async fn synchronise<A, C>(
    api: &A,
    content: &C,
    options: &SyncOptions,
) -> Result<SyncReport, SyncError>
where
    A: ArticleApi + ?Sized,
    C: ContentSource + ?Sized,
{
    info!(mode = ?options.mode, only = ?options.only, "[SYNC] Starting synchronisation");

    let posts: Vec<SourcePost> = match &options.only {
        Some(arg) => vec![content.find_page(arg)?],
        None => content.pages()?,
    };

    let articles = list_all(api, options.per_page)
        .await
        .map_err(SyncError::ListArticles)?;
    let mut index = ArticleIndex::new(articles);

    let mut report = SyncReport::default();
    for post in &posts {
        let post_report = sync_post(api, content, options, &mut index, post).await;
        let path = post.source_path.display();
        match &post_report.action {
            Action::Error(e) => error!(%path, error = %e, "[SYNC][ERROR] Post failed"),
            Action::MissingMapping { suggestion } => error!(
                %path,
                field = %options.fields.id,
                suggested_id = ?suggestion.as_ref().map(|m| m.id),
                "[SYNC][ERROR] Post has no article id"
            ),
            Action::TitleMismatch {
                remote_title,
                local_title,
                ..
            } => error!(
                %path,
                %remote_title,
                %local_title,
                "[SYNC][ERROR] Post title differs from its article's"
            ),
            _ => {}
        }
        report.posts.push(post_report);
    }

    info!(
        posts = report.posts.len(),
        errors = report.error_count(),
        "[SYNC] Synchronisation finished"
    );
    Ok(report)
}

async fn sync_post<A, C>(
    api: &A,
    content: &C,
    options: &SyncOptions,
    index: &mut ArticleIndex,
    post: &SourcePost,
) -> PostReport
where
    A: ArticleApi + ?Sized,
    C: ContentSource + ?Sized,
{
    let reconciled = reconcile_post(post, index, content, &options.fields, options.mode);
    let mut warnings: Vec<Warning> = reconciled.warnings.into_iter().map(Warning::Anchor).collect();

    let action = match reconciled.decision {
        Decision::Done(Action::Error(PostError::UnknownId {
            field,
            id,
            title_match,
            probe: None,
        })) => Action::Error(PostError::UnknownId {
            field,
            id,
            title_match,
            probe: Some(probe_id(api, id).await),
        }),
        Decision::Done(action) => action,
        Decision::Push(plan) => push(api, options, index, post, plan, &mut warnings).await,
    };

    PostReport {
        path: post.source_path.clone(),
        title: post.title.clone(),
        action,
        warnings,
    }
}

/// Ask the platform about an id that was not in the account's listings.
async fn probe_id<A>(api: &A, id: i64) -> IdProbe
where
    A: ArticleApi + ?Sized,
{
    match api.get_article(id).await {
        Ok(article) => IdProbe::NotListed { url: article.url },
        Err(e) if e.is_not_found() => IdProbe::NotFound,
        Err(e) => IdProbe::Unavailable(e.to_string()),
    }
}

async fn push<A>(
    api: &A,
    options: &SyncOptions,
    index: &mut ArticleIndex,
    post: &SourcePost,
    plan: PushPlan,
    warnings: &mut Vec<Warning>,
) -> Action
where
    A: ArticleApi + ?Sized,
{
    info!(path = %post.source_path.display(), id = plan.id, "[SYNC] Pushing article");
    let article = match update_with_retry(api, plan.id, &plan.document, options.backoff).await {
        Ok(article) => article,
        Err(source) => {
            return Action::Error(PostError::Update {
                id: plan.id,
                source,
            })
        }
    };
    if let Ok(json) = serde_json::to_string(&article) {
        debug!(article = %json, "[SYNC] Update response");
    }

    if let Some(url_field) = &options.fields.url {
        let current = post.params.string(url_field).value();
        if current.as_deref() != Some(article.url.as_str()) {
            if let Err(e) = record_field(&post.source_path, url_field, &article.url) {
                warn!(path = %post.source_path.display(), error = %e, "[SYNC] Could not record article URL");
                warnings.push(Warning::WriteBack(e));
            }
        }
    }

    index.insert(article.clone());
    Action::Pushed {
        article,
        published: plan.published,
    }
}
