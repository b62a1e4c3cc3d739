use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use blogsync_core::anchor::github_slug;
use blogsync_core::contract::{
    MockArticleApi, MockContentSource, RemoteArticle, SourcePost, Visibility,
};
use blogsync_core::error::{ApiError, IdProbe, PostError, SyncError};
use blogsync_core::front_matter::{self, FrontMatter};
use blogsync_core::reconcile::{compose_document, Action, FieldNames, Mode, SkipReason};
use blogsync_core::synchronise::{list_all, synchronise, update_with_retry, SyncOptions};
use chrono::{TimeZone, Utc};
use mockall::predicate::eq;
use mockall::Sequence;
use tempfile::tempdir;

fn post(path: &str, title: &str, front_matter: &str) -> SourcePost {
    SourcePost {
        source_path: PathBuf::from(path),
        title: title.to_string(),
        description: String::new(),
        keywords: vec![],
        date: Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap(),
        permalink: "https://maelvls.dev/post/".to_string(),
        draft: false,
        body: "Hello\n".to_string(),
        params: FrontMatter::parse(front_matter).unwrap(),
    }
}

fn article(id: i64, title: &str, body: &str) -> RemoteArticle {
    RemoteArticle {
        id,
        title: title.to_string(),
        body: body.to_string(),
        published: false,
        url: format!("https://dev.to/mael/post-{id}"),
    }
}

fn content_with(posts: Vec<SourcePost>) -> MockContentSource {
    let mut content = MockContentSource::new();
    content.expect_pages().return_once(move || Ok(posts));
    content
        .expect_anchor_slug()
        .returning(|heading: &str| github_slug(heading));
    content
        .expect_abs_url()
        .returning(|path: &str| format!("https://maelvls.dev{path}"));
    content
}

/// Unpublished listing returns `articles`, published listing is empty.
fn api_listing(articles: Vec<RemoteArticle>) -> MockArticleApi {
    let mut api = MockArticleApi::new();
    api.expect_list_my_articles()
        .with(eq(Visibility::Unpublished), eq(1), eq(1000))
        .return_once(move |_, _, _| Ok(articles));
    api.expect_list_my_articles()
        .with(eq(Visibility::Published), eq(1), eq(1000))
        .return_once(|_, _, _| Ok(vec![]));
    api
}

fn options(mode: Mode) -> SyncOptions {
    SyncOptions {
        mode,
        backoff: Duration::ZERO,
        ..SyncOptions::default()
    }
}

fn rendered(post: &SourcePost) -> String {
    let mut content = MockContentSource::new();
    content
        .expect_anchor_slug()
        .returning(|heading: &str| github_slug(heading));
    compose_document(post, false, "", &content).0
}

#[tokio::test]
async fn test_list_all_pages_until_short_page() {
    let mut api = MockArticleApi::new();
    let mut seq = Sequence::new();
    api.expect_list_my_articles()
        .with(eq(Visibility::Unpublished), eq(1), eq(2))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(vec![article(1, "a", ""), article(2, "b", "")]));
    api.expect_list_my_articles()
        .with(eq(Visibility::Unpublished), eq(2), eq(2))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(vec![]));
    api.expect_list_my_articles()
        .with(eq(Visibility::Published), eq(1), eq(2))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(vec![article(3, "c", "")]));

    let all = list_all(&api, 2).await.expect("listing should succeed");
    let ids: Vec<i64> = all.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_list_all_clamps_page_size() {
    let mut api = MockArticleApi::new();
    api.expect_list_my_articles()
        .with(mockall::predicate::always(), eq(1), eq(1000))
        .times(2)
        .returning(|_, _, _| Ok(vec![]));
    assert!(list_all(&api, 50_000).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rate_limited_update_is_retried() {
    let mut api = MockArticleApi::new();
    let mut seq = Sequence::new();
    for _ in 0..2 {
        api.expect_update_article()
            .with(eq(7), eq("doc"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Err(ApiError::Status {
                    status: 429,
                    message: "Rate limit reached".to_string(),
                })
            });
    }
    api.expect_update_article()
        .with(eq(7), eq("doc"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|id, body| Ok(article(id, "t", body)));

    let updated = update_with_retry(&api, 7, "doc", Duration::ZERO)
        .await
        .expect("third attempt succeeds");
    assert_eq!(updated.body, "doc");
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_update_waits_between_attempts() {
    let mut api = MockArticleApi::new();
    let mut seq = Sequence::new();
    api.expect_update_article()
        .times(2)
        .in_sequence(&mut seq)
        .returning(|_, _| {
            Err(ApiError::Status {
                status: 429,
                message: "Rate limit reached".to_string(),
            })
        });
    api.expect_update_article()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|id, body| Ok(article(id, "t", body)));

    let started = tokio::time::Instant::now();
    update_with_retry(&api, 7, "doc", Duration::from_secs(1))
        .await
        .expect("third attempt succeeds");
    assert!(started.elapsed() >= Duration::from_secs(2));
}

#[tokio::test]
async fn test_other_errors_are_not_retried() {
    let mut api = MockArticleApi::new();
    api.expect_update_article().times(1).returning(|_, _| {
        Err(ApiError::Status {
            status: 422,
            message: "Unprocessable".to_string(),
        })
    });
    let err = update_with_retry(&api, 7, "doc", Duration::ZERO)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(422));
}

#[tokio::test]
async fn test_draft_makes_no_remote_update() {
    let mut draft = post("content/draft.md", "Draft", "devtoId: 1\ndevtoPublished: false");
    draft.draft = true;
    let content = content_with(vec![draft]);
    let mut api = api_listing(vec![article(1, "Draft", "")]);
    api.expect_update_article().never();

    let report = synchronise(&api, &content, &options(Mode::Push)).await.unwrap();
    assert_eq!(report.posts.len(), 1);
    assert!(matches!(
        report.posts[0].action,
        Action::Skip { reason: SkipReason::Draft }
    ));
    assert!(!report.has_errors());
}

#[tokio::test]
async fn test_unknown_id_is_probed_and_batch_continues() {
    let lost = post("content/lost.md", "Lost", "devtoId: 404\ndevtoPublished: false");
    let ok = post("content/ok.md", "Ok", "devtoId: 2\ndevtoPublished: false");
    let ok_doc = rendered(&ok);
    let content = content_with(vec![lost, ok]);
    let mut api = api_listing(vec![article(2, "Ok", &ok_doc)]);
    api.expect_get_article()
        .with(eq(404))
        .times(1)
        .returning(|_| {
            Err(ApiError::Status {
                status: 404,
                message: "Not Found".to_string(),
            })
        });
    api.expect_update_article().never();

    let report = synchronise(&api, &content, &options(Mode::Push)).await.unwrap();
    assert_eq!(report.error_count(), 1);

    let lost = &report.posts[0];
    assert_eq!(lost.path, PathBuf::from("content/lost.md"));
    match &lost.action {
        Action::Error(PostError::UnknownId { id, probe, title_match, .. }) => {
            assert_eq!(*id, 404);
            assert_eq!(probe, &Some(IdProbe::NotFound));
            assert!(title_match.is_none());
        }
        other => panic!("expected unknown id, got {other:?}"),
    }
    assert!(matches!(report.posts[1].action, Action::UpToDate { id: 2 }));
}

#[tokio::test]
async fn test_mapping_problems_count_as_errors() {
    let unmapped = post("content/unmapped.md", "Unmapped", "devtoPublished: false");
    let renamed = post("content/renamed.md", "Local", "devtoId: 1\ndevtoPublished: false");
    let content = content_with(vec![unmapped, renamed]);
    let mut api = api_listing(vec![article(1, "Remote", "")]);
    api.expect_update_article().never();

    let report = synchronise(&api, &content, &options(Mode::Push)).await.unwrap();
    assert!(matches!(
        report.posts[0].action,
        Action::MissingMapping { suggestion: None }
    ));
    assert!(matches!(report.posts[1].action, Action::TitleMismatch { .. }));
    assert_eq!(report.error_count(), 2);
    assert!(report.has_errors());
}

#[tokio::test]
async fn test_push_then_second_run_is_idempotent() {
    let p = post("content/p.md", "P", "devtoId: 5\ndevtoPublished: false");
    let doc = rendered(&p);

    let content = content_with(vec![p.clone()]);
    let mut api = api_listing(vec![article(5, "P", "stale\n")]);
    let expected = doc.clone();
    api.expect_update_article()
        .withf(move |id, body| *id == 5 && body == expected)
        .times(1)
        .returning(|id, body| Ok(article(id, "P", body)));

    let report = synchronise(&api, &content, &options(Mode::Push)).await.unwrap();
    let Action::Pushed { article: pushed, published } = &report.posts[0].action else {
        panic!("expected a push, got {:?}", report.posts[0].action);
    };
    assert_eq!(pushed.body, doc);
    assert!(!published);

    // The platform now holds the pushed body.
    let content = content_with(vec![p]);
    let mut api = api_listing(vec![article(5, "P", &doc)]);
    api.expect_update_article().never();
    let report = synchronise(&api, &content, &options(Mode::Push)).await.unwrap();
    assert!(matches!(report.posts[0].action, Action::UpToDate { id: 5 }));
}

#[tokio::test]
async fn test_push_failure_is_reported_per_post() {
    let p = post("content/p.md", "P", "devtoId: 5\ndevtoPublished: true");
    let content = content_with(vec![p]);
    let mut api = api_listing(vec![article(5, "P", "stale\n")]);
    api.expect_update_article().times(1).returning(|_, _| {
        Err(ApiError::Transport {
            path: "/api/articles/5".to_string(),
            message: "connection reset".to_string(),
        })
    });

    let report = synchronise(&api, &content, &options(Mode::Push)).await.unwrap();
    assert!(matches!(
        report.posts[0].action,
        Action::Error(PostError::Update { id: 5, .. })
    ));
}

#[tokio::test]
async fn test_listing_failure_aborts_run() {
    let content = content_with(vec![]);
    let mut api = MockArticleApi::new();
    api.expect_list_my_articles().returning(|_, _, _| {
        Err(ApiError::Status {
            status: 401,
            message: "unauthorized".to_string(),
        })
    });

    let err = synchronise(&api, &content, &options(Mode::Status)).await.unwrap_err();
    assert!(matches!(err, SyncError::ListArticles(_)));
}

#[tokio::test]
async fn test_push_records_url_in_front_matter() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("post.md");
    fs::write(&path, "---\ntitle: P\ndevtoId: 5\ndevtoPublished: true\n---\nHello\n").unwrap();

    let p = post(
        path.to_str().unwrap(),
        "P",
        "title: P\ndevtoId: 5\ndevtoPublished: true",
    );
    let content = content_with(vec![p]);
    let mut api = api_listing(vec![article(5, "P", "stale\n")]);
    api.expect_update_article()
        .times(1)
        .returning(|id, body| Ok(article(id, "P", body)));

    let mut opts = options(Mode::Push);
    opts.fields = FieldNames {
        url: Some("devtoUrl".to_string()),
        ..FieldNames::default()
    };
    let report = synchronise(&api, &content, &opts).await.unwrap();
    assert!(report.posts[0].warnings.is_empty());

    let written = fs::read_to_string(&path).unwrap();
    let (yaml, body) = front_matter::split(&written).unwrap();
    assert!(yaml.ends_with("devtoUrl: \"https://dev.to/mael/post-5\"\n"));
    assert_eq!(body, "Hello\n");
}

#[tokio::test]
async fn test_only_one_post() {
    let mut content = MockContentSource::new();
    content
        .expect_find_page()
        .with(eq("post"))
        .times(1)
        .returning(|_| Ok(post("content/post.md", "P", "devtoSkip: true")));
    content.expect_pages().never();
    let api = api_listing(vec![]);

    let mut opts = options(Mode::Status);
    opts.only = Some("post".to_string());
    let report = synchronise(&api, &content, &opts).await.unwrap();
    assert!(matches!(
        report.posts[0].action,
        Action::Skip { reason: SkipReason::SkipField }
    ));
}
