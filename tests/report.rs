use std::path::PathBuf;

use blogsync::cli::ensure_synchronised;
use blogsync::report::{list_line, post_lines, Level};
use blogsync_core::contract::RemoteArticle;
use blogsync_core::error::{PostError, TitleMatch};
use blogsync_core::reconcile::{Action, FieldNames, SkipReason};
use blogsync_core::synchronise::{PostReport, SyncReport};

fn report(action: Action) -> PostReport {
    PostReport {
        path: PathBuf::from("content/post.md"),
        title: "Post".to_string(),
        action,
        warnings: vec![],
    }
}

fn article(published: bool) -> RemoteArticle {
    RemoteArticle {
        id: 3,
        title: "Post".to_string(),
        body: String::new(),
        published,
        url: "https://dev.to/mael/post-3".to_string(),
    }
}

#[test]
fn test_draft_is_silent() {
    let lines = post_lines(
        &report(Action::Skip { reason: SkipReason::Draft }),
        &FieldNames::default(),
    );
    assert!(lines.is_empty());
}

#[test]
fn test_missing_mapping_line() {
    let lines = post_lines(
        &report(Action::MissingMapping {
            suggestion: Some(TitleMatch {
                id: 3,
                edit_url: "https://dev.to/mael/post-3/edit".to_string(),
            }),
        }),
        &FieldNames::default(),
    );
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].level, Level::Error);
    assert_eq!(
        lines[0].text,
        "content/post.md: missing devtoId field in front matter, might be 3: https://dev.to/mael/post-3/edit"
    );
}

#[test]
fn test_pushed_line_uses_edit_url_when_unpublished() {
    let lines = post_lines(
        &report(Action::Pushed {
            article: article(false),
            published: false,
        }),
        &FieldNames::default(),
    );
    assert_eq!(lines[0].level, Level::Success);
    assert_eq!(
        lines[0].text,
        "content/post.md pushed unpublished to https://dev.to/mael/post-3/edit (devtoId: 3, devtoPublished: false)"
    );
}

#[test]
fn test_error_line() {
    let lines = post_lines(
        &report(Action::Error(PostError::MissingPublished {
            field: "devtoPublished".to_string(),
        })),
        &FieldNames::default(),
    );
    assert_eq!(lines[0].level, Level::Error);
    assert_eq!(lines[0].text, "content/post.md: missing devtoPublished field");
}

#[test]
fn test_list_line() {
    assert_eq!(
        list_line(&article(true)),
        "3: published at https://dev.to/mael/post-3 (Post)"
    );
    assert_eq!(
        list_line(&article(false)),
        "3: unpublished at https://dev.to/mael/post-3/edit (Post)"
    );
}

#[test]
fn test_title_mismatch_fails_the_run() {
    let report = SyncReport {
        posts: vec![
            report(Action::UpToDate { id: 3 }),
            report(Action::TitleMismatch {
                remote_title: "Remote".to_string(),
                local_title: "Post".to_string(),
                edit_url: "https://dev.to/mael/post-3/edit".to_string(),
            }),
        ],
    };
    let err = ensure_synchronised(&report).unwrap_err();
    assert_eq!(err.to_string(), "1 post(s) could not be synchronised");
}

#[test]
fn test_clean_run_succeeds() {
    let report = SyncReport {
        posts: vec![
            report(Action::UpToDate { id: 3 }),
            report(Action::Skip { reason: SkipReason::Draft }),
        ],
    };
    assert!(ensure_synchronised(&report).is_ok());
}
