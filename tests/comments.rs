mod common;

use axum::http::StatusCode;
use common::{count_rows, TestApp};
use pretty_assertions::assert_eq;
use quill::{db, forms};

#[tokio::test]
async fn comment_is_attached_to_the_post() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let reader = app.create_user("reader").await;
    let post_id = app.create_post(&author, "Test post", None).await;

    let response = app
        .post_form(
            &format!("/posts/{post_id}/comment/"),
            "text=Great+read",
            Some(&app.session(&reader)),
        )
        .await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some(format!("/posts/{post_id}/").as_str()));

    let comments = db::list_comments(app.pool(), post_id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Great read");
    assert_eq!(comments[0].author, "reader");
}

#[tokio::test]
async fn posting_to_the_detail_page_comments_too() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let post_id = app.create_post(&author, "Test post", None).await;

    let response = app
        .post_form(
            &format!("/posts/{post_id}/"),
            "text=Replying+to+myself",
            Some(&app.session(&author)),
        )
        .await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(count_rows(app.pool(), "comments").await, 1);
}

#[tokio::test]
async fn blank_comment_is_shown_back_with_an_error() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let post_id = app.create_post(&author, "Test post", None).await;

    let response = app
        .post_form(
            &format!("/posts/{post_id}/comment/"),
            "text=%20%20",
            Some(&app.session(&author)),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let context = response.json();
    assert_eq!(context["post"]["id"], post_id);
    assert_eq!(context["form"]["errors"]["text"][0], forms::REQUIRED);
    assert_eq!(count_rows(app.pool(), "comments").await, 0);
}

#[tokio::test]
async fn guests_cannot_comment() {
    let app = TestApp::new().await;
    let author = app.create_user("author").await;
    let post_id = app.create_post(&author, "Test post", None).await;
    let uri = format!("/posts/{post_id}/comment/");

    let response = app.post_form(&uri, "text=Anonymous", None).await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        response.location(),
        Some(format!("/auth/login/?next={uri}").as_str())
    );
    assert_eq!(count_rows(app.pool(), "comments").await, 0);
}

#[tokio::test]
async fn commenting_on_a_missing_post_is_not_found() {
    let app = TestApp::new().await;
    let reader = app.create_user("reader").await;

    let response = app
        .post_form("/posts/404/comment/", "text=Hello", Some(&app.session(&reader)))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
