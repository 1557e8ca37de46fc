mod common;

use common::{TestApp, PER_PAGE};
use pretty_assertions::assert_eq;

const SECOND_PAGE: usize = 3;
const ALL_POSTS: usize = PER_PAGE as usize + SECOND_PAGE;

async fn app_with_posts() -> TestApp {
    let app = TestApp::new().await;
    let user = app.create_user("testuser").await;
    let group = app.create_group("Test group", "test_slug").await;
    for n in 0..ALL_POSTS {
        app.create_post(&user, &format!("Post number {n}"), Some(&group))
            .await;
    }
    app
}

fn page_len(context: &serde_json::Value) -> usize {
    context["page"]["object_list"].as_array().unwrap().len()
}

#[tokio::test]
async fn every_feed_is_split_into_pages() {
    let app = app_with_posts().await;

    for feed in ["/", "/group/test_slug/", "/profile/testuser/"] {
        let first = app.get(feed, None).await.json();
        assert_eq!(page_len(&first), PER_PAGE as usize, "{feed}");
        assert_eq!(first["page"]["num_pages"], 2);
        assert_eq!(first["page"]["has_next"], true);

        let second = app.get(&format!("{feed}?page=2"), None).await.json();
        assert_eq!(page_len(&second), SECOND_PAGE, "{feed}");
        assert_eq!(second["page"]["has_next"], false);
        assert_eq!(second["page"]["has_previous"], true);
    }
}

#[tokio::test]
async fn newest_posts_come_first() {
    let app = app_with_posts().await;

    let context = app.get("/group/test_slug/", None).await.json();
    let last = ALL_POSTS - 1;
    assert_eq!(
        context["page"]["object_list"][0]["text"],
        format!("Post number {last}")
    );
}

#[tokio::test]
async fn out_of_range_pages_fall_back_to_the_last_page() {
    let app = app_with_posts().await;

    for page in ["3", "100", "0", "-1"] {
        let context = app
            .get(&format!("/profile/testuser/?page={page}"), None)
            .await
            .json();
        assert_eq!(context["page"]["number"], 2, "page={page}");
        assert_eq!(page_len(&context), SECOND_PAGE);
    }
}

#[tokio::test]
async fn garbage_pages_fall_back_to_the_first_page() {
    let app = app_with_posts().await;

    for page in ["abc", "", "1.5"] {
        let context = app
            .get(&format!("/group/test_slug/?page={page}"), None)
            .await
            .json();
        assert_eq!(context["page"]["number"], 1, "page={page}");
        assert_eq!(page_len(&context), PER_PAGE as usize);
    }
}

#[tokio::test]
async fn empty_feed_has_one_empty_page() {
    let app = TestApp::new().await;
    app.create_group("Empty", "empty").await;

    let context = app.get("/group/empty/?page=7", None).await.json();
    assert_eq!(context["page"]["number"], 1);
    assert_eq!(context["page"]["num_pages"], 1);
    assert_eq!(page_len(&context), 0);
}
