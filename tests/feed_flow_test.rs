//! Integration tests for the feed screen against a mock backend.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;
use trashtag_lka::config::{BackendMode, Config};
use trashtag_lka::error::ActionError;
use trashtag_lka::gateway::RestGateway;
use trashtag_lka::screens::feed::FeedScreen;
use trashtag_lka::screens::{AppContext, DataSource, FixedClock};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(base_url: &str, demo_mode: bool) -> Config {
    Config {
        backend: BackendMode::Rest {
            url: base_url.to_string(),
            anon_key: "anon-key".to_string(),
        },
        demo_mode,
        ..Config::for_testing()
    }
}

fn context(server: &MockServer, demo_mode: bool, token: Option<&str>) -> AppContext {
    let config = create_test_config(&server.uri(), demo_mode);
    let mut gateway = RestGateway::new(&config).unwrap();
    if let Some(token) = token {
        gateway = gateway.with_access_token(token);
    }
    AppContext::new(Arc::new(gateway), config).with_clock(Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
    )))
}

/// Two posts, newest first; the second author has no profile.
fn posts_body() -> serde_json::Value {
    json!([
        {
            "id": "p1",
            "user_id": "u2",
            "image_url": "https://cdn.example.com/p1.jpg",
            "caption": "Beach is clean again",
            "location": "Unawatuna Beach",
            "hashtags": ["#TrashTagLKA"],
            "likes_count": 4,
            "comments_count": 2,
            "is_before_photo": false,
            "created_at": "2024-01-15T11:15:00+00:00",
            "profiles": {"name": "Maya S.", "avatar_url": null}
        },
        {
            "id": "p2",
            "user_id": "u3",
            "image_url": "https://cdn.example.com/p2.jpg",
            "caption": "Before shot",
            "location": null,
            "likes_count": 1,
            "is_before_photo": true,
            "created_at": "2024-01-14T09:00:00+00:00",
            "profiles": null
        }
    ])
}

async fn mount_session(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u1"})))
        .mount(server)
        .await;
}

async fn mount_posts(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts_body()))
        .mount(server)
        .await;
}

async fn mount_likes(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/post_likes"))
        .and(query_param("user_id", "eq.u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"post_id": "p2"}])))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_load_maps_rows_and_likes() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_posts(&server).await;
    mount_likes(&server).await;

    let mut screen = FeedScreen::new(context(&server, true, Some("tok")));
    screen.load().await.unwrap();

    assert_eq!(screen.source(), Some(DataSource::Remote));
    let posts = screen.posts();
    assert_eq!(posts.len(), 2);

    assert_eq!(posts[0].author.name, "Maya S.");
    assert_eq!(
        posts[0].author.avatar_url,
        "https://via.placeholder.com/50x50/ffd300/000?text=M"
    );
    assert!(!posts[0].user_has_liked);
    assert_eq!(screen.time_label(&posts[0]), "45m ago");

    assert_eq!(posts[1].author.name, "Anonymous User");
    assert!(posts[1].user_has_liked);
    assert_eq!(posts[1].badge(), "BEFORE");
    assert_eq!(posts[1].location, "");
    assert_eq!(screen.time_label(&posts[1]), "1d ago");
}

#[tokio::test]
async fn test_anonymous_load_skips_likes() {
    let server = MockServer::start().await;
    mount_posts(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/post_likes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let mut screen = FeedScreen::new(context(&server, true, None));
    screen.load().await.unwrap();
    assert!(screen.posts().iter().all(|p| !p.user_has_liked));
}

#[tokio::test]
async fn test_backend_failure_uses_demo_posts_or_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut demo = FeedScreen::new(context(&server, true, None));
    demo.load().await.unwrap();
    assert_eq!(demo.source(), Some(DataSource::Fallback));
    assert_eq!(demo.posts().len(), 3);

    let mut strict = FeedScreen::new(context(&server, false, None));
    let err = strict.load().await.unwrap_err();
    assert_eq!(err.alert().message, "Failed to load posts");
    assert!(strict.posts().is_empty());
}

#[tokio::test]
async fn test_like_is_persisted() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_posts(&server).await;
    mount_likes(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/post_likes"))
        .and(body_json(json!({"post_id": "p1", "user_id": "u1"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/posts"))
        .and(query_param("id", "eq.p1"))
        .and(body_json(json!({"likes_count": 5})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut screen = FeedScreen::new(context(&server, true, Some("tok")));
    screen.load().await.unwrap();

    assert!(screen.toggle_like("p1").await.unwrap());
    let post = screen.post("p1").unwrap();
    assert!(post.user_has_liked);
    assert_eq!(post.likes_count, 5);
}

#[tokio::test]
async fn test_unlike_deletes_pair() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_posts(&server).await;
    mount_likes(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/post_likes"))
        .and(query_param("post_id", "eq.p2"))
        .and(query_param("user_id", "eq.u1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/posts"))
        .and(body_json(json!({"likes_count": 0})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut screen = FeedScreen::new(context(&server, true, Some("tok")));
    screen.load().await.unwrap();

    assert!(!screen.toggle_like("p2").await.unwrap());
    assert_eq!(screen.post("p2").unwrap().likes_count, 0);
}

#[tokio::test]
async fn test_failed_like_rolls_back() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_posts(&server).await;
    mount_likes(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/post_likes"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/posts"))
        .respond_with(ResponseTemplate::new(500).set_body_string("counter update failed"))
        .mount(&server)
        .await;

    let mut screen = FeedScreen::new(context(&server, true, Some("tok")));
    screen.load().await.unwrap();

    let err = screen.toggle_like("p1").await.unwrap_err();
    assert!(matches!(err, ActionError::Backend { .. }));
    assert_eq!(err.alert().message, "Failed to update like");

    let post = screen.post("p1").unwrap();
    assert!(!post.user_has_liked);
    assert_eq!(post.likes_count, 4);
}

#[tokio::test]
async fn test_like_without_session_rolls_back() {
    let server = MockServer::start().await;
    mount_posts(&server).await;

    let mut screen = FeedScreen::new(context(&server, true, None));
    screen.load().await.unwrap();

    let err = screen.toggle_like("p1").await.unwrap_err();
    assert_eq!(err.alert().message, "Please log in to like posts");
    assert_eq!(screen.post("p1").unwrap().likes_count, 4);
}
