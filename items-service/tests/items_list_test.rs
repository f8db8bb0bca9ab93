mod common;

use axum::http::StatusCode;
use common::{get, names, router, seed, send};
use items_service::services::InMemoryItemStore;
use items_service::startup::{build_router, AppState};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn empty_store_lists_empty_array() {
    let app = router(Arc::new(InMemoryItemStore::new()));

    let (status, body) = send(&app, get("/items")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn items_are_newest_first_by_default() {
    let store = Arc::new(InMemoryItemStore::new());
    seed(&store, &["first", "second", "third"]).await;
    let app = router(store);

    let (status, body) = send(&app, get("/items")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["third", "second", "first"]);

    let item = &body[0];
    assert_eq!(item["id"].as_str().unwrap().len(), 24);
    assert_eq!(item["created_at"], "2024-01-01T00:00:02.000Z");
}

#[tokio::test]
async fn q_longer_than_fifty_characters_is_rejected_without_query() {
    let store = Arc::new(InMemoryItemStore::new());
    let app = router(store.clone());
    let q = "a".repeat(51);

    let (status, body) = send(&app, get(&format!("/items?q={}", q))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "q too long" }));
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn limit_is_clamped_and_malformed_values_ignored() {
    let store = Arc::new(InMemoryItemStore::new());
    let many: Vec<String> = (0..120).map(|i| format!("item-{:03}", i)).collect();
    let many: Vec<&str> = many.iter().map(String::as_str).collect();
    seed(&store, &many).await;
    let app = router(store);

    let (_, body) = send(&app, get("/items?limit=500")).await;
    assert_eq!(body.as_array().unwrap().len(), 100);

    let (_, body) = send(&app, get("/items?limit=0")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, get("/items?limit=-3")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, get("/items?limit=lots&page=first")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn repeated_parameters_use_the_first_value() {
    let store = Arc::new(InMemoryItemStore::new());
    seed(&store, &["banana", "apple", "cherry"]).await;
    let app = router(store);

    let (status, body) = send(&app, get("/items?limit=1&limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["cherry"]);

    let (status, body) = send(&app, get("/items?sort=name&sort=bogus&order=asc")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["apple", "banana", "cherry"]);

    let (status, body) = send(&app, get("/items?order=asc&order=desc&order=asc")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["banana", "apple", "cherry"]);
}

#[tokio::test]
async fn unknown_parameters_are_ignored() {
    let store = Arc::new(InMemoryItemStore::new());
    seed(&store, &["apple"]).await;
    let app = router(store);

    let (status, body) = send(&app, get("/items?colour=red&limit")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["apple"]);
}

#[tokio::test]
async fn pages_are_offset_by_limit() {
    let store = Arc::new(InMemoryItemStore::new());
    let many: Vec<String> = (0..25).map(|i| format!("n{:02}", i)).collect();
    let many: Vec<&str> = many.iter().map(String::as_str).collect();
    seed(&store, &many).await;
    let app = router(store);

    let (_, body) = send(&app, get("/items?sort=name&order=asc&limit=10&page=2")).await;
    assert_eq!(names(&body).first().map(String::as_str), Some("n10"));
    assert_eq!(body.as_array().unwrap().len(), 10);

    let (_, body) = send(&app, get("/items?sort=name&order=asc&limit=10&page=3")).await;
    assert_eq!(names(&body), vec!["n20", "n21", "n22", "n23", "n24"]);

    let (status, body) = send(&app, get("/items?limit=10&page=4")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn sort_by_name_in_either_direction() {
    let store = Arc::new(InMemoryItemStore::new());
    seed(&store, &["banana", "apple", "cherry"]).await;
    let app = router(store);

    let (_, body) = send(&app, get("/items?sort=name&order=asc")).await;
    assert_eq!(names(&body), vec!["apple", "banana", "cherry"]);

    let (_, body) = send(&app, get("/items?sort=name")).await;
    assert_eq!(names(&body), vec!["cherry", "banana", "apple"]);
}

#[tokio::test]
async fn unknown_sort_field_falls_back_to_created_at() {
    let store = Arc::new(InMemoryItemStore::new());
    seed(&store, &["banana", "apple", "cherry"]).await;
    let app = router(store);

    let (_, body) = send(&app, get("/items?sort=_id&order=asc")).await;
    assert_eq!(names(&body), vec!["banana", "apple", "cherry"]);
}

#[tokio::test]
async fn q_is_a_case_insensitive_prefix() {
    let store = Arc::new(InMemoryItemStore::new());
    seed(&store, &["Widget", "widgetry", "gadget", "my widget"]).await;
    let app = router(store);

    let (_, body) = send(&app, get("/items?q=WIDG&sort=name&order=asc")).await;
    assert_eq!(names(&body), vec!["Widget", "widgetry"]);
}

#[tokio::test]
async fn q_metacharacters_match_literally() {
    let store = Arc::new(InMemoryItemStore::new());
    seed(&store, &["a.b*c", "A.B* upper", "axb", "abbb", "a.bbb"]).await;
    let app = router(store);

    let (status, body) = send(&app, get("/items?q=a.b*&sort=name&order=asc")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["A.B* upper", "a.b*c"]);
}

#[tokio::test]
async fn q_with_regex_syntax_does_not_break_the_query() {
    let store = Arc::new(InMemoryItemStore::new());
    seed(&store, &["(x+)?", "xxx"]).await;
    let app = router(store);

    // "(x+)?" percent-encoded
    let (status, body) = send(&app, get("/items?q=%28x%2B%29%3F")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["(x+)?"]);
}

#[tokio::test(start_paused = true)]
async fn request_timeout_answers_with_json() {
    let store = Arc::new(InMemoryItemStore::with_latency(Duration::from_secs(5)));
    let app = build_router(AppState::new(store), Duration::from_secs(1));

    let (status, body) = send(&app, get("/items")).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body, json!({ "error": "request timed out after 1000ms" }));
}

#[tokio::test]
async fn store_failure_is_an_internal_error() {
    let store = Arc::new(InMemoryItemStore::new());
    store.set_unreachable(true);
    let app = router(store);

    let (status, body) = send(&app, get("/items")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "server selection timeout: no available servers");
}
