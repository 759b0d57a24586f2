//! Contract Test: Publisher HTTP surface
//!
//! Exercises the serving state machine over a real file-backed fact store:
//! each request re-reads disk, absence maps to 503, malformed content maps
//! to 500, and the liveness route stays up regardless of fact state.

use std::net::IpAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use ipbeacon_core::config::AddressFamily;
use ipbeacon_core::fact::{FileFactStore, MemoryFactStore};
use ipbeacon_server::router;

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn end_to_end_publish_update_remove() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("myip.txt");
    let facts = FileFactStore::new(&path, AddressFamily::V4);
    let app = router(Arc::new(facts.clone()));

    // Publish, serve
    facts.publish("203.0.113.42".parse().unwrap()).await.unwrap();
    let (status, body) = get(&app, "/ip").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "203.0.113.42");

    // Overwrite, serve the new value: no stale in-memory copy
    facts.publish("198.51.100.99".parse().unwrap()).await.unwrap();
    let (status, body) = get(&app, "/ip").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "198.51.100.99");

    // Remove: reserved "never published" status, not a generic error
    std::fs::remove_file(&path).unwrap();
    let (status, _) = get(&app, "/ip").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn missing_fact_is_503_not_500() {
    let dir = tempfile::tempdir().unwrap();
    let facts = FileFactStore::new(dir.path().join("myip.txt"), AddressFamily::V4);
    let app = router(Arc::new(facts));

    let (status, body) = get(&app, "/ip").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, "IP address not available");
}

#[tokio::test]
async fn malformed_fact_is_500_never_200() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("myip.txt");
    let app = router(Arc::new(FileFactStore::new(&path, AddressFamily::V4)));

    for content in ["", "not-an-ip", "999.999.999.999"] {
        std::fs::write(&path, content).unwrap();
        let (status, body) = get(&app, "/ip").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "content {content:?}");
        assert!(body.parse::<IpAddr>().is_err(), "must not leak invalid content");
    }
}

#[tokio::test]
async fn root_serves_the_ip_too() {
    let facts = MemoryFactStore::new(AddressFamily::V4);
    facts.publish("203.0.113.42".parse().unwrap()).await;
    let app = router(Arc::new(facts));

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "203.0.113.42");
}

#[tokio::test]
async fn health_is_up_regardless_of_fact_state() {
    let facts = MemoryFactStore::new(AddressFamily::V4);
    let app = router(Arc::new(facts.clone()));

    // No fact
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    // Malformed fact: liveness is independent of fact state
    facts.set_raw("garbage").await;
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn ip_responses_are_readable_from_any_origin() {
    // The published IP is non-secret; browser callers on any origin may
    // read it.
    let facts = MemoryFactStore::new(AddressFamily::V4);
    facts.publish("203.0.113.42".parse().unwrap()).await;
    let app = router(Arc::new(facts));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ip")
                .header("origin", "https://dashboard.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .expect("CORS header present"),
        "*"
    );
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let app = router(Arc::new(MemoryFactStore::new(AddressFamily::V4)));
    let (status, _) = get(&app, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ipv6_served_under_any_family_policy() {
    let facts = MemoryFactStore::new(AddressFamily::Any);
    facts.publish("2001:db8::1".parse().unwrap()).await;
    let app = router(Arc::new(facts));

    let (status, body) = get(&app, "/ip").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "2001:db8::1");
}
