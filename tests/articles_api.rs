//! End-to-end tests: real server, real HTTP client, mock suggestions backend.

mod common;

use std::time::{Duration, Instant};

use serde_json::{json, Value};

use common::{
    start_delayed_backend, start_programmable_backend, start_service, start_service_with,
    start_suggestions_backend,
};

const SNAPSHOT: &str = r#"{
    "a": {"id": "a", "author": "Ann", "title": "Alpha", "text": "first"},
    "b": {"id": "b", "author": "Bob", "title": "Beta", "text": "second"},
    "c": {"id": "c", "author": "Cid", "title": "Gamma", "text": "third"}
}"#;

const TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";

async fn get(url: &str) -> (u16, String, Value) {
    let res = reqwest::get(url).await.unwrap();
    let status = res.status().as_u16();
    let content_type = res
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = res.text().await.unwrap();
    assert!(body.ends_with('\n'), "body without trailing newline: {body:?}");
    (status, content_type, serde_json::from_str(&body).unwrap())
}

#[tokio::test]
async fn test_get_article() {
    let backend = start_suggestions_backend(&[]).await;
    let service = start_service(SNAPSHOT, &backend.url()).await;

    let (status, content_type, body) = get(&service.url("/articles/v1/a/")).await;
    assert_eq!(status, 200);
    assert_eq!(content_type, "application/json; charset=utf-8");
    assert_eq!(
        body,
        json!({"article": {"id": "a", "author": "Ann", "title": "Alpha", "text": "first"}})
    );
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_article_is_404() {
    let backend = start_suggestions_backend(&[]).await;
    let service = start_service(SNAPSHOT, &backend.url()).await;

    let (status, _, body) = get(&service.url("/articles/v1/zzz/?with_suggested=true")).await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "article `zzz` was not found"}));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_suggestions_follow_gateway_order() {
    let backend = start_suggestions_backend(&[("a", &["c", "b"])]).await;
    let service = start_service(SNAPSHOT, &backend.url()).await;

    let (status, _, body) = get(&service.url("/articles/v1/a/?with_suggested=1")).await;
    assert_eq!(status, 200);

    let suggested: Vec<&str> = body["article"]["suggested"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(suggested, vec!["c", "b"]);

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/suggestions/v1/a");
}

#[tokio::test]
async fn test_trace_context_is_forwarded_upstream() {
    let backend = start_suggestions_backend(&[("a", &["b"])]).await;
    let service = start_service(SNAPSHOT, &backend.url()).await;

    let inbound = format!("00-{}-00f067aa0ba902b7-01", TRACE_ID);
    let res = reqwest::Client::new()
        .get(service.url("/articles/v1/a/?with_suggested=true"))
        .header("traceparent", inbound)
        .header("tracestate", "vendor=value")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);

    let requests = backend.requests();
    let forwarded = requests[0].headers.get("traceparent").unwrap();
    let parts: Vec<&str> = forwarded.split('-').collect();
    assert_eq!(parts.len(), 4);
    assert_eq!(parts[1], TRACE_ID);
    assert_ne!(parts[2], "00f067aa0ba902b7");
    assert_eq!(requests[0].headers.get("tracestate").map(String::as_str), Some("vendor=value"));

    // Every span of the request belongs to the caller's trace.
    assert!(service.tracer.spans().iter().all(|s| s.trace_id == TRACE_ID));
}

#[tokio::test]
async fn test_missing_suggested_article_is_404() {
    let backend = start_suggestions_backend(&[("a", &["b", "ghost"])]).await;
    let service = start_service(SNAPSHOT, &backend.url()).await;

    let (status, _, body) = get(&service.url("/articles/v1/a/?with_suggested=true")).await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "article `ghost` was not found"}));
}

#[tokio::test]
async fn test_upstream_error_body_is_reported_with_200() {
    let backend = start_suggestions_backend(&[]).await;
    let service = start_service(SNAPSHOT, &backend.url()).await;

    let (status, _, body) = get(&service.url("/articles/v1/a/?with_suggested=true")).await;
    assert_eq!(status, 200);
    assert!(body.get("article").is_none());
    assert!(body["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_malformed_upstream_body() {
    let backend = start_programmable_backend(|_| (200, "not json".to_string())).await;
    let service = start_service(SNAPSHOT, &backend.url()).await;

    let (status, _, body) = get(&service.url("/articles/v1/a/?with_suggested=true")).await;
    assert_eq!(status, 200);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unreachable_suggestions_service() {
    // Bind then drop, leaving a port nobody listens on.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let service = start_service(SNAPSHOT, &format!("http://{}", addr)).await;

    let (status, _, body) = get(&service.url("/articles/v1/a/?with_suggested=true")).await;
    assert_eq!(status, 200);
    assert!(body["error"].is_string());

    let (status, _, body) = get(&service.url("/articles/v1/a/")).await;
    assert_eq!(status, 200);
    assert_eq!(body["article"]["id"], "a");
}

#[tokio::test]
async fn test_list_articles_with_suggestions() {
    let backend =
        start_suggestions_backend(&[("a", &["b"]), ("b", &["c", "a"]), ("c", &["a"])]).await;
    let service = start_service(SNAPSHOT, &backend.url()).await;

    let (status, _, body) = get(&service.url("/articles/v1/?with_suggested=True")).await;
    assert_eq!(status, 200);

    let articles = body["articles"].as_array().unwrap();
    assert_eq!(articles.len(), 3);
    for article in articles {
        assert!(!article["suggested"].as_array().unwrap().is_empty());
    }
    assert_eq!(backend.requests().len(), 3);
}

#[tokio::test]
async fn test_list_articles_single_failure_fails_batch() {
    let backend = start_suggestions_backend(&[("a", &["b"]), ("b", &["c"])]).await;
    let service = start_service(SNAPSHOT, &backend.url()).await;

    let (status, _, body) = get(&service.url("/articles/v1/?with_suggested=true")).await;
    assert_eq!(status, 200);
    assert!(body.get("articles").is_none());
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_list_articles_plain_ignores_bad_flag() {
    let backend = start_suggestions_backend(&[]).await;
    let service = start_service(SNAPSHOT, &backend.url()).await;

    let (status, _, body) = get(&service.url("/articles/v1/?with_suggested=yes")).await;
    assert_eq!(status, 200);
    let articles = body["articles"].as_array().unwrap();
    assert_eq!(articles.len(), 3);
    assert!(articles.iter().all(|a| a.get("suggested").is_none()));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_slow_upstream_hits_request_deadline() {
    let backend = start_delayed_backend(Duration::from_secs(10), |_| (200, r#"["b"]"#.to_string())).await;
    let service = start_service_with(SNAPSHOT, &backend.url(), |config| {
        config.timeouts.request_secs = 1;
        config.suggestions.timeout_secs = 30;
    })
    .await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let started = Instant::now();
    let res = client
        .get(service.url("/articles/v1/a/?with_suggested=true"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"error": "request deadline exceeded"}));
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(backend.requests().len(), 1);
}
