//! HTTP-level tests: routes, parameter sources, status codes and JSONP.
//!
//! Each test serves the router on an ephemeral local port over the shared
//! in-memory vocabulary and talks to it with a plain HTTP client.

#![cfg(feature = "server")]

mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{Value, json};
use url::Url;

use skos_reconcile::config::ServiceConfig;
use skos_reconcile::dispatch::Dispatcher;
use skos_reconcile::server::{ServerState, router};

use common::{CATS, DOWN, InMemoryVocabulary, SLOW};

const QUERIES: &str = r#"{"q0":{"query":"cats"},"q1":{"query":"pets"}}"#;

async fn spawn_server() -> SocketAddr {
    let dispatcher = Dispatcher::new(ServiceConfig::default(), InMemoryVocabulary::new());
    let state = Arc::new(ServerState::new(dispatcher));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router(state)).await.unwrap() });
    addr
}

fn url(addr: SocketAddr, path: &str, params: &[(&str, &str)]) -> Url {
    let mut url = Url::parse(&format!("http://{addr}{path}")).unwrap();
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params.iter().copied());
    }
    url
}

struct Reply {
    status: u16,
    content_type: String,
    body: String,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Issue one request off the async runtime. `form` sends a form-encoded body.
async fn send(method: &'static str, url: Url, form: Option<Vec<(&'static str, String)>>) -> Reply {
    tokio::task::spawn_blocking(move || {
        let request = ureq::request(method, url.as_str());
        let result = match &form {
            Some(pairs) => {
                let pairs: Vec<(&str, &str)> =
                    pairs.iter().map(|(k, v)| (*k, v.as_str())).collect();
                request.send_form(&pairs)
            }
            None => request.call(),
        };
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(e) => panic!("request failed: {e}"),
        };
        Reply {
            status: response.status(),
            content_type: response.content_type().to_string(),
            body: response.into_string().unwrap(),
        }
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn post_without_body_reads_query_string() {
    let addr = spawn_server().await;
    let target = url(addr, "/yso/en/reconcile", &[("queries", QUERIES), ("callback", "cb")]);

    let get = send("GET", target.clone(), None).await;
    let post = send("POST", target, None).await;

    assert_eq!(post.status, 200, "{}", post.body);
    assert_eq!(post.content_type, "text/javascript");
    assert!(post.body.starts_with("cb("), "{}", post.body);
    assert_eq!(post.body, get.body);
}

#[tokio::test(flavor = "multi_thread")]
async fn form_body_wins_over_query_string() {
    let addr = spawn_server().await;
    let target = url(
        addr,
        "/yso/en/reconcile",
        &[("queries", r#"{"q0":{"query":"nothing-matches"}}"#)],
    );
    let form = vec![("queries", r#"{"q0":{"query":"cats"}}"#.to_string())];

    let reply = send("POST", target, Some(form)).await;
    assert_eq!(reply.status, 200, "{}", reply.body);
    assert_eq!(reply.content_type, "application/json");
    let v = reply.json();
    assert_eq!(v["q0"]["result"][0]["id"], json!(CATS));
    assert_eq!(v["q0"]["result"][0]["score"], json!(1));
}

#[tokio::test(flavor = "multi_thread")]
async fn metadata_points_at_requesting_host() {
    let addr = spawn_server().await;
    let reply = send("GET", url(addr, "/yso/en/reconcile", &[]), None).await;
    assert_eq!(reply.status, 200, "{}", reply.body);
    let v = reply.json();
    assert_eq!(v["suggest"]["entity"]["service_url"], json!(format!("http://{addr}")));
    assert_eq!(
        v["preview"]["url"],
        json!(format!("http://{addr}/yso/en/reconcile/preview?id={{{{id}}}}"))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn failures_map_to_status_codes() {
    let addr = spawn_server().await;

    let bad = send("GET", url(addr, "/yso/en/reconcile", &[("queries", "{not json")]), None).await;
    assert_eq!(bad.status, 400);
    assert_eq!(bad.json()["status"], json!("error"));

    let bad_callback = send(
        "GET",
        url(addr, "/yso/en/reconcile", &[("callback", "alert(1)")]),
        None,
    )
    .await;
    assert_eq!(bad_callback.status, 400);
    assert_eq!(bad_callback.content_type, "application/json");

    let down = send("GET", url(addr, &format!("/{DOWN}/en/reconcile"), &[]), None).await;
    assert_eq!(down.status, 502);

    let slow = send("GET", url(addr, &format!("/{SLOW}/en/reconcile"), &[]), None).await;
    assert_eq!(slow.status, 504);
}

#[tokio::test(flavor = "multi_thread")]
async fn error_bodies_are_wrapped_for_valid_callbacks() {
    let addr = spawn_server().await;
    let reply = send(
        "GET",
        url(addr, &format!("/{DOWN}/en/reconcile"), &[("callback", "cb")]),
        None,
    )
    .await;
    assert_eq!(reply.status, 502);
    assert_eq!(reply.content_type, "text/javascript");
    assert!(reply.body.starts_with("cb({\"status\":\"error\""), "{}", reply.body);
}

#[tokio::test(flavor = "multi_thread")]
async fn suggest_and_propose_routes() {
    let addr = spawn_server().await;

    let suggest = send(
        "GET",
        url(addr, "/yso/en/reconcile/suggest/entity", &[("prefix", "bre")]),
        None,
    )
    .await;
    assert_eq!(suggest.status, 200, "{}", suggest.body);
    assert_eq!(suggest.json()["result"].as_array().unwrap().len(), 20);

    let propose = send(
        "GET",
        url(addr, "/yso/en/reconcile/propose_properties", &[("limit", "2")]),
        None,
    )
    .await;
    assert_eq!(propose.status, 200, "{}", propose.body);
    assert_eq!(propose.json()["properties"].as_array().unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn preview_is_html() {
    let addr = spawn_server().await;
    let reply = send("GET", url(addr, "/yso/fi/reconcile/preview", &[("id", CATS)]), None).await;
    assert_eq!(reply.status, 200, "{}", reply.body);
    assert_eq!(reply.content_type, "text/html");
    assert!(reply.body.contains("kissat"), "{}", reply.body);

    let missing = send("GET", url(addr, "/yso/fi/reconcile/preview", &[]), None).await;
    assert_eq!(missing.status, 400);
}

#[tokio::test(flavor = "multi_thread")]
async fn health_reports_ok() {
    let addr = spawn_server().await;
    let reply = send("GET", url(addr, "/health", &[]), None).await;
    assert_eq!(reply.status, 200);
    let v = reply.json();
    assert_eq!(v["status"], json!("ok"));
    assert_eq!(v["version"], json!(env!("CARGO_PKG_VERSION")));
}
