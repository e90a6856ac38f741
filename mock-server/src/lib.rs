//! Scripted HTTP server used as the remote end in integration tests.
//!
//! Each route produces one kind of outcome the client pipeline has to
//! handle: JSON and non-JSON bodies, arbitrary statuses, redirects,
//! malformed JSON, query filtering, request echoing, and replies that stall
//! long enough to trip a client timeout.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// How long `/flaky` stalls a request it has been told to fail.
pub const FLAKY_STALL: Duration = Duration::from_secs(2);

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    #[serde(rename = "postId")]
    pub post_id: u32,
    pub id: u32,
    pub name: String,
    pub email: String,
    pub body: String,
}

/// What `/echo` saw of the request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
}

#[derive(Deserialize)]
pub struct CommentFilter {
    #[serde(rename = "postId")]
    pub post_id: Option<u32>,
}

#[derive(Clone, Default)]
pub struct AppState {
    flaky_hits: Arc<AtomicU32>,
}

pub fn app() -> Router {
    Router::new()
        .route("/json", get(json))
        .route("/xml", get(xml))
        .route("/malformed", get(malformed))
        .route("/status/{code}", get(status))
        .route("/redirect", get(redirect))
        .route("/comments", get(comments))
        .route("/echo", any(echo))
        .route("/flaky/{failures}", get(flaky))
        .route("/flaky-hits", get(flaky_hits))
        .with_state(AppState::default())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

async fn json() -> impl IntoResponse {
    Json(serde_json::json!({ "key": "value" }))
}

async fn xml() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/xml")], "<key>value</key>")
}

async fn malformed() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], r#"{"key";"value"}"#)
}

async fn status(Path(code): Path<u16>) -> impl IntoResponse {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, [(header::CONTENT_TYPE, "application/json")], "{}")
}

/// A 302 with a real `Location`, pointing at a route that would succeed.
async fn redirect() -> impl IntoResponse {
    (
        StatusCode::FOUND,
        [(header::LOCATION, "/json"), (header::CONTENT_TYPE, "application/json")],
        "{}",
    )
}

async fn comments(Query(filter): Query<CommentFilter>) -> Json<Vec<Comment>> {
    let all = seed_comments();
    Json(match filter.post_id {
        Some(post_id) => all.into_iter().filter(|c| c.post_id == post_id).collect(),
        None => all,
    })
}

async fn echo(method: Method, RawQuery(query): RawQuery, headers: HeaderMap) -> Json<Echo> {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
        .collect();
    Json(Echo {
        method: method.as_str().to_string(),
        query,
        headers,
    })
}

async fn flaky(State(state): State<AppState>, Path(failures): Path<u32>) -> impl IntoResponse {
    let hit = state.flaky_hits.fetch_add(1, Ordering::SeqCst) + 1;
    if hit <= failures {
        tracing::debug!(hit, failures, "stalling flaky request");
        tokio::time::sleep(FLAKY_STALL).await;
    }
    Json(serde_json::json!({ "key": "recovered" }))
}

async fn flaky_hits(State(state): State<AppState>) -> Json<u32> {
    Json(state.flaky_hits.load(Ordering::SeqCst))
}

fn seed_comments() -> Vec<Comment> {
    [(1, 1, "id labore ex et quam laborum"), (1, 2, "quo vero reiciendis velit"), (2, 3, "odio adipisci rerum aut")]
        .into_iter()
        .map(|(post_id, id, name)| Comment {
            post_id,
            id,
            name: name.to_string(),
            email: format!("user{id}@example.com"),
            body: format!("comment {id} on post {post_id}"),
        })
        .collect()
}
