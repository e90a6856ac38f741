use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Comment, Echo};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn content_type(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
}

// --- bodies ---

#[tokio::test]
async fn json_returns_key_value() {
    let resp = app().oneshot(get("/json")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), "application/json");
    let value: serde_json::Value = body_json(resp).await;
    assert_eq!(value["key"], "value");
}

#[tokio::test]
async fn xml_is_labelled_xml() {
    let resp = app().oneshot(get("/xml")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), "application/xml");
    assert_eq!(&body_bytes(resp).await[..], b"<key>value</key>");
}

#[tokio::test]
async fn malformed_claims_json_but_is_not() {
    let resp = app().oneshot(get("/malformed")).await.unwrap();

    assert_eq!(content_type(&resp), "application/json");
    let bytes = body_bytes(resp).await;
    assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_err());
}

// --- status ---

#[tokio::test]
async fn redirect_points_at_json() {
    let resp = app().oneshot(get("/redirect")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()[http::header::LOCATION], "/json");
}

#[tokio::test]
async fn status_echoes_requested_code() {
    for code in [200, 300, 404, 500, 503] {
        let resp = app().oneshot(get(&format!("/status/{code}"))).await.unwrap();
        assert_eq!(resp.status().as_u16(), code);
    }
}

#[tokio::test]
async fn status_out_of_range_is_400() {
    let resp = app().oneshot(get("/status/6")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- comments ---

#[tokio::test]
async fn comments_filtered_by_post_id() {
    let resp = app().oneshot(get("/comments?postId=1")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let comments: Vec<Comment> = body_json(resp).await;
    assert_eq!(comments.len(), 2);
    assert!(comments.iter().all(|c| c.post_id == 1));
}

#[tokio::test]
async fn comments_unknown_post_is_empty() {
    let resp = app().oneshot(get("/comments?postId=99")).await.unwrap();
    let comments: Vec<Comment> = body_json(resp).await;
    assert!(comments.is_empty());
}

#[tokio::test]
async fn comments_without_filter_lists_all() {
    let resp = app().oneshot(get("/comments")).await.unwrap();
    let comments: Vec<Comment> = body_json(resp).await;
    assert_eq!(comments.len(), 3);
}

// --- echo ---

#[tokio::test]
async fn echo_reports_method_query_and_headers() {
    let req = Request::builder()
        .method("PATCH")
        .uri("/echo?a=1&b=2")
        .header("x-trace", "abc")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.query.as_deref(), Some("a=1&b=2"));
    assert_eq!(echo.headers["x-trace"], "abc");
}

// --- flaky ---

#[tokio::test]
async fn flaky_with_zero_failures_answers_immediately() {
    let app = app();
    let resp = app.clone().oneshot(get("/flaky/0")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let value: serde_json::Value = body_json(resp).await;
    assert_eq!(value["key"], "recovered");

    let hits: u32 = body_json(app.oneshot(get("/flaky-hits")).await.unwrap()).await;
    assert_eq!(hits, 1);
}

#[tokio::test(start_paused = true)]
async fn flaky_stalls_until_failures_are_used() {
    let app = app();
    let start = tokio::time::Instant::now();

    let resp = app.clone().oneshot(get("/flaky/1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(start.elapsed() >= mock_server::FLAKY_STALL);

    let start = tokio::time::Instant::now();
    app.oneshot(get("/flaky/1")).await.unwrap();
    assert!(start.elapsed() < mock_server::FLAKY_STALL);
}
