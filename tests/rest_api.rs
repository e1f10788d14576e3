mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{brave_page, links, service, settings};
use mixsearch::web::{create_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::path;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(server: &MockServer) -> Router {
    let settings = settings(server);
    let service = service(&settings);
    create_router(AppState::new(settings, service))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn rpc(message: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .body(Body::from(message.to_string()))
        .unwrap()
}

async fn mount_brave(server: &MockServer, n: usize) {
    Mock::given(path("/brave/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(brave_page(&links("https://brave.example", n)), "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn health_lists_backends_and_tools() {
    let server = MockServer::start().await;
    let (status, body) = send(app(&server), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backends"], json!(["brave", "duckduckgo", "bing"]));
    assert_eq!(body["tools"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn summaries_over_rest() {
    let server = MockServer::start().await;
    mount_brave(&server, 5).await;

    let (status, body) = send(
        app(&server),
        get("/search/get_web_search_summaries?query=rust&top_n=%7B%22type%22%3A%22number%22%2C%22value%22%3A2%7D"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["text"]
        .as_str()
        .unwrap()
        .starts_with("Search summaries for 'rust' with 2 results:"));
    assert_eq!(body["backend"], "brave");
    assert_eq!(body["total_results"], 2);
    assert_eq!(body["results"][0]["url"], "https://brave.example/page/0");
    assert_eq!(body["results"][0]["content"]["status"], "skipped");
}

#[tokio::test]
async fn missing_query_is_bad_request() {
    let server = MockServer::start().await;
    let (status, body) = send(app(&server), get("/search/full_web_search?limit=3")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(app(&server), get("/search/full_web_search?query=rust&limit=ten")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        app(&server),
        get("/search/get_single_web_page_content?url=ftp%3A%2F%2Fexample.com%2Ffile"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn exhausted_backends_are_unavailable() {
    let server = MockServer::start().await;
    Mock::given(path("/brave/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(path("/ddg/html/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(path("/bing/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), get("/search/get_web_search_summaries?query=rust")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("all search backends failed"));
}

#[tokio::test]
async fn mcp_lists_and_calls_tools() {
    let server = MockServer::start().await;
    mount_brave(&server, 3).await;
    let app = app(&server);

    let (status, body) = send(
        app.clone(),
        rpc(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["full_web_search", "get_web_search_summaries", "get_single_web_page_content"]
    );

    let (status, body) = send(
        app.clone(),
        rpc(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": {"name": "get_web_search_summaries", "arguments": {"query": "rust", "limit": 2}}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 2);
    assert_eq!(body["result"]["isError"], false);
    assert!(body["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("**1. Result 0**"));

    let (status, body) = send(
        app,
        rpc(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, Value::Null);
}
