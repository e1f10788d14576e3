//! HTTP request handlers

use super::state::AppState;
use crate::error::SearchError;
use crate::query::{PageArgs, SearchArgs};
use crate::results::{render_page, render_search, render_summaries};
use crate::tools::rpc::handle_message;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// What some clients send for an object they failed to serialize
const OBJECT_PLACEHOLDER: &str = "[object Object]";

/// Error response; the status follows the error kind
pub struct ApiError(SearchError);

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            SearchError::InvalidFilter(_) => StatusCode::BAD_REQUEST,
            SearchError::SearchUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            SearchError::Cancelled(_) => StatusCode::GATEWAY_TIMEOUT,
            SearchError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        } else {
            warn!(error = %self.0, "request rejected");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Unwrap a tool-style `{"type": .., "value": ..}` parameter and drop
/// placeholder or empty values
pub fn sanitize_param(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == OBJECT_PLACEHOLDER {
        return None;
    }

    if trimmed.starts_with('{') {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
            return match map.get("value") {
                Some(Value::String(s)) => sanitize_param(s),
                Some(Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            };
        }
    }

    Some(trimmed.to_string())
}

/// Cleaned query parameters
struct Params(HashMap<String, String>);

impl Params {
    fn new(raw: HashMap<String, String>) -> Self {
        Self(
            raw.into_iter()
                .filter_map(|(k, v)| sanitize_param(&v).map(|v| (k, v)))
                .collect(),
        )
    }

    fn string(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn int(&self, key: &str) -> Result<Option<i64>, SearchError> {
        self.0
            .get(key)
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|_| SearchError::invalid(format!("{key} must be an integer, got '{v}'")))
            })
            .transpose()
    }

    fn bool(&self, key: &str) -> Result<Option<bool>, SearchError> {
        self.0
            .get(key)
            .map(|v| match v.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(SearchError::invalid(format!("{key} must be a boolean, got '{v}'"))),
            })
            .transpose()
    }

    fn search_args(&self) -> Result<SearchArgs, SearchError> {
        Ok(SearchArgs {
            query: self.string("query"),
            limit: self.int("limit")?,
            top_n: self.int("top_n")?,
            include_content: self.bool("include_content")?,
            max_content_length: self.int("max_content_length")?,
            recency_days: self.int("recency_days")?,
            source: self.string("source"),
            language: self.string("language"),
            country: self.string("country"),
            backend: self.string("backend"),
        })
    }

    fn page_args(&self) -> Result<PageArgs, SearchError> {
        Ok(PageArgs {
            url: self.string("url"),
            max_content_length: self.int("max_content_length")?,
        })
    }
}

/// `{"text": .., ...structured}`
fn with_text<T: Serialize>(text: String, value: &T) -> Response {
    match serde_json::to_value(value) {
        Ok(Value::Object(mut map)) => {
            map.insert("text".to_string(), Value::String(text));
            Json(Value::Object(map)).into_response()
        }
        Ok(other) => Json(json!({ "text": text, "data": other })).into_response(),
        Err(e) => {
            error!("Failed to encode response: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "encoding error").into_response()
        }
    }
}

/// Token cancelled when the handler future is dropped, e.g. on client
/// disconnect
fn request_token() -> (CancellationToken, tokio_util::sync::DropGuard) {
    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    (token, guard)
}

/// `GET /search/full_web_search`
pub async fn full_web_search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let args = Params::new(params).search_args()?;
    let (cancel, _guard) = request_token();
    let response = state.service.full_search(args, &cancel).await?;
    Ok(with_text(render_search(&response), &response))
}

/// `GET /search/get_web_search_summaries`
pub async fn get_web_search_summaries(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let args = Params::new(params).search_args()?;
    let (cancel, _guard) = request_token();
    let response = state.service.summaries(args, &cancel).await?;
    Ok(with_text(render_summaries(&response), &response))
}

/// `GET /search/get_single_web_page_content`
pub async fn get_single_web_page_content(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let args = Params::new(params).page_args()?;
    let (cancel, _guard) = request_token();
    let page = state.service.extract_page(args, &cancel).await?;
    Ok(with_text(render_page(&page), &page))
}

/// `POST /mcp`: one JSON-RPC message per request
pub async fn mcp(State(state): State<AppState>, body: String) -> Response {
    let (cancel, _guard) = request_token();
    match handle_message(&state.tools, &body, &cancel).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "backends": state.service.backend_names(),
        "tools": state.tools.names(),
    }))
}

/// Per-backend statistics
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics().snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_param() {
        assert_eq!(sanitize_param("rust"), Some("rust".to_string()));
        assert_eq!(sanitize_param("  "), None);
        assert_eq!(sanitize_param("[object Object]"), None);
        assert_eq!(
            sanitize_param(r#"{"type":"string","value":"climate policy"}"#),
            Some("climate policy".to_string())
        );
        assert_eq!(sanitize_param(r#"{"type":"number","value":3}"#), Some("3".to_string()));
        assert_eq!(sanitize_param(r#"{"type":"string","value":null}"#), None);
        assert_eq!(sanitize_param("{not json"), Some("{not json".to_string()));
    }

    #[test]
    fn test_search_args_from_params() {
        let raw: HashMap<String, String> = [
            ("query", "rust"),
            ("top_n", r#"{"type":"number","value":3}"#),
            ("include_content", "false"),
            ("country", "[object Object]"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let args = Params::new(raw).search_args().unwrap();
        assert_eq!(args.query.as_deref(), Some("rust"));
        assert_eq!(args.top_n, Some(3));
        assert_eq!(args.include_content, Some(false));
        assert!(args.country.is_none());
    }

    #[test]
    fn test_bad_integer_rejected() {
        let raw: HashMap<String, String> =
            [("query".to_string(), "rust".to_string()), ("limit".to_string(), "ten".to_string())]
                .into_iter()
                .collect();
        let err = Params::new(raw).search_args().unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_error_status() {
        let response = ApiError(SearchError::SearchUnavailable("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let response = ApiError(SearchError::invalid("x")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = ApiError(SearchError::Cancelled("x".into())).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
