use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::dispatch::{Dispatcher, Reply, ReplyStatus};
use crate::validate::RequestMeta;
use crate::types::SESSION_HEADER;

/// Shared state for the HTTP handlers.
pub(crate) struct HttpState {
    dispatcher: Dispatcher,
}

/// Create an Axum router serving the MCP endpoint.
pub fn http_router(dispatcher: Dispatcher) -> Router {
    let state = Arc::new(HttpState { dispatcher });

    Router::new()
        .route(
            "/mcp",
            post(handle_post).get(handle_stream).delete(handle_delete),
        )
        .route("/healthz", get(handle_healthz))
        .with_state(state)
}

async fn handle_healthz() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

fn request_meta(headers: &HeaderMap) -> RequestMeta {
    let session_token = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    RequestMeta {
        session_token,
        accept,
    }
}

fn status_code(status: ReplyStatus) -> StatusCode {
    match status {
        ReplyStatus::Ok => StatusCode::OK,
        ReplyStatus::BadRequest => StatusCode::BAD_REQUEST,
        ReplyStatus::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
    }
}

/// POST /mcp — the request/response channel.
async fn handle_post(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let meta = request_meta(&headers);
    let Reply {
        status,
        session,
        body,
    } = state.dispatcher.handle(&body, &meta).await;

    let mut response = (status_code(status), Json(body)).into_response();
    if let Some(token) = session {
        if let Ok(value) = HeaderValue::from_str(&token) {
            response.headers_mut().insert(SESSION_HEADER, value);
        }
    }
    response
}

/// GET /mcp — server-push slot. The contract reserves this for a
/// notification stream; no stream is implemented.
async fn handle_stream(State(state): State<Arc<HttpState>>, headers: HeaderMap) -> Response {
    let meta = request_meta(&headers);
    let valid = meta
        .session_token
        .as_deref()
        .is_some_and(|t| state.dispatcher.session_is_valid(t));
    if !valid {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid or missing session ID"})),
        )
            .into_response();
    }
    Json(json!({"message": "Notification streaming is not implemented"})).into_response()
}

/// DELETE /mcp — session termination. Idempotent; always 200.
async fn handle_delete(State(state): State<Arc<HttpState>>, headers: HeaderMap) -> Response {
    let meta = request_meta(&headers);
    let success = state.dispatcher.terminate(meta.session_token.as_deref());
    Json(json!({"success": success})).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::session::SessionStore;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let registry = Arc::new(catalog::build_registry().unwrap());
        let dispatcher = Dispatcher::new(registry, Arc::new(SessionStore::new()));
        http_router(dispatcher)
    }

    fn post_mcp(body: Value, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .header("accept", "application/json");
        if let Some(t) = token {
            builder = builder.header(SESSION_HEADER, t);
        }
        builder
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn init_body() -> Value {
        json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {"client": {"name": "test", "version": "0.1"}}
        })
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn initialize(app: &Router) -> String {
        let resp = app.clone().oneshot(post_mcp(init_body(), None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        resp.headers()[SESSION_HEADER].to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = test_router();
        let req = Request::builder()
            .method("GET")
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_initialize_returns_session_header() {
        let app = test_router();
        let resp = app.oneshot(post_mcp(init_body(), None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key(SESSION_HEADER));
        let body = body_json(resp).await;
        assert_eq!(body["result"]["server"]["name"], "mcpgate");
    }

    #[tokio::test]
    async fn test_missing_accept_is_406() {
        let app = test_router();
        let req = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&init_body()).unwrap()))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_ACCEPTABLE);
        let body = body_json(resp).await;
        assert_eq!(body["error"]["code"], -32000);
        assert_eq!(body["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_call_without_session_is_400() {
        let app = test_router();
        let body = json!({"jsonrpc": "2.0", "id": 1, "method": "listTools"});
        let resp = app.oneshot(post_mcp(body, None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"]["code"], -32000);
        assert!(!body.as_object().unwrap().contains_key("result"));
    }

    #[tokio::test]
    async fn test_session_flow_list_and_invoke() {
        let app = test_router();
        let token = initialize(&app).await;

        let resp = app
            .clone()
            .oneshot(post_mcp(
                json!({"jsonrpc": "2.0", "id": 2, "method": "listTools"}),
                Some(&token),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[SESSION_HEADER].to_str().unwrap(), token);
        let body = body_json(resp).await;
        assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 2);

        let resp = app
            .clone()
            .oneshot(post_mcp(
                json!({
                    "jsonrpc": "2.0", "id": 3, "method": "invokeTool",
                    "params": {"name": "add", "params": {"a": 5, "b": 10}}
                }),
                Some(&token),
            ))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["result"]["content"][0]["text"], "15");
        assert_eq!(body["id"], 3);
    }

    #[tokio::test]
    async fn test_delete_terminates_session() {
        let app = test_router();
        let token = initialize(&app).await;

        let delete = |token: &str| {
            Request::builder()
                .method("DELETE")
                .uri("/mcp")
                .header(SESSION_HEADER, token)
                .body(Body::empty())
                .unwrap()
        };

        let resp = app.clone().oneshot(delete(&token)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["success"], true);

        // Idempotent: a second delete reports false, still 200.
        let resp = app.clone().oneshot(delete(&token)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["success"], false);

        // The token now behaves like an unknown token.
        let resp = app
            .clone()
            .oneshot(post_mcp(
                json!({"jsonrpc": "2.0", "id": 4, "method": "listTools"}),
                Some(&token),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stream_placeholder_requires_session() {
        let app = test_router();
        let req = Request::builder()
            .method("GET")
            .uri("/mcp")
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let token = initialize(&app).await;
        let req = Request::builder()
            .method("GET")
            .uri("/mcp")
            .header(SESSION_HEADER, &token)
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_body_rides_in_200() {
        let app = test_router();
        let req = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .body(Body::from("{bad json"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["error"]["code"], -32603);
    }
}
