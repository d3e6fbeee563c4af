use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    middleware::from_fn,
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use tower::util::ServiceExt; // for `oneshot`
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};

use api_ingress::request_id::{header as request_id_header, MakeReqId, XRequestId};

fn test_app() -> Router {
    let x_request_id = request_id_header();
    Router::new()
        .route("/echo", get(echo))
        .layer(from_fn(api_ingress::request_id::push_req_id_to_extensions))
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeReqId))
}

async fn echo(Extension(XRequestId(id)): Extension<XRequestId>) -> Json<serde_json::Value> {
    Json(json!({ "requestId": id }))
}

async fn call(req: Request<Body>) -> (Option<String>, serde_json::Value) {
    let resp = test_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let header = resp
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (header, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn generates_request_id_when_missing() {
    let (header, body) = call(Request::builder().uri("/echo").body(Body::empty()).unwrap()).await;

    let id = header.expect("x-request-id should be generated");
    assert_eq!(id.len(), 21, "nanoid default length");
    assert_eq!(body["requestId"], id.as_str());
}

#[tokio::test]
async fn preserves_incoming_request_id() {
    let (header, body) = call(
        Request::builder()
            .uri("/echo")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(header.as_deref(), Some("abc-123"));
    assert_eq!(body["requestId"], "abc-123");
}
