//! `/api/*` pass-through to the backend origin.

use crate::transport::ReqwestTransport;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

const FORWARDED_HEADERS: [&str; 3] = ["content-type", "authorization", "accept"];
const RETURNED_HEADERS: [&str; 3] = ["content-type", "location", "cache-control"];

pub fn proxy_router(upstream: ReqwestTransport) -> Router {
    Router::new()
        .route("/api/*path", any(forward))
        .with_state(upstream)
        .layer(cors_layer())
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn forward(
    State(upstream): State<ReqwestTransport>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let url = upstream.resolve(path);

    let Ok(upstream_method) = reqwest::Method::from_bytes(method.as_str().as_bytes()) else {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    };

    let mut request = upstream.client().request(upstream_method, &url);
    for name in FORWARDED_HEADERS {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            request = request.header(name, value);
        }
    }
    if !body.is_empty() {
        request = request.body(body.to_vec());
    }

    let resp = match request.send().await {
        Ok(resp) => resp,
        Err(err) => return bad_gateway(&url, err),
    };

    let status = StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let returned = RETURNED_HEADERS
        .iter()
        .filter_map(|name| {
            let value = resp.headers().get(*name)?.to_str().ok()?;
            Some((*name, HeaderValue::from_str(value).ok()?))
        })
        .collect::<Vec<_>>();

    match resp.bytes().await {
        Ok(bytes) => {
            tracing::debug!(%method, %url, status = status.as_u16(), "proxied");
            let mut response = (status, bytes.to_vec()).into_response();
            for (name, value) in returned {
                response.headers_mut().insert(name, value);
            }
            response
        }
        Err(err) => bad_gateway(&url, err),
    }
}

fn bad_gateway(url: &str, err: reqwest::Error) -> Response {
    tracing::warn!(%url, error = %err, "backend unreachable");
    let detail = if err.is_timeout() {
        "backend did not respond in time".to_string()
    } else {
        "backend unreachable".to_string()
    };
    (
        StatusCode::BAD_GATEWAY,
        Json(serde_json::json!({ "detail": detail })),
    )
        .into_response()
}
