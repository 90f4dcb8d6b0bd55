use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::Instrument;

use super::HttpState;

const ALLOWED_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";
const ALLOWED_HEADERS: &str = "content-type";

fn allowed_origin(state: &HttpState, headers: &HeaderMap) -> Option<HeaderValue> {
    if state.cors_allowed_origins.iter().any(|o| o == "*") {
        return Some(HeaderValue::from_static("*"));
    }
    let origin = headers.get("origin")?.to_str().ok()?;
    state
        .cors_allowed_origins
        .iter()
        .any(|o| o == origin)
        .then(|| HeaderValue::from_str(origin).ok())
        .flatten()
}

fn apply_cors(resp: &mut Response, origin: HeaderValue) {
    let headers = resp.headers_mut();
    headers.insert("access-control-allow-origin", origin);
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
}

pub(crate) async fn cors_middleware(
    State(state): State<HttpState>,
    req: Request,
    next: Next,
) -> Response {
    let origin = allowed_origin(&state, req.headers());
    if *req.method() == Method::OPTIONS {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        if let Some(origin) = origin {
            apply_cors(&mut resp, origin);
        }
        return resp;
    }

    let mut resp = next.run(req).await;
    if let Some(origin) = origin {
        apply_cors(&mut resp, origin);
    }
    resp
}

pub(crate) async fn request_tracing_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let span = tracing::info_span!("http_request", method = %method, path = %path);
    async move {
        let started = Instant::now();
        let resp = next.run(req).await;
        let status = resp.status().as_u16();
        let latency_ms = started.elapsed().as_millis() as u64;
        if status >= 500 {
            tracing::error!(status, latency_ms, "request completed");
        } else {
            tracing::info!(status, latency_ms, "request completed");
        }
        resp
    }
    .instrument(span)
    .await
}
