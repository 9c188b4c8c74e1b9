//! HTTP transport over axum: every request goes through one fallback handler into `App::handle`.

use crate::dispatch::App;
use crate::http::{Request, Response};
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;

/// Largest request body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// axum router that hands every request to `app`.
pub fn http_router(app: Arc<App>) -> axum::Router {
    axum::Router::new()
        .fallback(handle)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(app)
}

pub async fn serve(listener: TcpListener, app: Arc<App>) -> std::io::Result<()> {
    axum::serve(listener, http_router(app)).await
}

async fn handle(
    State(app): State<Arc<App>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let mut req = Request::new(method.as_str(), target).with_body(String::from_utf8_lossy(&body).into_owned());
    for (name, value) in headers.iter() {
        if let Ok(v) = value.to_str() {
            req.headers.insert(name.as_str().to_string(), v.to_string());
        }
    }
    let resp = app.handle(req);
    tracing::info!(method = %method, path = %uri.path(), status = resp.status.as_u16(), "request");
    write_response(resp)
}

fn write_response(resp: Response) -> axum::response::Response {
    let mut builder = axum::http::Response::builder().status(resp.status);
    for (name, value) in &resp.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    match builder.body(Body::from(resp.body)) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "invalid response headers");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
