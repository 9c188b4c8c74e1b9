//! Common routes: health and version.

use crate::error::{AppError, RouteError};
use crate::http::{Request, Response};
use crate::router::Router;
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

fn health(_req: &Request) -> Result<Response, AppError> {
    Ok(Response::json(&HealthBody { status: "ok" }))
}

fn version(_req: &Request) -> Result<Response, AppError> {
    Ok(Response::json(&serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// GET /health, GET /version.
pub fn common_routes(router: &mut Router) -> Result<(), RouteError> {
    router.get("/health", health)?.get("/version", version)?;
    Ok(())
}
