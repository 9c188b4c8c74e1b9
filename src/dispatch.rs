//! Binding controller actions to routes, and the top-level request entry point.

use crate::error::AppError;
use crate::http::{Request, Response};
use crate::model::Database;
use crate::router::{Handler, Router};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// The path parameters an action declared, taken from the matched route.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathArgs {
    values: HashMap<String, String>,
}

impl PathArgs {
    /// Keep only the `declared` names present in `path_params`; extra captures are dropped.
    pub fn select(path_params: &HashMap<String, String>, declared: &[&str]) -> Self {
        let values = declared
            .iter()
            .filter_map(|name| path_params.get(*name).map(|v| ((*name).to_string(), v.clone())))
            .collect();
        PathArgs { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// A declared parameter the route failed to capture is a wiring bug, not a client error.
    pub fn require(&self, name: &str) -> Result<&str, AppError> {
        self.get(name)
            .ok_or_else(|| AppError::Internal(format!("path parameter '{}' not captured by route", name)))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Wrap a controller action as a route handler.
///
/// `params` lists the path parameters the action reads; only those are passed through.
pub fn bind<C, F>(controller: Arc<C>, params: &'static [&'static str], action: F) -> Handler
where
    C: Send + Sync + 'static,
    F: Fn(&C, &Request, &PathArgs) -> Result<Response, AppError> + Send + Sync + 'static,
{
    Arc::new(move |req: &Request| {
        let args = PathArgs::select(&req.path_params, params);
        action(controller.as_ref(), req, &args)
    })
}

/// A router plus the tables its controllers operate on.
pub struct App {
    router: Router,
    db: Arc<Database>,
}

impl App {
    pub fn new(router: Router, db: Arc<Database>) -> Self {
        App { router, db }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    /// Route, run the handler, and turn every outcome into a response.
    ///
    /// Expected failures arrive as 4xx `AppError`s. Internal errors and panics are the only 500s.
    pub fn handle(&self, mut req: Request) -> Response {
        let Some(handler) = self.router.match_request(&mut req) else {
            tracing::debug!(method = %req.method, path = %req.path, "no route");
            return AppError::RouteNotFound {
                method: req.method,
                path: req.path,
            }
            .into_response();
        };
        match catch_unwind(AssertUnwindSafe(|| handler(&req))) {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                if let AppError::Internal(detail) = &e {
                    tracing::error!(method = %req.method, path = %req.path, error = %detail, "handler failed");
                } else {
                    tracing::debug!(method = %req.method, path = %req.path, error = %e, "request rejected");
                }
                e.into_response()
            }
            Err(_) => {
                tracing::error!(method = %req.method, path = %req.path, "handler panicked");
                Response::internal_error()
            }
        }
    }
}
