//! Method + path routing with named placeholders (`/posts/<id>/comments`).
//!
//! Patterns compile to anchored regexes: same segment count, literal segments match exactly,
//! each placeholder captures one whole segment verbatim. The first registered route that
//! matches wins.

use crate::error::{AppError, RouteError};
use crate::http::{Request, Response};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// What a matched route runs.
pub type Handler = Arc<dyn Fn(&Request) -> Result<Response, AppError> + Send + Sync>;

/// A compiled path pattern.
#[derive(Clone, Debug)]
pub struct PathPattern {
    source: String,
    regex: Regex,
    params: Vec<String>,
}

impl PathPattern {
    pub fn compile(pattern: &str) -> Result<Self, RouteError> {
        if !pattern.starts_with('/') {
            return Err(RouteError::MissingLeadingSlash(pattern.to_string()));
        }
        let mut re = String::with_capacity(pattern.len() + 8);
        re.push('^');
        let mut params: Vec<String> = Vec::new();
        for segment in pattern.split('/').skip(1) {
            re.push('/');
            if let Some(name) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
                if !is_param_name(name) {
                    return Err(RouteError::InvalidPlaceholder {
                        pattern: pattern.to_string(),
                        segment: segment.to_string(),
                    });
                }
                if params.iter().any(|p| p == name) {
                    return Err(RouteError::DuplicatePlaceholder {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                re.push_str("([^/]+)");
                params.push(name.to_string());
            } else if segment.contains('<') || segment.contains('>') {
                return Err(RouteError::InvalidPlaceholder {
                    pattern: pattern.to_string(),
                    segment: segment.to_string(),
                });
            } else {
                re.push_str(&regex::escape(segment));
            }
        }
        re.push('$');
        Ok(PathPattern {
            source: pattern.to_string(),
            regex: Regex::new(&re)?,
            params,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Captured placeholder values if `path` matches in full.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(path)?;
        Some(
            self.params
                .iter()
                .zip(caps.iter().skip(1))
                .filter_map(|(name, m)| m.map(|m| (name.clone(), m.as_str().to_string())))
                .collect(),
        )
    }
}

fn is_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

struct Route {
    method: String,
    pattern: PathPattern,
    handler: Handler,
}

/// Result of a successful lookup.
pub struct RouteMatch {
    pub handler: Handler,
    pub path_params: HashMap<String, String>,
}

#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` (case-insensitive) and `pattern`.
    pub fn add<H>(&mut self, method: &str, pattern: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: Fn(&Request) -> Result<Response, AppError> + Send + Sync + 'static,
    {
        self.add_handler(method, pattern, Arc::new(handler))
    }

    pub fn add_handler(&mut self, method: &str, pattern: &str, handler: Handler) -> Result<&mut Self, RouteError> {
        let pattern = PathPattern::compile(pattern)?;
        self.routes.push(Route {
            method: method.trim().to_ascii_uppercase(),
            pattern,
            handler,
        });
        Ok(self)
    }

    pub fn get<H>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: Fn(&Request) -> Result<Response, AppError> + Send + Sync + 'static,
    {
        self.add("GET", pattern, handler)
    }

    pub fn post<H>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: Fn(&Request) -> Result<Response, AppError> + Send + Sync + 'static,
    {
        self.add("POST", pattern, handler)
    }

    pub fn put<H>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: Fn(&Request) -> Result<Response, AppError> + Send + Sync + 'static,
    {
        self.add("PUT", pattern, handler)
    }

    pub fn patch<H>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: Fn(&Request) -> Result<Response, AppError> + Send + Sync + 'static,
    {
        self.add("PATCH", pattern, handler)
    }

    pub fn delete<H>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: Fn(&Request) -> Result<Response, AppError> + Send + Sync + 'static,
    {
        self.add("DELETE", pattern, handler)
    }

    /// First route whose method and full path match. Does not touch any request.
    pub fn resolve(&self, method: &str, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .filter(|r| r.method.eq_ignore_ascii_case(method))
            .find_map(|r| {
                r.pattern.captures(path).map(|path_params| RouteMatch {
                    handler: Arc::clone(&r.handler),
                    path_params,
                })
            })
    }

    /// Look up the handler for `req`; on a match, `req.path_params` is replaced with the captures.
    pub fn match_request(&self, req: &mut Request) -> Option<Handler> {
        let m = self.resolve(&req.method, &req.path)?;
        tracing::debug!(method = %req.method, path = %req.path, params = ?m.path_params, "route matched");
        req.path_params = m.path_params;
        Some(m.handler)
    }

    /// Registered `(method, pattern)` pairs in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes.iter().map(|r| (r.method.as_str(), r.pattern.as_str()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes()).finish()
    }
}
