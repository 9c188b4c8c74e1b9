//! Typed errors per layer and their HTTP mapping.

use crate::http::Response;
use axum::http::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A model schema definition that cannot be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("model name must not be empty")]
    EmptyModelName,
    #[error("{model}: duplicate field '{field}'")]
    DuplicateField { model: String, field: String },
    #[error("{model}: field name '{field}' is reserved")]
    ReservedField { model: String, field: String },
    #[error("{model}.{field}: max_length only applies to text fields")]
    MaxLengthOnNonText { model: String, field: String },
    #[error("{model}.{field}: auto_now only applies to datetime fields")]
    AutoNowOnNonDatetime { model: String, field: String },
    #[error("duplicate model: {0}")]
    DuplicateModel(String),
}

/// A route pattern that cannot be compiled.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("route pattern must start with '/': {0}")]
    MissingLeadingSlash(String),
    #[error("invalid placeholder '{segment}' in route pattern {pattern}")]
    InvalidPlaceholder { pattern: String, segment: String },
    #[error("placeholder <{name}> appears twice in route pattern {pattern}")]
    DuplicatePlaceholder { pattern: String, name: String },
    #[error("route pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Startup failures: loading schemas and registering routes.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config load {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("missing model: {0}")]
    MissingModel(String),
}

/// One failing field: its name and why it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field failure found while validating one record, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether `field` is among the failures.
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.first() {
            None => write!(f, "invalid record"),
            Some(first) if self.errors.len() == 1 => write!(f, "{}: {}", first.field, first.message),
            Some(first) => write!(
                f,
                "{}: {} (and {} more)",
                first.field,
                first.message,
                self.errors.len() - 1
            ),
        }
    }
}

impl std::error::Error for ValidationErrors {}

/// Failures raised by model operations.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("validation: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("{model} matching id {id} does not exist")]
    DoesNotExist { model: String, id: u64 },
    #[error("{model} has no field '{field}'")]
    UnknownField { model: String, field: String },
    #[error("record of {found} cannot be stored in {expected}")]
    WrongModel { expected: String, found: String },
    #[error("{0} table lock poisoned")]
    StoreLock(String),
}

/// Errors at the controller boundary; each maps to one status code.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("no route for {method} {path}")]
    RouteNotFound { method: String, path: String },
    #[error("internal: {0}")]
    Internal(String),
}

impl From<ModelError> for AppError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(errors) => AppError::Validation(errors),
            ModelError::DoesNotExist { model, id } => AppError::NotFound(format!("{} {}", model, id)),
            ModelError::UnknownField { .. } => AppError::BadRequest(e.to_string()),
            ModelError::WrongModel { .. } | ModelError::StoreLock(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render as a JSON error response. Not-found and internal errors carry only a generic message.
    pub fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                let details = serde_json::to_value(&errors).unwrap_or(serde_json::Value::Null);
                Response::bad_request_with_details(format!("Validation failed: {}", errors), details)
            }
            AppError::BadRequest(message) => Response::bad_request(message),
            AppError::NotFound(_) | AppError::RouteNotFound { .. } => Response::not_found(),
            AppError::Internal(_) => Response::internal_error(),
        }
    }
}

impl From<AppError> for Response {
    fn from(e: AppError) -> Self {
        e.into_response()
    }
}
