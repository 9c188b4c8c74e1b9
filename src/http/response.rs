//! Response value and the named factories that fix status and content type together.

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON: &str = "application/json";
pub const TEXT: &str = "text/plain";

/// Status, headers and body, written verbatim by the transport. Headers always carry a `Content-Type`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Response {
    /// Plain-text response.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Response {
            status,
            headers: vec![(CONTENT_TYPE.to_string(), TEXT.to_string())],
            body: body.into(),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Response::new(StatusCode::OK, body)
    }

    pub fn json<T: Serialize + ?Sized>(data: &T) -> Self {
        Response::json_with_status(StatusCode::OK, data)
    }

    pub fn json_with_status<T: Serialize + ?Sized>(status: StatusCode, data: &T) -> Self {
        match serde_json::to_string(data) {
            Ok(body) => Response {
                status,
                headers: vec![(CONTENT_TYPE.to_string(), JSON.to_string())],
                body,
            },
            Err(e) => {
                tracing::error!(error = %e, "response serialization failed");
                Response::internal_error()
            }
        }
    }

    pub fn created<T: Serialize + ?Sized>(data: &T) -> Self {
        Response::json_with_status(StatusCode::CREATED, data)
    }

    pub fn no_content() -> Self {
        Response::new(StatusCode::NO_CONTENT, "")
    }

    pub fn not_found() -> Self {
        Response::json_with_status(StatusCode::NOT_FOUND, &error_body("Not Found", None))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Response::json_with_status(StatusCode::BAD_REQUEST, &error_body(&message, None))
    }

    pub fn bad_request_with_details(message: impl Into<String>, details: Value) -> Self {
        let message: String = message.into();
        Response::json_with_status(StatusCode::BAD_REQUEST, &error_body(&message, Some(details)))
    }

    pub fn internal_error() -> Self {
        Response::json_with_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            &error_body("Internal Server Error", None),
        )
    }

    /// Header lookup, case-insensitive on the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace a header (case-insensitive) or append it.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Response::new(StatusCode::OK, "")
    }
}

/// `{"error": message}` plus `details` when present.
pub fn error_body(message: &str, details: Option<Value>) -> Value {
    match details {
        Some(details) => json!({ "error": message, "details": details }),
        None => json!({ "error": message }),
    }
}
