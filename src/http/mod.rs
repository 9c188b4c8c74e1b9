//! Parsed HTTP input and structured output, independent of any transport.

mod request;
mod response;

pub use request::Request;
pub use response::{error_body, Response, CONTENT_TYPE, JSON, TEXT};
