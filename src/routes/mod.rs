//! Route tables: service endpoints and the blog API.

pub mod blog;
pub mod common;

pub use blog::{blog_app, blog_routes};
pub use common::common_routes;
