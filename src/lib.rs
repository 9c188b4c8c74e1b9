//! blogkit: a small web framework (path router, schema-validated in-memory models, CRUD controllers)
//! and the blog API built on it.

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod model;
pub mod router;
pub mod routes;
pub mod server;

pub use config::{blog_schemas, load_from_path, load_from_str, resolve, ModelsConfig};
pub use controller::{ModelController, NestedController};
pub use dispatch::{bind, App, PathArgs};
pub use error::{AppError, ConfigError, ModelError, RouteError, SchemaError, ValidationErrors};
pub use http::{Request, Response};
pub use model::{Database, Field, FieldKind, ModelStore, Record, Schema};
pub use router::{Handler, PathPattern, Router};
pub use routes::{blog_app, blog_routes, common_routes};
pub use server::{http_router, serve};
