//! Blog API server: binds a listener, logs the route table, and serves blogkit's blog app.
//!
//! Run from repo root: `cargo run -p blog-server`
//! Set `BLOGKIT_ADDR` (default `127.0.0.1:8000`) to change the bind address and
//! `BLOGKIT_MODELS` to load schemas from a JSON file instead of the bundled ones.

use blogkit::{blog_app, blog_routes, common_routes, load_from_path, resolve, serve, App, Database, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

const DEFAULT_ADDR: &str = "127.0.0.1:8000";

struct ServerConfig {
    bind_addr: String,
    models_path: Option<String>,
}

impl ServerConfig {
    fn from_env() -> Self {
        ServerConfig {
            bind_addr: std::env::var("BLOGKIT_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.into()),
            models_path: std::env::var("BLOGKIT_MODELS").ok().filter(|s| !s.is_empty()),
        }
    }
}

async fn build_app(config: &ServerConfig) -> Result<App, Box<dyn std::error::Error>> {
    let Some(path) = &config.models_path else {
        return Ok(blog_app()?);
    };
    let models = load_from_path(path).await?;
    let db = Arc::new(Database::new(resolve(&models)?)?);
    let mut router = Router::new();
    common_routes(&mut router)?;
    blog_routes(&mut router, &db)?;
    Ok(App::new(router, db))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("blogkit=info,blog_server=info")),
        )
        .init();

    let config = ServerConfig::from_env();
    let app = build_app(&config).await?;

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("blog app listening on http://{}", listener.local_addr()?);
    for (method, pattern) in app.router().routes() {
        tracing::info!("  {} {}", method, pattern);
    }
    serve(listener, Arc::new(app)).await?;
    Ok(())
}
