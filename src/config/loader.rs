//! Load model configs from JSON and resolve them into schemas.

use crate::config::types::{FieldConfig, ModelsConfig};
use crate::config::validate;
use crate::error::{ConfigError, SchemaError};
use crate::model::{Field, Schema};
use std::path::Path;
use std::sync::Arc;

/// Schemas of the bundled blog application (User, Post, Comment).
pub const BLOG_MODELS_JSON: &str = include_str!("blog_models.json");

/// Validate a models document and build one immutable schema per model, in document order.
pub fn resolve(config: &ModelsConfig) -> Result<Vec<Arc<Schema>>, SchemaError> {
    validate(config)?;
    config
        .models
        .iter()
        .map(|model| {
            model
                .fields
                .iter()
                .fold(Schema::builder(model.name.clone()), |b, f| b.field(f.name.clone(), to_field(f)))
                .build()
                .map(Arc::new)
        })
        .collect()
}

fn to_field(config: &FieldConfig) -> Field {
    Field {
        kind: config.type_,
        max_length: config.max_length,
        required: config.required,
        auto_now: config.auto_now,
    }
}

pub fn load_from_str(json: &str) -> Result<ModelsConfig, ConfigError> {
    Ok(serde_json::from_str(json)?)
}

pub async fn load_from_path(path: impl AsRef<Path>) -> Result<ModelsConfig, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded models config");
    load_from_str(&raw)
}

/// The bundled blog schemas, resolved.
pub fn blog_schemas() -> Result<Vec<Arc<Schema>>, ConfigError> {
    let config = load_from_str(BLOG_MODELS_JSON)?;
    Ok(resolve(&config)?)
}
