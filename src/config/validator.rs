//! Config validation across models. Per-field checks happen when each schema is built.

use crate::config::ModelsConfig;
use crate::error::SchemaError;
use std::collections::HashSet;

pub fn validate(config: &ModelsConfig) -> Result<(), SchemaError> {
    let mut names = HashSet::new();
    for model in &config.models {
        if model.name.trim().is_empty() {
            return Err(SchemaError::EmptyModelName);
        }
        if !names.insert(model.name.as_str()) {
            return Err(SchemaError::DuplicateModel(model.name.clone()));
        }
    }
    Ok(())
}
