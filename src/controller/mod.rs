//! Controllers: translate model results into responses.

mod model;
mod nested;

pub use model::ModelController;
pub use nested::NestedController;

use crate::error::AppError;

/// Parse a path id. A non-numeric id cannot name a record, so it is reported as not found.
pub(crate) fn parse_id(id: &str) -> Result<u64, AppError> {
    id.parse::<u64>()
        .map_err(|_| AppError::NotFound(format!("invalid id '{}'", id)))
}
