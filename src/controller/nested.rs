//! Child resources addressed through a parent id, e.g. `/posts/<id>/comments`.

use crate::controller::ModelController;
use crate::error::AppError;
use crate::http::{Request, Response};
use crate::model::{ModelStore, Record};
use serde_json::Value;
use std::sync::Arc;

/// CRUD for a child model whose `foreign_key` field stores the parent id.
///
/// The parent id is stored as given; the parent record is not looked up.
pub struct NestedController {
    inner: ModelController,
    foreign_key: String,
}

impl NestedController {
    pub fn new(store: Arc<ModelStore>, foreign_key: impl Into<String>) -> Self {
        NestedController {
            inner: ModelController::new(store),
            foreign_key: foreign_key.into(),
        }
    }

    pub fn inner(&self) -> &ModelController {
        &self.inner
    }

    /// Create a child of `parent_id`; the path id overrides any foreign key in the body.
    pub fn create_for_parent(&self, req: &Request, parent_id: &str) -> Result<Response, AppError> {
        let parent_id = parse_parent_id(parent_id)?;
        let mut data = req.json();
        data.insert(self.foreign_key.clone(), Value::Number(parent_id.into()));
        self.inner.create_from(data)
    }

    /// 200 with the children of `parent_id`, in creation order.
    pub fn list_for_parent(&self, parent_id: &str) -> Result<Response, AppError> {
        let parent_id = parse_parent_id(parent_id)?;
        let children = self
            .inner
            .store()
            .filter(|r| r.get_i64(&self.foreign_key) == Some(parent_id))?;
        let dicts: Vec<Value> = children.iter().map(Record::to_dict).collect();
        Ok(Response::json(&dicts))
    }
}

fn parse_parent_id(id: &str) -> Result<i64, AppError> {
    id.parse::<i64>()
        .map_err(|_| AppError::NotFound(format!("invalid parent id '{}'", id)))
}
