//! Model instances: attribute values bound to a schema, saved or not.

use crate::error::{ModelError, ValidationErrors};
use crate::model::field::datetime_value;
use crate::model::schema::{Schema, ID};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Record {
    schema: Arc<Schema>,
    id: Option<u64>,
    values: HashMap<String, Value>,
}

impl Record {
    /// Unsaved instance. Attributes the schema does not declare (and `id`) are dropped.
    pub fn new(schema: Arc<Schema>, attrs: Map<String, Value>) -> Self {
        let mut values = HashMap::with_capacity(schema.len());
        for (name, value) in attrs {
            if schema.has_field(&name) {
                values.insert(name, value);
            } else {
                tracing::debug!(model = %schema.name(), attr = %name, "ignoring undeclared attribute");
            }
        }
        Record {
            schema,
            id: None,
            values,
        }
    }

    pub(crate) fn persisted(schema: Arc<Schema>, id: u64, values: HashMap<String, Value>) -> Self {
        Record {
            schema,
            id: Some(id),
            values,
        }
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn model_name(&self) -> &str {
        self.schema.name()
    }

    /// Current value of an attribute; `None` if it was never supplied.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        self.get_str(name)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
    }

    /// Set an attribute. Nothing is validated until the record is saved.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        if !self.schema.has_field(name) {
            return Err(ModelError::UnknownField {
                model: self.schema.name().to_string(),
                field: name.to_string(),
            });
        }
        self.values.insert(name.to_string(), value.into());
        Ok(())
    }

    /// `id` first, then every schema attribute in declaration order; never-supplied values are `null`.
    pub fn to_dict(&self) -> Value {
        let mut map = Map::with_capacity(self.schema.len() + 1);
        map.insert(
            ID.to_string(),
            self.id.map(|id| Value::Number(id.into())).unwrap_or(Value::Null),
        );
        for (name, _) in self.schema.fields() {
            map.insert(name.to_string(), self.values.get(name).cloned().unwrap_or(Value::Null));
        }
        Value::Object(map)
    }

    /// Run every field's validation over the current values, collecting all failures.
    ///
    /// `auto_now` fields keep the value in `stored` when there is one, otherwise take `now`.
    pub(crate) fn clean(
        &self,
        stored: Option<&HashMap<String, Value>>,
        now: DateTime<Utc>,
    ) -> Result<HashMap<String, Value>, ValidationErrors> {
        let mut cleaned = HashMap::with_capacity(self.schema.len());
        let mut errors = ValidationErrors::new();
        for (name, field) in self.schema.fields() {
            if field.auto_now {
                let value = stored
                    .and_then(|row| row.get(name))
                    .filter(|v| !v.is_null())
                    .cloned()
                    .unwrap_or_else(|| datetime_value(now));
                cleaned.insert(name.to_string(), value);
                continue;
            }
            match field.clean(self.values.get(name)) {
                Ok(value) => {
                    cleaned.insert(name.to_string(), value);
                }
                Err(violation) => errors.push(name, violation.to_string()),
            }
        }
        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(errors)
        }
    }
}
