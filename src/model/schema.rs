//! Model schema: an ordered, immutable mapping of attribute name to field.

use crate::error::SchemaError;
use crate::model::field::{Field, FieldKind};

/// Name of the identifier attribute every record carries.
pub const ID: &str = "id";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    name: String,
    fields: Vec<(String, Field)>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub struct SchemaBuilder {
    name: String,
    fields: Vec<(String, Field)>,
}

impl SchemaBuilder {
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    /// Check field declarations and freeze the schema.
    pub fn build(self) -> Result<Schema, SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::EmptyModelName);
        }
        for (i, (name, field)) in self.fields.iter().enumerate() {
            let err_ctx = || (self.name.clone(), name.clone());
            if name == ID {
                let (model, field) = err_ctx();
                return Err(SchemaError::ReservedField { model, field });
            }
            if self.fields[..i].iter().any(|(n, _)| n == name) {
                let (model, field) = err_ctx();
                return Err(SchemaError::DuplicateField { model, field });
            }
            if field.max_length.is_some() && field.kind != FieldKind::Text {
                let (model, field) = err_ctx();
                return Err(SchemaError::MaxLengthOnNonText { model, field });
            }
            if field.auto_now && field.kind != FieldKind::Datetime {
                let (model, field) = err_ctx();
                return Err(SchemaError::AutoNowOnNonDatetime { model, field });
            }
        }
        Ok(Schema {
            name: self.name,
            fields: self.fields,
        })
    }
}
