//! Declarative models: field descriptors, schemas, records and their in-memory tables.

mod field;
mod record;
mod schema;
mod store;

pub use field::{datetime_value, Field, FieldKind, Violation};
pub use record::Record;
pub use schema::{Schema, SchemaBuilder, ID};
pub use store::{Database, ModelStore};
