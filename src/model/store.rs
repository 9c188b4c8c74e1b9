//! In-memory tables, one per model type, and the database that owns them.
//!
//! Every mutation (id assignment, validate-then-write) runs under the table's write lock,
//! so ids stay unique and monotonic and a failed validation never leaves a partial row.

use crate::error::{ModelError, SchemaError};
use crate::model::record::Record;
use crate::model::schema::Schema;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Table {
    /// Keyed by id; ids only grow, so key order is insertion order.
    rows: BTreeMap<u64, HashMap<String, Value>>,
    last_id: u64,
}

impl Table {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

/// The table for one model type.
pub struct ModelStore {
    schema: Arc<Schema>,
    table: RwLock<Table>,
}

impl ModelStore {
    pub fn new(schema: Arc<Schema>) -> Self {
        ModelStore {
            schema,
            table: RwLock::new(Table::default()),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Unsaved instance of this model.
    pub fn build(&self, attrs: Map<String, Value>) -> Record {
        Record::new(Arc::clone(&self.schema), attrs)
    }

    /// Validate and insert a new record. Nothing is stored if any field fails.
    pub fn create(&self, attrs: Map<String, Value>) -> Result<Record, ModelError> {
        let mut record = self.build(attrs);
        self.save(&mut record)?;
        Ok(record)
    }

    pub fn get(&self, id: u64) -> Result<Record, ModelError> {
        let table = self.read()?;
        table
            .rows
            .get(&id)
            .map(|row| self.record(id, row))
            .ok_or_else(|| self.does_not_exist(id))
    }

    /// Every record, in insertion order.
    pub fn all(&self) -> Result<Vec<Record>, ModelError> {
        self.filter(|_| true)
    }

    /// Records matching `pred`, in insertion order. A linear scan; tables are unindexed.
    pub fn filter<F>(&self, pred: F) -> Result<Vec<Record>, ModelError>
    where
        F: Fn(&Record) -> bool,
    {
        let table = self.read()?;
        Ok(table
            .rows
            .iter()
            .map(|(id, row)| self.record(*id, row))
            .filter(|r| pred(r))
            .collect())
    }

    pub fn count(&self) -> Result<usize, ModelError> {
        Ok(self.read()?.rows.len())
    }

    /// Re-validate and write `record`.
    ///
    /// A saved record overwrites its stored row; an unsaved one is inserted under a fresh id.
    /// On success `record` holds the normalized values that were stored.
    pub fn save(&self, record: &mut Record) -> Result<(), ModelError> {
        if record.model_name() != self.name() {
            return Err(ModelError::WrongModel {
                expected: self.name().to_string(),
                found: record.model_name().to_string(),
            });
        }
        let mut table = self.write()?;
        let now = Utc::now();
        match record.id() {
            Some(id) => {
                let stored = table.rows.get(&id).ok_or_else(|| self.does_not_exist(id))?;
                let cleaned = record.clean(Some(stored), now)?;
                table.rows.insert(id, cleaned.clone());
                *record = Record::persisted(Arc::clone(&self.schema), id, cleaned);
                tracing::debug!(model = %self.name(), id, "record updated");
            }
            None => {
                let cleaned = record.clean(None, now)?;
                let id = table.next_id();
                table.rows.insert(id, cleaned.clone());
                *record = Record::persisted(Arc::clone(&self.schema), id, cleaned);
                tracing::debug!(model = %self.name(), id, "record created");
            }
        }
        Ok(())
    }

    /// Remove a record. Its id is not handed out again.
    pub fn delete(&self, id: u64) -> Result<Record, ModelError> {
        let mut table = self.write()?;
        let row = table.rows.remove(&id).ok_or_else(|| self.does_not_exist(id))?;
        tracing::debug!(model = %self.name(), id, "record deleted");
        Ok(Record::persisted(Arc::clone(&self.schema), id, row))
    }

    /// Drop every row and reset the id counter.
    pub fn clear(&self) -> Result<(), ModelError> {
        let mut table = self.write()?;
        *table = Table::default();
        Ok(())
    }

    fn record(&self, id: u64, row: &HashMap<String, Value>) -> Record {
        Record::persisted(Arc::clone(&self.schema), id, row.clone())
    }

    fn does_not_exist(&self, id: u64) -> ModelError {
        ModelError::DoesNotExist {
            model: self.name().to_string(),
            id,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Table>, ModelError> {
        self.table
            .read()
            .map_err(|_| ModelError::StoreLock(self.name().to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Table>, ModelError> {
        self.table
            .write()
            .map_err(|_| ModelError::StoreLock(self.name().to_string()))
    }
}

/// All model tables of one process, constructed at startup and passed to controllers.
#[derive(Default)]
pub struct Database {
    stores: Vec<Arc<ModelStore>>,
}

impl Database {
    pub fn new<I>(schemas: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = Arc<Schema>>,
    {
        let mut db = Database::default();
        for schema in schemas {
            db.register(schema)?;
        }
        Ok(db)
    }

    pub fn register(&mut self, schema: Arc<Schema>) -> Result<Arc<ModelStore>, SchemaError> {
        if self.model(schema.name()).is_some() {
            return Err(SchemaError::DuplicateModel(schema.name().to_string()));
        }
        let store = Arc::new(ModelStore::new(schema));
        self.stores.push(Arc::clone(&store));
        Ok(store)
    }

    pub fn model(&self, name: &str) -> Option<Arc<ModelStore>> {
        self.stores.iter().find(|s| s.name() == name).cloned()
    }

    pub fn models(&self) -> impl Iterator<Item = &Arc<ModelStore>> {
        self.stores.iter()
    }

    /// Reset every table and id counter. Test setup only.
    pub fn clear(&self) -> Result<(), ModelError> {
        for store in self.models() {
            store.clear()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::Field;
    use serde_json::json;

    fn store() -> ModelStore {
        let schema = Schema::builder("TestUser")
            .field("name", Field::text().required())
            .field("age", Field::integer())
            .field("created_at", Field::datetime().auto_now())
            .build()
            .unwrap();
        ModelStore::new(Arc::new(schema))
    }

    fn attrs(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn create_and_get() {
        let users = store();
        let user = users.create(attrs(json!({ "name": "Alice", "age": 25 }))).unwrap();
        assert_eq!(user.id(), Some(1));

        let fetched = users.get(1).unwrap();
        assert_eq!(fetched.get_str("name"), Some("Alice"));
        assert_eq!(fetched.get_i64("age"), Some(25));
        assert!(fetched.get_datetime("created_at").is_some());
    }

    #[test]
    fn all_and_count() {
        let users = store();
        users.create(attrs(json!({ "name": "A", "age": 1 }))).unwrap();
        users.create(attrs(json!({ "name": "B", "age": 2 }))).unwrap();
        assert_eq!(users.count().unwrap(), 2);
        let names: Vec<String> = users
            .all()
            .unwrap()
            .iter()
            .map(|r| r.get_str("name").unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn update_overwrites_stored_row() {
        let users = store();
        let mut user = users.create(attrs(json!({ "name": "Old", "age": 20 }))).unwrap();
        let created_at = user.get("created_at").cloned();
        user.set("name", "New").unwrap();
        users.save(&mut user).unwrap();

        let fetched = users.get(user.id().unwrap()).unwrap();
        assert_eq!(fetched.get_str("name"), Some("New"));
        assert_eq!(fetched.get("created_at").cloned(), created_at);
        assert_eq!(users.count().unwrap(), 1);
    }

    #[test]
    fn missing_required_field_inserts_nothing() {
        let users = store();
        let err = users.create(attrs(json!({ "age": 20 }))).unwrap_err();
        match err {
            ModelError::Validation(errors) => assert!(errors.has("name")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(users.count().unwrap(), 0);
    }

    #[test]
    fn save_rejects_invalid_integer() {
        let users = store();
        let mut user = users.build(attrs(json!({ "name": "Test", "age": "abc" })));
        assert!(matches!(users.save(&mut user), Err(ModelError::Validation(_))));
        assert_eq!(users.count().unwrap(), 0);
        assert!(!user.is_saved());
    }

    #[test]
    fn failed_save_leaves_stored_row_untouched() {
        let users = store();
        let mut user = users.create(attrs(json!({ "name": "Keep", "age": 3 }))).unwrap();
        user.set("age", "abc").unwrap();
        assert!(users.save(&mut user).is_err());
        assert_eq!(users.get(1).unwrap().get_i64("age"), Some(3));
    }

    #[test]
    fn get_missing_is_does_not_exist() {
        let users = store();
        assert!(matches!(users.get(999), Err(ModelError::DoesNotExist { id: 999, .. })));
    }

    #[test]
    fn ids_are_never_reused() {
        let users = store();
        users.create(attrs(json!({ "name": "A" }))).unwrap();
        users.create(attrs(json!({ "name": "B" }))).unwrap();
        users.delete(2).unwrap();
        let c = users.create(attrs(json!({ "name": "C" }))).unwrap();
        assert_eq!(c.id(), Some(3));
        assert!(users.get(2).is_err());
    }

    #[test]
    fn round_trip_through_to_dict() {
        let users = store();
        let original = users.create(attrs(json!({ "name": "Round", "age": 7 }))).unwrap();
        let mut dict = original.to_dict().as_object().cloned().unwrap();
        dict.remove("id");
        let copy = users.create(dict).unwrap();
        assert_eq!(copy.get("name"), original.get("name"));
        assert_eq!(copy.get("age"), original.get("age"));
        assert_ne!(copy.id(), original.id());
    }

    #[test]
    fn database_clear_resets_ids() {
        let schema = Arc::clone(store().schema());
        let db = Database::new(vec![schema]).unwrap();
        let users = db.model("TestUser").unwrap();
        users.create(attrs(json!({ "name": "A" }))).unwrap();
        db.clear().unwrap();
        assert_eq!(users.count().unwrap(), 0);
        assert_eq!(users.create(attrs(json!({ "name": "B" }))).unwrap().id(), Some(1));
    }

    #[test]
    fn concurrent_creates_get_distinct_sequential_ids() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 50;
        let users = Arc::new(store());
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let users = Arc::clone(&users);
                std::thread::spawn(move || {
                    (0..PER_THREAD)
                        .map(|i| {
                            users
                                .create(attrs(json!({ "name": format!("u{t}-{i}") })))
                                .unwrap()
                                .id()
                                .unwrap()
                        })
                        .collect::<Vec<u64>>()
                })
            })
            .collect();
        let mut ids: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        let total = (THREADS * PER_THREAD) as u64;
        assert_eq!(ids, (1..=total).collect::<Vec<u64>>());
        assert_eq!(users.count().unwrap(), THREADS * PER_THREAD);
    }

    #[test]
    fn database_lists_registered_models() {
        let schema = Arc::clone(store().schema());
        let db = Database::new(vec![schema]).unwrap();
        let names: Vec<&str> = db.models().map(|m| m.name()).collect();
        assert_eq!(names, vec!["TestUser"]);
    }

    #[test]
    fn database_rejects_duplicate_models() {
        let schema = Arc::clone(store().schema());
        let err = Database::new(vec![Arc::clone(&schema), schema]).err();
        assert_eq!(err, Some(SchemaError::DuplicateModel("TestUser".into())));
    }
}
