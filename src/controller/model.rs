//! Generic CRUD over one model store.

use crate::controller::parse_id;
use crate::error::AppError;
use crate::http::{Request, Response};
use crate::model::{ModelStore, Record};
use serde_json::{Map, Value};
use std::sync::Arc;

pub struct ModelController {
    store: Arc<ModelStore>,
}

impl ModelController {
    pub fn new(store: Arc<ModelStore>) -> Self {
        ModelController { store }
    }

    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    /// 200 with every record as a JSON array, in table order.
    ///
    /// Query parameters naming a schema field filter by exact (textual) match;
    /// `limit` and `offset` page the result. Other parameters are ignored.
    pub fn list(&self, req: &Request) -> Result<Response, AppError> {
        let schema = self.store.schema();
        let mut limit: Option<usize> = None;
        let mut offset: usize = 0;
        let mut filters: Vec<(&str, &str)> = Vec::new();
        for (k, v) in &req.query_params {
            match k.as_str() {
                "limit" => limit = v.parse().ok(),
                "offset" => offset = v.parse().unwrap_or(0),
                _ if schema.has_field(k) => filters.push((k.as_str(), v.as_str())),
                _ => {}
            }
        }
        let records = self
            .store
            .filter(|r| filters.iter().all(|(field, want)| matches_text(r.get(field), want)))?;
        let dicts: Vec<Value> = records
            .iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .map(Record::to_dict)
            .collect();
        Ok(Response::json(&dicts))
    }

    /// 201 with the created record; 400 when the body fails validation.
    pub fn create(&self, req: &Request) -> Result<Response, AppError> {
        self.create_from(req.json())
    }

    pub(crate) fn create_from(&self, data: Map<String, Value>) -> Result<Response, AppError> {
        let record = self.store.create(data)?;
        Ok(Response::created(&record.to_dict()))
    }

    /// 200 with the record; 404 if there is none with that id.
    pub fn retrieve(&self, id: &str) -> Result<Response, AppError> {
        let record = self.store.get(parse_id(id)?)?;
        Ok(Response::json(&record.to_dict()))
    }

    /// Merge the body into the stored record and save it. 200, 400 or 404.
    pub fn update(&self, req: &Request, id: &str) -> Result<Response, AppError> {
        let mut record = self.store.get(parse_id(id)?)?;
        for (name, value) in req.json() {
            if record.schema().has_field(&name) {
                record.set(&name, value)?;
            }
        }
        self.store.save(&mut record)?;
        Ok(Response::json(&record.to_dict()))
    }

    /// 204 once the record is gone; 404 if it never existed.
    pub fn destroy(&self, id: &str) -> Result<Response, AppError> {
        self.store.delete(parse_id(id)?)?;
        Ok(Response::no_content())
    }
}

fn matches_text(value: Option<&Value>, want: &str) -> bool {
    match value {
        Some(Value::String(s)) => s == want,
        Some(Value::Number(n)) => n.to_string() == want,
        Some(Value::Bool(b)) => b.to_string() == want,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, Schema};
    use axum::http::StatusCode;
    use serde_json::json;

    fn controller() -> ModelController {
        let schema = Schema::builder("TestUser")
            .field("name", Field::text().required())
            .field("age", Field::integer())
            .build()
            .unwrap();
        let store = Arc::new(ModelStore::new(Arc::new(schema)));
        store
            .create(json!({ "name": "Existing", "age": 30 }).as_object().cloned().unwrap())
            .unwrap();
        ModelController::new(store)
    }

    fn body(res: &Response) -> Value {
        serde_json::from_str(&res.body).unwrap()
    }

    #[test]
    fn list() {
        let ctrl = controller();
        let res = ctrl.list(&Request::default()).unwrap();
        assert_eq!(res.status, StatusCode::OK);
        let data = body(&res);
        assert_eq!(data.as_array().map(Vec::len), Some(1));
        assert_eq!(data[0]["name"], "Existing");
    }

    #[test]
    fn list_filters_and_pages() {
        let ctrl = controller();
        ctrl.create(&Request::post("/", r#"{"name": "B", "age": 30}"#)).unwrap();
        ctrl.create(&Request::post("/", r#"{"name": "C", "age": 31}"#)).unwrap();

        let data = body(&ctrl.list(&Request::get("/?age=30")).unwrap());
        assert_eq!(data.as_array().map(Vec::len), Some(2));

        let data = body(&ctrl.list(&Request::get("/?offset=1&limit=1")).unwrap());
        assert_eq!(data.as_array().map(Vec::len), Some(1));
        assert_eq!(data[0]["name"], "B");

        let data = body(&ctrl.list(&Request::get("/?unknown=1")).unwrap());
        assert_eq!(data.as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn empty_filter_matches_only_empty_text() {
        let ctrl = controller();
        ctrl.create(&Request::post("/", r#"{"name": ""}"#)).unwrap();

        let data = body(&ctrl.list(&Request::get("/?name=")).unwrap());
        assert_eq!(data.as_array().map(Vec::len), Some(1));
        assert_eq!(data[0]["id"], 2);

        let data = body(&ctrl.list(&Request::get("/?age=")).unwrap());
        assert_eq!(data.as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn create_success() {
        let ctrl = controller();
        let res = ctrl
            .create(&Request::post("/", r#"{"name": "NewUser", "age": 22}"#))
            .unwrap();
        assert_eq!(res.status, StatusCode::CREATED);
        assert_eq!(body(&res)["id"], 2);
        assert_eq!(ctrl.store().count().unwrap(), 2);
    }

    #[test]
    fn create_validation_error() {
        let ctrl = controller();
        let err = ctrl.create(&Request::post("/", r#"{"age": 22}"#)).unwrap_err();
        let res = err.into_response();
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        let data = body(&res);
        assert_eq!(data["details"][0]["field"], "name");
        assert_eq!(ctrl.store().count().unwrap(), 1);
    }

    #[test]
    fn retrieve_found() {
        let ctrl = controller();
        let res = ctrl.retrieve("1").unwrap();
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(body(&res)["name"], "Existing");
    }

    #[test]
    fn retrieve_not_found() {
        let ctrl = controller();
        assert!(matches!(ctrl.retrieve("999"), Err(AppError::NotFound(_))));
        assert!(matches!(ctrl.retrieve("abc"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn update_merges_body() {
        let ctrl = controller();
        let req = Request::new("PUT", "/").with_body(r#"{"age": "41", "bogus": 1}"#);
        let res = ctrl.update(&req, "1").unwrap();
        let data = body(&res);
        assert_eq!(data["age"], 41);
        assert_eq!(data["name"], "Existing");

        let bad = Request::new("PUT", "/").with_body(r#"{"name": null}"#);
        assert!(matches!(ctrl.update(&bad, "1"), Err(AppError::Validation(_))));
        assert_eq!(body(&ctrl.retrieve("1").unwrap())["name"], "Existing");
    }

    #[test]
    fn destroy_then_missing() {
        let ctrl = controller();
        assert_eq!(ctrl.destroy("1").unwrap().status, StatusCode::NO_CONTENT);
        assert!(matches!(ctrl.destroy("1"), Err(AppError::NotFound(_))));
        assert_eq!(ctrl.store().count().unwrap(), 0);
    }
}
