use serde_json::{Map, Value};
use std::collections::HashMap;

/// An HTTP request as handed over by the transport.
///
/// The request target is split into `path` and `query_params` on construction.
/// `path_params` stays empty until the router matches a route.
#[derive(Clone, Debug)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query_params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub path_params: HashMap<String, String>,
}

impl Default for Request {
    fn default() -> Self {
        Request::new("GET", "/")
    }
}

impl Request {
    /// Build from a method and a request target such as `/search?q=rust&page=1`.
    pub fn new(method: &str, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (target, None),
        };
        let path = if path.is_empty() { "/" } else { path };
        Request {
            method: method.trim().to_ascii_uppercase(),
            path: path.to_string(),
            query_params: query.map(parse_query).unwrap_or_default(),
            headers: HashMap::new(),
            body: String::new(),
            path_params: HashMap::new(),
        }
    }

    pub fn get(target: &str) -> Self {
        Request::new("GET", target)
    }

    pub fn post(target: &str, body: impl Into<String>) -> Self {
        Request::new("POST", target).with_body(body)
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Header lookup, case-insensitive on the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    /// Body parsed as a JSON object. Empty, malformed or non-object bodies yield an empty map.
    pub fn json(&self) -> Map<String, Value> {
        if self.body.trim().is_empty() {
            return Map::new();
        }
        match serde_json::from_str::<Value>(&self.body) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                tracing::debug!(path = %self.path, "request body is not a JSON object");
                Map::new()
            }
            Err(e) => {
                tracing::debug!(path = %self.path, error = %e, "request body is not valid JSON");
                Map::new()
            }
        }
    }
}

/// `a=1&b=2` into a map; the last occurrence of a key wins.
fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_initialization() {
        let req = Request::new("post", "/api/data");
        assert_eq!(req.method, "POST");
        assert_eq!(req.path, "/api/data");
        assert!(req.path_params.is_empty());
        assert!(req.query_params.is_empty());
    }

    #[test]
    fn default_is_get_root() {
        let req = Request::default();
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/");
    }

    #[test]
    fn query_params_parsing() {
        let req = Request::get("/search?q=python&page=1");
        assert_eq!(req.path, "/search");
        assert_eq!(req.query_param("q"), Some("python"));
        assert_eq!(req.query_param("page"), Some("1"));
        assert_eq!(req.query_params.len(), 2);
    }

    #[test]
    fn query_last_occurrence_wins() {
        let req = Request::get("/search?q=a&q=b&flag");
        assert_eq!(req.query_param("q"), Some("b"));
        assert_eq!(req.query_param("flag"), Some(""));
    }

    #[test]
    fn query_values_are_decoded() {
        let req = Request::get("/search?q=hello+world&name=a%26b");
        assert_eq!(req.query_param("q"), Some("hello world"));
        assert_eq!(req.query_param("name"), Some("a&b"));
    }

    #[test]
    fn query_keys_and_bad_escapes_are_decoded() {
        let req = Request::get("/s?q=%FF&k%3D=v&x=a%2Bb+c&=skip");
        assert_eq!(req.query_param("q"), Some("\u{FFFD}"));
        assert_eq!(req.query_param("k="), Some("v"));
        assert_eq!(req.query_param("x"), Some("a+b c"));
        assert_eq!(req.query_params.len(), 3);
    }

    #[test]
    fn json_parsing() {
        let req = Request::post("/", r#"{"key": "value"}"#);
        let body = req.json();
        assert_eq!(body.get("key"), Some(&Value::String("value".into())));
    }

    #[test]
    fn invalid_json_yields_empty_map() {
        assert!(Request::post("/", "invalid").json().is_empty());
        assert!(Request::post("/", "").json().is_empty());
        assert!(Request::post("/", "[1, 2]").json().is_empty());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::get("/").with_header("Content-Type", "application/json");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("accept"), None);
    }
}
