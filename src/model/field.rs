//! Field descriptors: the kind and constraints of one model attribute.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Integer,
    Datetime,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Datetime => "datetime",
        }
    }
}

/// Why a single value was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("this field is required")]
    Missing,
    #[error("expected {expected}, got {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("ensure this value has at most {max} characters (it has {actual})")]
    TooLong { max: usize, actual: usize },
    #[error("\"{0}\" is not a valid integer")]
    InvalidInteger(String),
    #[error("\"{0}\" is not a valid RFC 3339 datetime")]
    InvalidDatetime(String),
}

/// Constraints for one attribute. Holds no per-record value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub kind: FieldKind,
    pub max_length: Option<usize>,
    pub required: bool,
    /// Datetime only: set once when the record is first persisted; caller input is ignored.
    pub auto_now: bool,
}

impl Field {
    fn of(kind: FieldKind) -> Self {
        Field {
            kind,
            max_length: None,
            required: false,
            auto_now: false,
        }
    }

    pub fn text() -> Self {
        Field::of(FieldKind::Text)
    }

    pub fn integer() -> Self {
        Field::of(FieldKind::Integer)
    }

    pub fn datetime() -> Self {
        Field::of(FieldKind::Datetime)
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn auto_now(mut self) -> Self {
        self.auto_now = true;
        self
    }

    /// Validate one raw value and return its normalized form.
    ///
    /// `None` means the attribute was never supplied; an explicit JSON `null` is treated the same.
    /// An empty string is a present value and only fails if the kind rejects it.
    /// Numeric strings that parse exactly as `i64` are accepted by integer fields.
    pub fn clean(&self, value: Option<&Value>) -> Result<Value, Violation> {
        let value = match value {
            None | Some(Value::Null) => {
                return if self.required {
                    Err(Violation::Missing)
                } else {
                    Ok(Value::Null)
                };
            }
            Some(v) => v,
        };
        match self.kind {
            FieldKind::Text => self.clean_text(value),
            FieldKind::Integer => clean_integer(value),
            FieldKind::Datetime => clean_datetime(value),
        }
    }

    fn clean_text(&self, value: &Value) -> Result<Value, Violation> {
        let s = value.as_str().ok_or(Violation::WrongType {
            expected: FieldKind::Text.as_str(),
            found: json_type_name(value),
        })?;
        if let Some(max) = self.max_length {
            let actual = s.chars().count();
            if actual > max {
                return Err(Violation::TooLong { max, actual });
            }
        }
        Ok(Value::String(s.to_string()))
    }
}

fn clean_integer(value: &Value) -> Result<Value, Violation> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(|i| Value::Number(i.into()))
            .ok_or_else(|| Violation::InvalidInteger(n.to_string())),
        Value::String(s) => s
            .parse::<i64>()
            .map(|i| Value::Number(i.into()))
            .map_err(|_| Violation::InvalidInteger(s.clone())),
        other => Err(Violation::WrongType {
            expected: FieldKind::Integer.as_str(),
            found: json_type_name(other),
        }),
    }
}

fn clean_datetime(value: &Value) -> Result<Value, Violation> {
    let s = value.as_str().ok_or(Violation::WrongType {
        expected: FieldKind::Datetime.as_str(),
        found: json_type_name(value),
    })?;
    let parsed = DateTime::parse_from_rfc3339(s).map_err(|_| Violation::InvalidDatetime(s.to_string()))?;
    Ok(datetime_value(parsed.with_timezone(&Utc)))
}

/// Text rendering used for every stored datetime.
pub fn datetime_value(at: DateTime<Utc>) -> Value {
    Value::String(at.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
