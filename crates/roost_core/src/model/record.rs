//! Base record lifecycle contract.
//!
//! # Responsibility
//! - Own identity and creation/update timestamps for every persisted entity.
//! - Convert between the live field set and the flat dictionary form.
//!
//! # Invariants
//! - `id` is generated once for fresh records and adopted verbatim on restore.
//! - `updated_at >= created_at` under the normal lifecycle.
//! - Dictionary timestamps are ISO-8601 text, never native values.
//! - Reserved keys cannot be shadowed by extra attributes.
//! - Names declared as typed fields by the owning entity cannot be set as
//!   extra attributes.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Discriminator key naming the concrete type in a dictionary.
pub const CLASS_KEY: &str = "__class__";
pub const ID_KEY: &str = "id";
pub const CREATED_AT_KEY: &str = "createdAt";
pub const UPDATED_AT_KEY: &str = "updatedAt";

/// Text form written for timestamps. Microsecond precision keeps it lossless.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const RESERVED_KEYS: [&str; 4] = [CLASS_KEY, ID_KEY, CREATED_AT_KEY, UPDATED_AT_KEY];

/// Zone-less wall-clock timestamp taken from the UTC clock.
pub type Timestamp = NaiveDateTime;

pub type ModelResult<T> = Result<T, ModelError>;

/// Record construction and operation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// An operation received input it does not accept.
    InvalidArgument { operation: String, detail: String },
    /// A timestamp key was missing, not text, or not ISO-8601.
    InvalidTimestamp { field: &'static str, detail: String },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument { operation, detail } => {
                write!(f, "invalid argument for `{operation}`: {detail}")
            }
            Self::InvalidTimestamp { field, detail } => {
                write!(f, "invalid timestamp for `{field}`: {detail}")
            }
        }
    }
}

impl Error for ModelError {}

/// Rejects any argument passed to an argument-free operation.
pub fn ensure_no_args(operation: &str, args: &[Value]) -> ModelResult<()> {
    if args.is_empty() {
        return Ok(());
    }
    Err(ModelError::InvalidArgument {
        operation: operation.to_string(),
        detail: format!("takes no arguments but {} were given", args.len()),
    })
}

/// Current time, truncated to the precision of the text form.
pub fn now() -> Timestamp {
    Utc::now().naive_utc().trunc_subsecs(6)
}

/// Renders a timestamp in the persisted ISO-8601 form.
pub fn format_timestamp(value: &Timestamp) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(field: &'static str, value: Option<&Value>) -> ModelResult<Timestamp> {
    match value {
        Some(Value::String(text)) => NaiveDateTime::parse_from_str(text, TIMESTAMP_PARSE_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(text).map(|value| value.naive_utc()))
            .map_err(|err| ModelError::InvalidTimestamp {
                field,
                detail: format!("`{text}` is not ISO-8601: {err}"),
            }),
        Some(other) => Err(ModelError::InvalidTimestamp {
            field,
            detail: format!("expected ISO-8601 text, got {other}"),
        }),
        None => Err(ModelError::InvalidTimestamp {
            field,
            detail: "value is missing".to_string(),
        }),
    }
}

/// One value of the live field set.
///
/// Unlike the dictionary form, timestamps stay native here.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Timestamp(Timestamp),
    Json(Value),
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) | Self::Json(Value::String(text)) => write!(f, "'{text}'"),
            Self::Timestamp(value) => write!(f, "{value:?}"),
            Self::Json(value) => write!(f, "{value}"),
        }
    }
}

/// Live field set in display order.
pub type Fields = Vec<(String, FieldValue)>;

/// Writes the `[<Class>] (<id>) {...}` diagnostic form.
pub(crate) fn write_repr(
    f: &mut Formatter<'_>,
    class_name: &str,
    id: &str,
    fields: &[(String, FieldValue)],
) -> std::fmt::Result {
    write!(f, "[{class_name}] ({id}) {{")?;
    for (index, (name, value)) in fields.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "'{name}': {value}")?;
    }
    f.write_str("}")
}

/// State shared by every persisted entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Globally unique identity. Owners may overwrite it in tests only.
    pub id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    attributes: Map<String, Value>,
    /// Typed field names of the owning entity, kept out of `attributes`.
    declared: &'static [&'static str],
}

impl Record {
    /// Creates a fresh record with a generated id and `created_at == updated_at`.
    ///
    /// Only the store builds fresh records, so every one of them is registered.
    pub(crate) fn new() -> Self {
        let created_at = now();
        Self {
            id: Uuid::new_v4().to_string(),
            created_at,
            updated_at: created_at,
            attributes: Map::new(),
            declared: &[],
        }
    }

    /// Reconstructs a record from its dictionary form.
    ///
    /// # Errors
    /// - `InvalidTimestamp` when `createdAt` or `updatedAt` is missing, not
    ///   text, or not ISO-8601.
    /// - `InvalidArgument` when `id` is missing or not text.
    pub fn from_dict(data: &Map<String, Value>) -> ModelResult<Self> {
        let created_at = parse_timestamp(CREATED_AT_KEY, data.get(CREATED_AT_KEY))?;
        let updated_at = parse_timestamp(UPDATED_AT_KEY, data.get(UPDATED_AT_KEY))?;
        let id = match data.get(ID_KEY) {
            Some(Value::String(id)) => id.clone(),
            Some(other) => {
                return Err(ModelError::InvalidArgument {
                    operation: "from_dict".to_string(),
                    detail: format!("`{ID_KEY}` must be text, got {other}"),
                })
            }
            None => {
                return Err(ModelError::InvalidArgument {
                    operation: "from_dict".to_string(),
                    detail: format!("`{ID_KEY}` is missing"),
                })
            }
        };

        let attributes = data
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            id,
            created_at,
            updated_at,
            attributes,
            declared: &[],
        })
    }

    /// Legacy construction surface: positional values are accepted and ignored.
    pub fn restore(_positional: &[Value], data: &Map<String, Value>) -> ModelResult<Self> {
        Self::from_dict(data)
    }

    /// Resets `updated_at` to the current time.
    pub fn touch(&mut self) {
        self.updated_at = now();
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Attaches an extra named value that round-trips through the dictionary.
    ///
    /// # Errors
    /// - `InvalidArgument` when `name` is one of the reserved keys or a typed
    ///   field declared by the owning entity.
    pub fn set_attr(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> ModelResult<()> {
        let name = name.into();
        if RESERVED_KEYS.contains(&name.as_str()) {
            return Err(ModelError::InvalidArgument {
                operation: "set_attr".to_string(),
                detail: format!("`{name}` is reserved"),
            });
        }
        if self.declared.contains(&name.as_str()) {
            return Err(ModelError::InvalidArgument {
                operation: "set_attr".to_string(),
                detail: format!("`{name}` is a declared field; assign it directly"),
            });
        }
        self.attributes.insert(name, value.into());
        Ok(())
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Binds the record to an entity's declared field names.
    pub(crate) fn bind_declared(&mut self, declared: &'static [&'static str]) {
        self.declared = declared;
    }

    /// Moves a text attribute out so a typed field can own it.
    /// Non-text values stay as attributes.
    pub(crate) fn take_text_attr(&mut self, name: &str) -> Option<String> {
        match self.attributes.remove(name) {
            Some(Value::String(text)) => Some(text),
            Some(other) => {
                self.attributes.insert(name.to_string(), other);
                None
            }
            None => None,
        }
    }

    /// Returns the live field set with native timestamps.
    pub fn fields(&self) -> Fields {
        let mut fields = vec![
            (ID_KEY.to_string(), FieldValue::Text(self.id.clone())),
            (
                CREATED_AT_KEY.to_string(),
                FieldValue::Timestamp(self.created_at),
            ),
            (
                UPDATED_AT_KEY.to_string(),
                FieldValue::Timestamp(self.updated_at),
            ),
        ];
        fields.extend(
            self.attributes
                .iter()
                .map(|(key, value)| (key.clone(), FieldValue::Json(value.clone()))),
        );
        fields
    }

    /// Returns a fresh dictionary tagged with `class_name`.
    pub fn to_dict(&self, class_name: &str) -> Map<String, Value> {
        let mut dict = self.attributes.clone();
        dict.insert(CLASS_KEY.to_string(), Value::String(class_name.to_string()));
        dict.insert(ID_KEY.to_string(), Value::String(self.id.clone()));
        dict.insert(
            CREATED_AT_KEY.to_string(),
            Value::String(format_timestamp(&self.created_at)),
        );
        dict.insert(
            UPDATED_AT_KEY.to_string(),
            Value::String(format_timestamp(&self.updated_at)),
        );
        dict
    }
}
