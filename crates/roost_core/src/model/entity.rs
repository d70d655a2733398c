//! Entity traits shared by every concrete persisted type.

use crate::model::record::{write_repr, Fields, ModelResult, Record};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt::{Debug, Display, Formatter};

/// Identity-map key for one entity: `"<ClassName>.<id>"`.
pub fn storage_key(class_name: &str, id: &str) -> String {
    format!("{class_name}.{id}")
}

/// Object-safe view over a persisted entity.
///
/// The store keeps entities as `Box<dyn Entity>` and only needs identity,
/// the record half and the dictionary form.
pub trait Entity: Any + Debug {
    fn class_name(&self) -> &'static str;
    fn record(&self) -> &Record;
    fn record_mut(&mut self) -> &mut Record;

    /// Live field set, typed fields included once they are set.
    fn fields(&self) -> Fields;

    /// Fresh dictionary with `__class__` and ISO-8601 timestamps.
    fn to_dict(&self) -> Map<String, Value>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn id(&self) -> &str {
        &self.record().id
    }

    fn storage_key(&self) -> String {
        storage_key(self.class_name(), self.id())
    }
}

/// Construction contract for one concrete entity type.
pub trait EntityType: Entity + Sized {
    /// Discriminator written to `__class__`.
    const CLASS_NAME: &'static str;

    /// Field names declared by the type, each defaulting to `""` while unset.
    const DECLARED_FIELDS: &'static [&'static str];

    /// Wraps a record, moving text attributes that name declared fields
    /// into those fields.
    fn from_record(record: Record) -> Self;

    /// Reconstructs an entity from its dictionary form. The result is not
    /// registered with any store.
    fn from_dict(data: &Map<String, Value>) -> ModelResult<Self> {
        Record::from_dict(data).map(Self::from_record)
    }

    /// Legacy construction surface: positional values are accepted and ignored.
    fn restore(positional: &[Value], data: &Map<String, Value>) -> ModelResult<Self> {
        Record::restore(positional, data).map(Self::from_record)
    }
}

impl Display for dyn Entity + '_ {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_repr(f, self.class_name(), self.id(), &self.fields())
    }
}
