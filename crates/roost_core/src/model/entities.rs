//! Concrete entity catalogue.
//!
//! # Responsibility
//! - Declare the typed text fields each entity carries on top of `Record`.
//!
//! # Invariants
//! - Declared fields read as `""` until assigned.
//! - Unset declared fields are absent from `fields()` and `to_dict()`.
//! - Declared names never live in the record's extra attributes, except for
//!   non-text values restored from a dictionary; a set typed field wins.
//! - No relational checks between entities (`Review::place_id` is free text).

use crate::model::entity::{Entity, EntityType};
use crate::model::record::{write_repr, FieldValue, Fields, Record};
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt::{Display, Formatter};

/// Type-level fallback returned for unset declared fields.
pub const FIELD_DEFAULT: &str = "";

/// Number of leading base fields (`id`, `createdAt`, `updatedAt`) in `Fields`.
const BASE_FIELD_COUNT: usize = 3;

macro_rules! declare_entity {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$field_meta:meta])* $field:ident),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            record: Record,
            $($(#[$field_meta])* pub $field: Option<String>,)*
        }

        impl $name {
            $(
                /// Returns the assigned value or the type-level default.
                pub fn $field(&self) -> &str {
                    self.$field.as_deref().unwrap_or(FIELD_DEFAULT)
                }
            )*

            fn declared_values(&self) -> Vec<(&'static str, &Option<String>)> {
                vec![$((stringify!($field), &self.$field)),*]
            }
        }

        impl Entity for $name {
            fn class_name(&self) -> &'static str {
                Self::CLASS_NAME
            }

            fn record(&self) -> &Record {
                &self.record
            }

            fn record_mut(&mut self) -> &mut Record {
                &mut self.record
            }

            fn fields(&self) -> Fields {
                let declared = self
                    .declared_values()
                    .into_iter()
                    .filter_map(|(name, value)| {
                        value
                            .as_ref()
                            .map(|value| (name.to_string(), FieldValue::Text(value.clone())))
                    })
                    .collect::<Vec<_>>();
                let mut fields = self.record.fields();
                fields.retain(|(name, value)| {
                    !matches!(value, FieldValue::Json(_))
                        || !declared.iter().any(|(declared_name, _)| declared_name == name)
                });
                fields.splice(BASE_FIELD_COUNT..BASE_FIELD_COUNT, declared);
                fields
            }

            fn to_dict(&self) -> Map<String, Value> {
                let mut dict = self.record.to_dict(Self::CLASS_NAME);
                for (name, value) in self.declared_values() {
                    if let Some(value) = value {
                        dict.insert(name.to_string(), Value::String(value.clone()));
                    }
                }
                dict
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }

        impl EntityType for $name {
            const CLASS_NAME: &'static str = stringify!($name);
            const DECLARED_FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];

            fn from_record(mut record: Record) -> Self {
                record.bind_declared(Self::DECLARED_FIELDS);
                Self {
                    $($field: record.take_text_attr(stringify!($field)),)*
                    record,
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write_repr(f, Self::CLASS_NAME, &self.record.id, &self.fields())
            }
        }
    };
}

declare_entity! {
    /// Plain record with no declared fields.
    BaseModel {}
}

declare_entity! {
    /// Account holder.
    User {
        email,
        password,
        first_name,
        last_name,
    }
}

declare_entity! {
    State {
        name,
    }
}

declare_entity! {
    City {
        /// Id of the owning `State`.
        state_id,
        name,
    }
}

declare_entity! {
    Amenity {
        name,
    }
}

declare_entity! {
    /// Rentable place listed by a user in a city.
    Place {
        city_id,
        user_id,
        name,
        description,
    }
}

declare_entity! {
    /// Free-text review a user leaves on a place.
    Review {
        place_id,
        user_id,
        text,
    }
}
