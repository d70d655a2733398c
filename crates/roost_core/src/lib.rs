//! Core persistence engine for Roost.
//! This crate owns the record lifecycle contract and the file-backed store.

pub mod config;
pub mod logging;
pub mod model;
pub mod store;

pub use config::{StoreConfig, STORE_PATH_ENV};
pub use logging::{
    default_log_level, init_logging, init_logging_from_env, logging_status, LoggingError,
    LOG_DIR_ENV,
};
pub use model::entities::{Amenity, BaseModel, City, Place, Review, State, User, FIELD_DEFAULT};
pub use model::entity::{storage_key, Entity, EntityType};
pub use model::record::{FieldValue, Fields, ModelError, ModelResult, Record, Timestamp};
pub use store::{Store, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
