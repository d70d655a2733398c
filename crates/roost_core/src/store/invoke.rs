//! Name-based call surface used by external shells.
//!
//! Shells dispatch entity operations by name with a loose argument list.
//! Argument-free operations reject any argument before side effects run.

use super::{Store, StoreError, StoreResult};
use crate::model::record::{ensure_no_args, ModelError};
use serde_json::Value;

impl Store {
    /// Invokes `method` on the entity stored under `key`.
    ///
    /// Supported methods:
    /// - `to_dict`: returns the entity dictionary.
    /// - `save`: same as [`Store::persist`]; returns `None`.
    ///
    /// # Errors
    /// - `InvalidArgument` when `args` is non-empty or `method` is unknown.
    /// - `NotFound` when no entity is registered under `key`.
    pub fn invoke(
        &mut self,
        key: &str,
        method: &str,
        args: &[Value],
    ) -> StoreResult<Option<Value>> {
        match method {
            "to_dict" => {
                ensure_no_args(method, args)?;
                let entity = self
                    .get_dyn(key)
                    .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
                Ok(Some(Value::Object(entity.to_dict())))
            }
            "save" => {
                ensure_no_args(method, args)?;
                self.persist(key)?;
                Ok(None)
            }
            other => Err(ModelError::InvalidArgument {
                operation: other.to_string(),
                detail: "unknown operation".to_string(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::StoreConfig;
    use crate::model::entities::Amenity;
    use crate::model::record::ModelError;
    use crate::store::{Store, StoreError};
    use serde_json::{json, Value};

    #[test]
    fn to_dict_by_name_matches_entity_dictionary() {
        let mut store = Store::new(StoreConfig::new("unused.json"));
        let key = store.create::<Amenity>();

        let value = store.invoke(&key, "to_dict", &[]).unwrap().unwrap();
        assert_eq!(value["__class__"], json!("Amenity"));
        assert_eq!(
            Some(&value),
            store
                .get_dyn(&key)
                .map(|entity| Value::Object(entity.to_dict()))
                .as_ref()
        );
    }

    #[test]
    fn unknown_method_is_invalid_argument() {
        let mut store = Store::new(StoreConfig::new("unused.json"));
        let key = store.create::<Amenity>();

        let err = store.invoke(&key, "destroy", &[]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Model(ModelError::InvalidArgument { operation, .. }) if operation == "destroy"
        ));
    }

    #[test]
    fn unknown_key_is_not_found() {
        let mut store = Store::new(StoreConfig::new("unused.json"));
        let err = store.invoke("Amenity.nope", "to_dict", &[]).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
