//! Static class-name registry used for polymorphic reload.
//!
//! Adding an entity type means adding one `register::<T>` line below.

use crate::model::entities::{Amenity, BaseModel, City, Place, Review, State, User};
use crate::model::entity::{Entity, EntityType};
use crate::model::record::ModelResult;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Rebuilds one entity from its dictionary form.
pub type EntityFactory = fn(&Map<String, Value>) -> ModelResult<Box<dyn Entity>>;

static REGISTRY: Lazy<BTreeMap<&'static str, EntityFactory>> = Lazy::new(|| {
    let mut registry = BTreeMap::new();
    register::<BaseModel>(&mut registry);
    register::<User>(&mut registry);
    register::<State>(&mut registry);
    register::<City>(&mut registry);
    register::<Amenity>(&mut registry);
    register::<Place>(&mut registry);
    register::<Review>(&mut registry);
    registry
});

fn register<T: EntityType>(registry: &mut BTreeMap<&'static str, EntityFactory>) {
    registry.insert(T::CLASS_NAME, build::<T>);
}

fn build<T: EntityType>(data: &Map<String, Value>) -> ModelResult<Box<dyn Entity>> {
    let entity: Box<dyn Entity> = Box::new(T::from_dict(data)?);
    Ok(entity)
}

/// Returns the factory registered for `class_name`.
pub fn lookup(class_name: &str) -> Option<EntityFactory> {
    REGISTRY.get(class_name).copied()
}

pub fn is_registered(class_name: &str) -> bool {
    REGISTRY.contains_key(class_name)
}

/// Returns registered class names in sorted order.
pub fn class_names() -> Vec<&'static str> {
    REGISTRY.keys().copied().collect()
}
