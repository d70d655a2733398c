//! Persisted domain model.
//!
//! # Responsibility
//! - Define the base record contract shared by every entity.
//! - Declare the concrete entity catalogue and its class-name registry.
//!
//! # Invariants
//! - Every entity is identified by `"<ClassName>.<id>"` in storage.
//! - The dictionary form is the only persisted shape.

pub mod entities;
pub mod entity;
pub mod record;
pub mod registry;
