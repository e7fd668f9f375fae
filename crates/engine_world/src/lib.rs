//! # engine_world
//!
//! The world half of the ECS: who owns what, and how it is walked.
//!
//! - [`World`]: entity hierarchy and component ownership over dense
//!   per-type columns, with swap-delete relocation patching.
//! - Reparenting that keeps each entity's world-space [`Transform`]
//!   (see [`World::parent_entity`]).
//! - [`QueryResult`]: signature resolution seeded from the least common
//!   required type.
//! - [`System`] / [`SystemList`]: per-tick dispatch in registration order.
//! - A length-prefixed binary codec for entity subtrees
//!   ([`World::serialize_entity`], [`World::deserialize_entity`]).
//!
//! [`Transform`]: engine_math::Transform

pub mod entity;
pub mod error;
mod hierarchy;
pub mod query;
pub mod serial;
pub mod system;
pub mod world;

pub use entity::{EntityNode, ManifestEntry};
pub use error::SerialError;
pub use query::{QueryResult, QueryRow};
pub use system::{System, SystemList};
pub use world::{ComponentRef, DEFAULT_ENTITY_NAME, World};
