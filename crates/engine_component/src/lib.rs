//! # engine_component
//!
//! The "C" in ECS: what a component is, how its type is registered, and how
//! its records are stored.
//!
//! This crate provides:
//!
//! - [`EntityHandle`] / [`ComponentHandle`]: stable 128-bit identities.
//! - [`Component`] trait and the type-erased [`ComponentMeta`] vtable.
//! - [`ComponentRegistry`]: explicit, startup-time type registration.
//! - [`Column`]: dense per-type storage with swap-delete.
//! - [`Signature`]: ordered required/optional component requirements.

pub mod column;
pub mod component;
pub mod handle;
pub mod query;
pub mod registry;

pub use column::{Column, MAX_COMPONENT_ALIGN, RecordOwner, Relocation};
pub use component::{AnyComponent, Component, ComponentId, ComponentMeta};
pub use handle::{ComponentHandle, EntityHandle};
pub use query::{Requirement, Signature};
pub use registry::ComponentRegistry;
