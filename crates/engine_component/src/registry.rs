//! The component type registry.
//!
//! Concrete component types plug into the type-erased store by an explicit
//! [`ComponentRegistry::register`] call at startup. The registry hands out a
//! dense [`ComponentId`] per type and records its [`ComponentMeta`] vtable,
//! plus a name index used by scene loading and editor tooling.
//!
//! Every lookup fails soft: unknown ids, types and names come back as `None`.
//! Unknown names are routine when loading scenes written by another build.

use std::any::TypeId;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::column::MAX_COMPONENT_ALIGN;
use crate::component::{AnyComponent, Component, ComponentId, ComponentMeta};

/// Registry of every component type known to the process.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    /// Vtables indexed by [`ComponentId::index`].
    metas: Vec<ComponentMeta>,
    /// Rust type to id.
    by_type: HashMap<TypeId, ComponentId>,
    /// Persistent type name to id.
    by_name: HashMap<&'static str, ComponentId>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T`, returning its id.
    ///
    /// Registering the same type twice returns the id from the first call.
    ///
    /// # Panics
    ///
    /// Panics if `T` is aligned to more than [`MAX_COMPONENT_ALIGN`] bytes.
    pub fn register<T: Component>(&mut self) -> ComponentId {
        if let Some(&id) = self.by_type.get(&TypeId::of::<T>()) {
            return id;
        }

        let id = ComponentId(self.metas.len() as u32);
        let meta = ComponentMeta::of::<T>(id);
        assert!(
            meta.layout.align() <= MAX_COMPONENT_ALIGN,
            "component `{}` is aligned to {} bytes, at most {} is supported",
            meta.name,
            meta.layout.align(),
            MAX_COMPONENT_ALIGN
        );

        if self.by_name.contains_key(meta.name) {
            warn!(
                component = meta.name,
                "type name already registered by another type, name lookups keep the first"
            );
        } else {
            self.by_name.insert(meta.name, id);
        }
        self.by_type.insert(meta.type_id, id);
        self.metas.push(meta);

        debug!(
            component = meta.name,
            id = id.0,
            size = meta.layout.size(),
            "registered component type"
        );
        id
    }

    /// Returns the vtable for an id.
    #[must_use]
    pub fn meta(&self, id: ComponentId) -> Option<&ComponentMeta> {
        self.metas.get(id.index())
    }

    /// Returns `true` if `id` was handed out by this registry.
    #[must_use]
    pub fn is_valid(&self, id: ComponentId) -> bool {
        id.index() < self.metas.len()
    }

    /// The id of a registered Rust type.
    #[must_use]
    pub fn id_of<T: Component>(&self) -> Option<ComponentId> {
        self.id_of_type(TypeId::of::<T>())
    }

    /// The id of a registered type by its [`TypeId`].
    #[must_use]
    pub fn id_of_type(&self, type_id: TypeId) -> Option<ComponentId> {
        self.by_type.get(&type_id).copied()
    }

    /// The id of the type behind a prototype value.
    #[must_use]
    pub fn id_of_value(&self, value: &dyn AnyComponent) -> Option<ComponentId> {
        self.id_of_type(value.as_any().type_id())
    }

    /// Resolve a persistent type name.
    #[must_use]
    pub fn name_to_component_id(&self, name: &str) -> Option<ComponentId> {
        self.by_name.get(name).copied()
    }

    /// Build a default prototype of the type registered under `name`.
    #[must_use]
    pub fn make_component_type(&self, name: &str) -> Option<Box<dyn AnyComponent>> {
        let id = self.name_to_component_id(name)?;
        self.meta(id).map(|meta| (meta.new_fn)())
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    /// Returns `true` if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    /// Iterate over every registered vtable in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentMeta> {
        self.metas.iter()
    }
}
