//! The [`World`]: sole owner of every entity and component record.
//!
//! Records of each component type live in one dense [`Column`]; entities
//! live in a generational arena and know their records through a manifest
//! of `(ComponentId, index, ComponentHandle)` entries. Removing a record
//! swap-deletes it from its column, and the single relocation routine
//! `World::patch_relocated` repoints the manifest of whichever entity
//! owned the moved tail record.

use std::collections::HashMap;
use std::sync::Arc;

use engine_component::{
    AnyComponent, Column, Component, ComponentHandle, ComponentId, ComponentRegistry,
    EntityHandle, RecordOwner, Relocation,
};
use tracing::{debug, warn};

use crate::entity::{EntityArena, EntityNode, ManifestEntry};

/// Name given to entities created without one.
pub const DEFAULT_ENTITY_NAME: &str = "Entity";

/// A set of entities and their components, forming one scene.
#[derive(Debug)]
pub struct World {
    /// Component types this world can hold.
    pub(crate) registry: Arc<ComponentRegistry>,
    /// One dense column per component type, created on first use.
    pub(crate) columns: HashMap<ComponentId, Column>,
    /// Every entity node.
    pub(crate) entities: EntityArena,
}

/// A borrowed record, valid until the next mutation of its column.
#[derive(Debug, Clone, Copy)]
pub struct ComponentRef<'w> {
    entity: EntityHandle,
    entry: ManifestEntry,
    column: &'w Column,
}

impl<'w> ComponentRef<'w> {
    /// The owning entity.
    #[must_use]
    pub fn entity(&self) -> EntityHandle {
        self.entity
    }

    /// The component type.
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.entry.component_id
    }

    /// The record's stable handle.
    #[must_use]
    pub fn handle(&self) -> ComponentHandle {
        self.entry.handle
    }

    /// The record's current index in its column.
    #[must_use]
    pub fn index(&self) -> usize {
        self.entry.index
    }

    /// The persistent type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.column.name()
    }

    /// Typed view; `None` if `T` is not the record's type.
    #[must_use]
    pub fn downcast<T: Component>(&self) -> Option<&'w T> {
        self.column.get::<T>(self.entry.index)
    }

    /// Encode the record as its persistent payload.
    pub fn serialize(&self) -> Option<Result<Vec<u8>, rmp_serde::encode::Error>> {
        self.column.serialize_record(self.entry.index)
    }
}

impl World {
    /// Create an empty world for the types in `registry`.
    #[must_use]
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self {
            registry,
            columns: HashMap::new(),
            entities: EntityArena::default(),
        }
    }

    /// The type registry this world resolves components against.
    #[must_use]
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Create an entity and deep-copy `components` into it.
    ///
    /// An empty `name` becomes [`DEFAULT_ENTITY_NAME`]. A fresh handle is
    /// generated unless `handle` holds a valid one. The entity is placed
    /// under `parent`, or at the root when `parent` is `None`. Prototypes of
    /// unregistered types are skipped, as are repeated types (the first one
    /// wins).
    ///
    /// Returns `None` if `parent` is not a live entity or `handle` is
    /// already in use.
    pub fn make_entity(
        &mut self,
        components: &[&dyn AnyComponent],
        name: &str,
        handle: Option<EntityHandle>,
        parent: Option<EntityHandle>,
    ) -> Option<EntityHandle> {
        if let Some(parent) = parent
            && !self.entities.contains(parent)
        {
            warn!(%parent, "cannot make entity under a missing parent");
            return None;
        }

        let name = if name.is_empty() {
            DEFAULT_ENTITY_NAME
        } else {
            name
        };
        let handle = handle
            .filter(EntityHandle::is_valid)
            .unwrap_or_else(EntityHandle::generate);
        if self
            .entities
            .insert(EntityNode::new(handle, name.to_string(), parent))
            .is_none()
        {
            warn!(entity = %handle, "entity handle already in use");
            return None;
        }
        match parent.and_then(|parent| self.entities.get_mut(parent)) {
            Some(parent) => parent.children.push(handle),
            None => self.entities.roots_mut().push(handle),
        }

        for component in components {
            match self.registry.id_of_value(*component) {
                Some(id) => {
                    self.make_component(handle, id, Some(*component), None);
                }
                None => warn!(
                    entity = %handle,
                    component = component.component_name(),
                    "skipping prototype of unregistered component type"
                ),
            }
        }

        debug!(entity = %handle, name, components = components.len(), "made entity");
        Some(handle)
    }

    /// Remove an entity, its descendants and every component they own.
    ///
    /// Children are removed before their parent. Returns `false` if `handle`
    /// is not a live entity.
    pub fn remove_entity(&mut self, handle: EntityHandle) -> bool {
        let Some(parent) = self.entities.get(handle).map(|node| node.parent) else {
            return false;
        };
        match parent.and_then(|parent| self.entities.get_mut(parent)) {
            Some(parent) => parent.children.retain(|child| *child != handle),
            None => self.entities.roots_mut().retain(|root| *root != handle),
        }

        let subtree = self.entities.subtree(handle);
        for entity in subtree.iter().rev() {
            while let Some(entry) = self
                .entities
                .get_mut(*entity)
                .and_then(|node| node.components.pop())
            {
                self.delete_component(entry.component_id, entry.index);
            }
            self.entities.remove(*entity);
        }

        debug!(entity = %handle, removed = subtree.len(), "removed entity");
        true
    }

    /// Destroy every component and entity.
    pub fn clear(&mut self) {
        // Dropping the columns runs every record's destructor.
        self.columns.clear();
        self.entities.clear();
        debug!("cleared world");
    }

    /// Rename an entity. Returns `false` if it does not exist.
    pub fn set_entity_name(&mut self, handle: EntityHandle, name: &str) -> bool {
        match self.entities.get_mut(handle) {
            Some(node) => {
                node.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Copy `prototype` into a new record owned by `entity`.
    ///
    /// With no prototype the type's default value is used. A fresh handle is
    /// generated unless `handle` holds a valid one. If the entity already
    /// owns a component of type `id` nothing changes and the existing
    /// record's handle is returned.
    ///
    /// Returns `None` if the entity is missing, `id` is unregistered or the
    /// prototype is of another type.
    pub fn make_component(
        &mut self,
        entity: EntityHandle,
        id: ComponentId,
        prototype: Option<&dyn AnyComponent>,
        handle: Option<ComponentHandle>,
    ) -> Option<ComponentHandle> {
        let meta = self.registry.meta(id)?;
        let node = self.entities.get(entity)?;
        if let Some(existing) = node.component(id) {
            debug!(%entity, component = meta.name, "entity already owns this component type");
            return Some(existing.handle);
        }

        let handle = handle
            .filter(ComponentHandle::is_valid)
            .unwrap_or_else(ComponentHandle::generate);
        let default;
        let prototype = match prototype {
            Some(prototype) => prototype,
            None => {
                default = (meta.new_fn)();
                &*default
            }
        };

        let owner = RecordOwner {
            entity,
            component: handle,
        };
        let column = self
            .columns
            .entry(id)
            .or_insert_with(|| Column::new(meta));
        let Some(index) = column.push(meta, owner, prototype) else {
            warn!(
                %entity,
                expected = meta.name,
                got = prototype.component_name(),
                "prototype does not match component type"
            );
            return None;
        };

        if let Some(node) = self.entities.get_mut(entity) {
            node.components.push(ManifestEntry {
                component_id: id,
                index,
                handle,
            });
        }
        Some(handle)
    }

    /// Typed shorthand for [`World::make_component`].
    pub fn add_component<T: Component>(
        &mut self,
        entity: EntityHandle,
        value: T,
    ) -> Option<ComponentHandle> {
        let id = self.registry.id_of::<T>()?;
        self.make_component(entity, id, Some(&value), None)
    }

    /// Remove the component of type `id` from `entity`.
    pub fn remove_entity_component(&mut self, entity: EntityHandle, id: ComponentId) -> bool {
        let Some(node) = self.entities.get_mut(entity) else {
            return false;
        };
        let Some(position) = node.components.iter().position(|e| e.component_id == id) else {
            return false;
        };
        let entry = node.components.remove(position);
        self.delete_component(entry.component_id, entry.index);
        true
    }

    /// Remove a component by its handle, wherever it lives.
    pub fn remove_component(&mut self, handle: ComponentHandle) -> bool {
        match self.find_component(handle) {
            Some((entity, entry)) => self.remove_entity_component(entity, entry.component_id),
            None => false,
        }
    }

    /// Destroy the record at `index` and patch whichever record moved into
    /// its slot.
    fn delete_component(&mut self, id: ComponentId, index: usize) {
        let Some(column) = self.columns.get_mut(&id) else {
            return;
        };
        if let Some(relocation) = column.swap_remove(index) {
            self.patch_relocated(id, relocation);
        }
    }

    /// Repoint the one manifest entry that referenced a moved record.
    fn patch_relocated(&mut self, id: ComponentId, relocation: Relocation) {
        let patched = self
            .entities
            .get_mut(relocation.owner.entity)
            .and_then(|node| {
                node.components
                    .iter_mut()
                    .find(|entry| entry.component_id == id && entry.index == relocation.from)
            })
            .map(|entry| entry.index = relocation.to)
            .is_some();
        if !patched {
            warn!(
                entity = %relocation.owner.entity,
                component = %id,
                from = relocation.from,
                "relocated record has no matching manifest entry"
            );
        }
    }

    /// Look up a live entity.
    #[must_use]
    pub fn get_entity(&self, handle: EntityHandle) -> Option<&EntityNode> {
        self.entities.get(handle)
    }

    /// Look up several entities, omitting the ones that do not exist.
    #[must_use]
    pub fn get_entities(&self, handles: &[EntityHandle]) -> Vec<&EntityNode> {
        handles
            .iter()
            .filter_map(|handle| self.entities.get(*handle))
            .collect()
    }

    /// Returns `true` if `handle` names a live entity.
    #[must_use]
    pub fn contains_entity(&self, handle: EntityHandle) -> bool {
        self.entities.contains(handle)
    }

    /// Children of `root`, or the top-level entities when `root` is `None`.
    #[must_use]
    pub fn entity_handles(&self, root: Option<EntityHandle>) -> Vec<EntityHandle> {
        match root {
            Some(root) => self
                .entities
                .get(root)
                .map(|node| node.children.clone())
                .unwrap_or_default(),
            None => self.entities.roots().to_vec(),
        }
    }

    /// Every live entity, parents before children.
    #[must_use]
    pub fn all_entity_handles(&self) -> Vec<EntityHandle> {
        self.entities.depth_first()
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of live records of type `id`.
    #[must_use]
    pub fn component_count(&self, id: ComponentId) -> usize {
        self.columns.get(&id).map_or(0, Column::len)
    }

    /// The component of type `id` owned by `entity`.
    #[must_use]
    pub fn get_component_raw(
        &self,
        entity: EntityHandle,
        id: ComponentId,
    ) -> Option<ComponentRef<'_>> {
        let entry = *self.entities.get(entity)?.component(id)?;
        let column = self.columns.get(&id)?;
        Some(ComponentRef {
            entity,
            entry,
            column,
        })
    }

    /// The `T` owned by `entity`.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: EntityHandle) -> Option<&T> {
        let id = self.registry.id_of::<T>()?;
        self.get_component_raw(entity, id)?.downcast::<T>()
    }

    /// Mutable access to the `T` owned by `entity`.
    #[must_use]
    pub fn get_component_mut<T: Component>(&mut self, entity: EntityHandle) -> Option<&mut T> {
        let id = self.registry.id_of::<T>()?;
        let index = self.entities.get(entity)?.component(id)?.index;
        self.columns.get_mut(&id)?.get_mut::<T>(index)
    }

    /// Find a component anywhere in the world by its handle.
    ///
    /// Walks every entity's manifest; meant for tooling, not per-frame use.
    #[must_use]
    pub fn get_component_by_handle(&self, handle: ComponentHandle) -> Option<ComponentRef<'_>> {
        let (entity, entry) = self.find_component(handle)?;
        let column = self.columns.get(&entry.component_id)?;
        Some(ComponentRef {
            entity,
            entry,
            column,
        })
    }

    /// Typed form of [`World::get_component_by_handle`].
    #[must_use]
    pub fn get_component_by_handle_as<T: Component>(&self, handle: ComponentHandle) -> Option<&T> {
        self.get_component_by_handle(handle)?.downcast::<T>()
    }

    fn find_component(&self, handle: ComponentHandle) -> Option<(EntityHandle, ManifestEntry)> {
        self.entities.depth_first().into_iter().find_map(|entity| {
            self.entities
                .get(entity)?
                .components
                .iter()
                .find(|entry| entry.handle == handle)
                .map(|entry| (entity, *entry))
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
    struct Health {
        current: f32,
    }

    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
    struct Label {
        text: String,
    }

    impl Component for Label {
        fn type_name() -> &'static str {
            "Label"
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
    struct Unregistered;

    impl Component for Unregistered {
        fn type_name() -> &'static str {
            "Unregistered"
        }
    }

    fn world() -> World {
        let mut registry = ComponentRegistry::new();
        registry.register::<Health>();
        registry.register::<Label>();
        World::new(Arc::new(registry))
    }

    fn health(world: &World) -> ComponentId {
        world.registry().id_of::<Health>().unwrap()
    }

    #[test]
    fn test_make_entity_with_components() {
        let mut world = world();
        let e = world
            .make_entity(&[&Health { current: 5.0 }, &Label { text: "hi".into() }], "a", None, None)
            .unwrap();
        assert!(e.is_valid());
        assert_eq!(world.get_component::<Health>(e), Some(&Health { current: 5.0 }));
        assert_eq!(world.get_component::<Label>(e).map(|l| l.text.as_str()), Some("hi"));
        assert_eq!(world.get_entity(e).unwrap().components().len(), 2);
        assert_eq!(world.entity_handles(None), vec![e]);
    }

    #[test]
    fn test_make_entity_with_explicit_handle() {
        let mut world = world();
        let handle = EntityHandle::generate();
        assert_eq!(world.make_entity(&[], "a", Some(handle), None), Some(handle));
        assert_eq!(world.make_entity(&[], "b", Some(handle), None), None);
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn test_empty_name_gets_default() {
        let mut world = world();
        let e = world.make_entity(&[], "", None, None).unwrap();
        assert_eq!(world.get_entity(e).unwrap().name(), DEFAULT_ENTITY_NAME);
    }

    #[test]
    fn test_make_entity_under_missing_parent_fails() {
        let mut world = world();
        let missing = EntityHandle::generate();
        assert_eq!(world.make_entity(&[], "a", None, Some(missing)), None);
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_unregistered_prototype_is_skipped() {
        let mut world = world();
        let e = world.make_entity(&[&Unregistered], "a", None, None).unwrap();
        assert!(world.get_entity(e).unwrap().components().is_empty());
    }

    #[test]
    fn test_duplicate_component_returns_existing_handle() {
        let mut world = world();
        let e = world.make_entity(&[], "a", None, None).unwrap();
        let first = world.add_component(e, Health { current: 1.0 }).unwrap();
        let second = world.add_component(e, Health { current: 2.0 }).unwrap();
        assert_eq!(first, second);
        assert_eq!(world.component_count(health(&world)), 1);
        assert_eq!(world.get_component::<Health>(e), Some(&Health { current: 1.0 }));
    }

    #[test]
    fn test_make_component_without_prototype_uses_default() {
        let mut world = world();
        let e = world.make_entity(&[], "a", None, None).unwrap();
        let id = health(&world);
        world.make_component(e, id, None, None).unwrap();
        assert_eq!(world.get_component::<Health>(e), Some(&Health::default()));
    }

    #[test]
    fn test_make_component_rejects_mismatched_prototype() {
        let mut world = world();
        let e = world.make_entity(&[], "a", None, None).unwrap();
        let id = health(&world);
        assert_eq!(world.make_component(e, id, Some(&Label::default()), None), None);
        assert!(world.get_entity(e).unwrap().components().is_empty());
    }

    #[test]
    fn test_make_component_soft_failures() {
        let mut world = world();
        let id = health(&world);
        assert_eq!(world.make_component(EntityHandle::generate(), id, None, None), None);
        let e = world.make_entity(&[], "a", None, None).unwrap();
        assert_eq!(world.make_component(e, ComponentId(42), None, None), None);
    }

    #[test]
    fn test_swap_delete_patches_relocated_owner() {
        let mut world = world();
        let id = health(&world);
        let entities: Vec<_> = (0..4)
            .map(|i| {
                world
                    .make_entity(&[&Health { current: i as f32 }], "e", None, None)
                    .unwrap()
            })
            .collect();

        assert!(world.remove_entity(entities[1]));
        assert_eq!(world.component_count(id), 3);
        // The tail record (entity 3) moved into slot 1.
        let moved = world.get_component_raw(entities[3], id).unwrap();
        assert_eq!(moved.index(), 1);
        assert_eq!(moved.downcast::<Health>(), Some(&Health { current: 3.0 }));
        for (i, e) in entities.iter().enumerate().filter(|(i, _)| *i != 1) {
            assert_eq!(world.get_component::<Health>(*e), Some(&Health { current: i as f32 }));
        }
    }

    #[test]
    fn test_remove_entity_removes_descendants_first() {
        let mut world = world();
        let id = health(&world);
        let root = world.make_entity(&[&Health::default()], "root", None, None).unwrap();
        let child = world.make_entity(&[&Health::default()], "child", None, Some(root)).unwrap();
        let grandchild = world
            .make_entity(&[&Health::default()], "grandchild", None, Some(child))
            .unwrap();
        let other = world.make_entity(&[&Health { current: 9.0 }], "other", None, None).unwrap();

        assert!(world.remove_entity(root));
        assert!(!world.contains_entity(child));
        assert!(!world.contains_entity(grandchild));
        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.component_count(id), 1);
        assert_eq!(world.get_component::<Health>(other), Some(&Health { current: 9.0 }));
        assert_eq!(world.entity_handles(None), vec![other]);
    }

    #[test]
    fn test_remove_entity_handles_long_chains() {
        let mut world = world();
        let id = health(&world);
        let root = world.make_entity(&[&Health::default()], "root", None, None).unwrap();
        let mut parent = root;
        for _ in 0..20_000 {
            parent = world
                .make_entity(&[&Health::default()], "link", None, Some(parent))
                .unwrap();
        }
        let other = world.make_entity(&[&Health { current: 4.0 }], "other", None, None).unwrap();

        assert!(world.remove_entity(root));
        assert!(!world.contains_entity(parent));
        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.component_count(id), 1);
        assert_eq!(world.get_component::<Health>(other), Some(&Health { current: 4.0 }));
    }

    #[test]
    fn test_remove_missing_entity_returns_false() {
        let mut world = world();
        assert!(!world.remove_entity(EntityHandle::generate()));
    }

    #[test]
    fn test_remove_child_detaches_from_parent() {
        let mut world = world();
        let root = world.make_entity(&[], "root", None, None).unwrap();
        let child = world.make_entity(&[], "child", None, Some(root)).unwrap();
        assert_eq!(world.entity_handles(Some(root)), vec![child]);
        assert!(world.remove_entity(child));
        assert!(world.entity_handles(Some(root)).is_empty());
    }

    #[test]
    fn test_remove_entity_component() {
        let mut world = world();
        let e = world
            .make_entity(&[&Health::default(), &Label::default()], "a", None, None)
            .unwrap();
        let id = health(&world);
        assert!(world.remove_entity_component(e, id));
        assert!(!world.remove_entity_component(e, id));
        assert!(world.get_component::<Health>(e).is_none());
        assert!(world.get_component::<Label>(e).is_some());
    }

    #[test]
    fn test_component_lookup_by_handle() {
        let mut world = world();
        let root = world.make_entity(&[], "root", None, None).unwrap();
        let child = world.make_entity(&[], "child", None, Some(root)).unwrap();
        let handle = world.add_component(child, Label { text: "x".into() }).unwrap();

        let found = world.get_component_by_handle(handle).unwrap();
        assert_eq!(found.entity(), child);
        assert_eq!(found.type_name(), "Label");
        assert_eq!(
            world.get_component_by_handle_as::<Label>(handle).map(|l| l.text.as_str()),
            Some("x")
        );
        assert!(world.get_component_by_handle(ComponentHandle::generate()).is_none());

        assert!(world.remove_component(handle));
        assert!(world.get_component::<Label>(child).is_none());
        assert!(!world.remove_component(handle));
    }

    #[test]
    fn test_get_component_mut() {
        let mut world = world();
        let e = world.make_entity(&[&Health::default()], "a", None, None).unwrap();
        world.get_component_mut::<Health>(e).unwrap().current = 7.0;
        assert_eq!(world.get_component::<Health>(e), Some(&Health { current: 7.0 }));
    }

    #[test]
    fn test_get_entities_skips_missing() {
        let mut world = world();
        let a = world.make_entity(&[], "a", None, None).unwrap();
        let found = world.get_entities(&[a, EntityHandle::generate()]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "a");
    }

    #[test]
    fn test_clear_and_rename() {
        let mut world = world();
        let e = world.make_entity(&[&Label::default()], "a", None, None).unwrap();
        assert!(world.set_entity_name(e, "renamed"));
        assert_eq!(world.get_entity(e).unwrap().name(), "renamed");
        world.clear();
        assert_eq!(world.entity_count(), 0);
        assert!(!world.contains_entity(e));
        assert!(!world.set_entity_name(e, "gone"));
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
    struct Slot(usize);

    impl Component for Slot {
        fn type_name() -> &'static str {
            "Slot"
        }
    }

    fn world() -> (World, ComponentId) {
        let mut registry = ComponentRegistry::new();
        let id = registry.register::<Slot>();
        (World::new(Arc::new(registry)), id)
    }

    proptest! {
        #[test]
        fn swap_delete_keeps_every_owner_pointing_at_its_record(
            count in 1usize..64,
            victim in any::<prop::sample::Index>(),
        ) {
            let (mut world, id) = world();
            let entities: Vec<_> = (0..count)
                .map(|i| world.make_entity(&[&Slot(i)], "e", None, None).unwrap())
                .collect();
            let victim = victim.index(count);
            prop_assert!(world.remove_entity_component(entities[victim], id));
            prop_assert_eq!(world.component_count(id), count - 1);

            let column = &world.columns[&id];
            for (i, entity) in entities.iter().enumerate().filter(|(i, _)| *i != victim) {
                let record = world.get_component_raw(*entity, id).unwrap();
                prop_assert_eq!(column.owner(record.index()).map(|o| o.entity), Some(*entity));
                prop_assert_eq!(record.downcast::<Slot>(), Some(&Slot(i)));
            }
        }

        #[test]
        fn handles_survive_unrelated_churn(
            ops in prop::collection::vec((any::<bool>(), any::<prop::sample::Index>()), 1..64),
        ) {
            let (mut world, _) = world();
            let anchor = world.make_entity(&[&Slot(usize::MAX)], "anchor", None, None).unwrap();
            let mut others = Vec::new();
            for (create, pick) in ops {
                if create || others.is_empty() {
                    let i = others.len();
                    others.push(world.make_entity(&[&Slot(i)], "other", None, None).unwrap());
                } else {
                    let gone = others.swap_remove(pick.index(others.len()));
                    prop_assert!(world.remove_entity(gone));
                }
                let node = world.get_entity(anchor).unwrap();
                prop_assert_eq!(node.handle(), anchor);
                prop_assert_eq!(node.name(), "anchor");
                prop_assert_eq!(world.get_component::<Slot>(anchor), Some(&Slot(usize::MAX)));
            }
            prop_assert_eq!(world.entity_count(), others.len() + 1);
        }
    }
}
