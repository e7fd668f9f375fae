//! Entity nodes and the generational arena that owns them.
//!
//! Entities reference their parent and children by handle only. Nodes live in
//! slots of an [`EntityArena`]; a handle resolves to an [`EntityKey`] (slot
//! index plus generation) and every lookup checks the slot's current
//! generation, so a key kept past its entity's removal never resolves to the
//! slot's next occupant.

use std::collections::HashMap;

use engine_component::{ComponentHandle, ComponentId, EntityHandle};

/// One entry of an entity's component manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestEntry {
    /// The component type.
    pub component_id: ComponentId,
    /// Index of the record in the type's column.
    pub index: usize,
    /// The record's stable handle.
    pub handle: ComponentHandle,
}

/// An entity: a name, its place in the hierarchy and what it owns.
#[derive(Debug, Clone)]
pub struct EntityNode {
    pub(crate) handle: EntityHandle,
    pub(crate) name: String,
    pub(crate) parent: Option<EntityHandle>,
    pub(crate) children: Vec<EntityHandle>,
    pub(crate) components: Vec<ManifestEntry>,
}

impl EntityNode {
    pub(crate) fn new(handle: EntityHandle, name: String, parent: Option<EntityHandle>) -> Self {
        Self {
            handle,
            name,
            parent,
            children: Vec::new(),
            components: Vec::new(),
        }
    }

    /// This entity's handle.
    #[must_use]
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent entity, `None` at the root.
    #[must_use]
    pub fn parent(&self) -> Option<EntityHandle> {
        self.parent
    }

    /// Children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[EntityHandle] {
        &self.children
    }

    /// The component manifest in insertion order.
    #[must_use]
    pub fn components(&self) -> &[ManifestEntry] {
        &self.components
    }

    /// The manifest entry for a component type.
    #[must_use]
    pub fn component(&self, id: ComponentId) -> Option<&ManifestEntry> {
        self.components.iter().find(|entry| entry.component_id == id)
    }

    /// Returns `true` if this entity owns a component of type `id`.
    #[must_use]
    pub fn has_component(&self, id: ComponentId) -> bool {
        self.component(id).is_some()
    }
}

/// Slot address of a live entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey {
    index: u32,
    generation: u32,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<EntityNode>,
}

/// Owner of every entity node in a world.
#[derive(Debug, Default)]
pub(crate) struct EntityArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    keys: HashMap<EntityHandle, EntityKey>,
    roots: Vec<EntityHandle>,
}

impl EntityArena {
    /// Store a node. Returns `None` if its handle is already live.
    pub(crate) fn insert(&mut self, node: EntityNode) -> Option<EntityKey> {
        if self.keys.contains_key(&node.handle) {
            return None;
        }
        let handle = node.handle;
        let key = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                EntityKey {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                EntityKey {
                    index,
                    generation: 0,
                }
            }
        };
        self.keys.insert(handle, key);
        Some(key)
    }

    /// Take a node out, retiring its slot's generation.
    pub(crate) fn remove(&mut self, handle: EntityHandle) -> Option<EntityNode> {
        let key = self.key(handle)?;
        self.keys.remove(&handle);
        let slot = &mut self.slots[key.index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        slot.node.take()
    }

    /// The current key of a live handle.
    pub(crate) fn key(&self, handle: EntityHandle) -> Option<EntityKey> {
        let key = *self.keys.get(&handle)?;
        self.by_key(key).map(|_| key)
    }

    /// Resolve a key, rejecting stale generations.
    pub(crate) fn by_key(&self, key: EntityKey) -> Option<&EntityNode> {
        let slot = self.slots.get(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub(crate) fn get(&self, handle: EntityHandle) -> Option<&EntityNode> {
        let key = *self.keys.get(&handle)?;
        self.by_key(key).filter(|node| node.handle == handle)
    }

    pub(crate) fn get_mut(&mut self, handle: EntityHandle) -> Option<&mut EntityNode> {
        let key = *self.keys.get(&handle)?;
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.node.as_mut().filter(|node| node.handle == handle)
    }

    pub(crate) fn contains(&self, handle: EntityHandle) -> bool {
        self.get(handle).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }

    pub(crate) fn roots(&self) -> &[EntityHandle] {
        &self.roots
    }

    pub(crate) fn roots_mut(&mut self) -> &mut Vec<EntityHandle> {
        &mut self.roots
    }

    /// Every live handle, depth first from the roots, parents before
    /// children.
    pub(crate) fn depth_first(&self) -> Vec<EntityHandle> {
        self.preorder(&self.roots)
    }

    /// `handle` and its descendants, parents before children. Empty if
    /// `handle` is not live.
    pub(crate) fn subtree(&self, handle: EntityHandle) -> Vec<EntityHandle> {
        self.preorder(&[handle])
    }

    fn preorder(&self, starts: &[EntityHandle]) -> Vec<EntityHandle> {
        let mut order = Vec::new();
        let mut stack: Vec<EntityHandle> = starts.iter().rev().copied().collect();
        while let Some(handle) = stack.pop() {
            if let Some(node) = self.get(handle) {
                order.push(handle);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    pub(crate) fn clear(&mut self) {
        for slot in &mut self.slots {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.free = (0..self.slots.len() as u32).rev().collect();
        self.keys.clear();
        self.roots.clear();
    }
}
