//! Reparenting and world-space transforms.
//!
//! An entity's [`Transform`] is local to its parent. Moving an entity to a
//! new parent rewrites that local transform so the entity keeps its world
//! placement: `local' = inverse(new_parent_world) * old_parent_world * local`.
//! Ancestors without a transform count as the identity.

use engine_component::EntityHandle;
use engine_math::{Mat4, Transform};
use tracing::{debug, warn};

use crate::world::World;

/// Parent matrices with a smaller determinant are treated as singular.
const SINGULAR_EPSILON: f32 = 1e-8;

impl World {
    /// Move `child` (and its subtree) under `parent`, or to the root when
    /// `parent` is `None`.
    ///
    /// The child's local [`Transform`], if it has one, is corrected so its
    /// world placement does not change. Returns `false` without changing
    /// anything if either entity is missing or the move would create a cycle
    /// (`parent` is `child` or one of its descendants).
    pub fn parent_entity(&mut self, parent: Option<EntityHandle>, child: EntityHandle) -> bool {
        let Some(old_parent) = self.entities.get(child).map(|node| node.parent) else {
            return false;
        };
        if let Some(parent) = parent {
            if !self.entities.contains(parent) {
                return false;
            }
            if self.is_ancestor_or_self(child, parent) {
                warn!(%child, %parent, "refusing to parent an entity under its own subtree");
                return false;
            }
        }
        if old_parent == parent {
            return true;
        }

        let old_parent_world = self.world_matrix(old_parent);
        let new_parent_world = self.world_matrix(parent);
        if let Some(local) = self.get_component_mut::<Transform>(child) {
            if new_parent_world.determinant().abs() > SINGULAR_EPSILON {
                *local = Transform::from_matrix(
                    new_parent_world.inverse() * old_parent_world * local.to_matrix(),
                );
            } else {
                warn!(%child, "new parent transform is singular, keeping local transform");
            }
        }

        match old_parent.and_then(|old| self.entities.get_mut(old)) {
            Some(old) => old.children.retain(|c| *c != child),
            None => self.entities.roots_mut().retain(|c| *c != child),
        }
        match parent.and_then(|new| self.entities.get_mut(new)) {
            Some(new) => new.children.push(child),
            None => self.entities.roots_mut().push(child),
        }
        if let Some(node) = self.entities.get_mut(child) {
            node.parent = parent;
        }

        debug!(%child, parent = ?parent, "reparented entity");
        true
    }

    /// Move an entity one level up: under its grandparent, or to the root.
    ///
    /// Returns `false` if the entity is missing or already top-level.
    pub fn unparent_entity(&mut self, handle: EntityHandle) -> bool {
        let Some(parent) = self.entities.get(handle).and_then(|node| node.parent) else {
            return false;
        };
        let grandparent = self.entities.get(parent).and_then(|node| node.parent);
        self.parent_entity(grandparent, handle)
    }

    /// The entity's transform expressed in world space.
    #[must_use]
    pub fn world_transform(&self, handle: EntityHandle) -> Option<Transform> {
        if !self.entities.contains(handle) {
            return None;
        }
        Some(Transform::from_matrix(self.world_matrix(Some(handle))))
    }

    /// Product of local transforms from the root down to `handle`.
    fn world_matrix(&self, handle: Option<EntityHandle>) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = handle;
        while let Some(handle) = current {
            let Some(node) = self.entities.get(handle) else {
                break;
            };
            if let Some(local) = self.get_component::<Transform>(handle) {
                matrix = local.to_matrix() * matrix;
            }
            current = node.parent;
        }
        matrix
    }

    /// Returns `true` if `ancestor` is `handle` or one of its ancestors.
    fn is_ancestor_or_self(&self, ancestor: EntityHandle, handle: EntityHandle) -> bool {
        let mut current = Some(handle);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.entities.get(handle).and_then(|node| node.parent);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engine_component::ComponentRegistry;
    use engine_math::{Quat, Vec3};

    use super::*;

    fn world() -> World {
        let mut registry = ComponentRegistry::new();
        registry.register::<Transform>();
        World::new(Arc::new(registry))
    }

    fn spawn(
        world: &mut World,
        transform: Transform,
        parent: Option<EntityHandle>,
    ) -> EntityHandle {
        world.make_entity(&[&transform], "e", None, parent).unwrap()
    }

    #[test]
    fn test_world_transform_composes_ancestors() {
        let mut world = world();
        let root = spawn(&mut world, Transform::from_position(Vec3::X * 10.0), None);
        let middle = world.make_entity(&[], "no transform", None, Some(root)).unwrap();
        let leaf = spawn(&mut world, Transform::from_position(Vec3::Y), Some(middle));
        let placed = world.world_transform(leaf).unwrap();
        assert!(placed.position.abs_diff_eq(Vec3::new(10.0, 1.0, 0.0), 1e-5));
        assert!(world.world_transform(EntityHandle::generate()).is_none());
    }

    #[test]
    fn test_reparent_preserves_world_placement() {
        let mut world = world();
        let old_parent = spawn(
            &mut world,
            Transform::from_position_rotation(Vec3::new(3.0, 0.0, 0.0), Quat::from_rotation_z(0.5))
                .scaled(2.0),
            None,
        );
        let new_parent = spawn(
            &mut world,
            Transform::from_position(Vec3::new(-4.0, 1.0, 2.0)).scaled(0.5),
            None,
        );
        let child = spawn(&mut world, Transform::from_position(Vec3::ONE), Some(old_parent));

        let before = world.world_transform(child).unwrap();
        assert!(world.parent_entity(Some(new_parent), child));
        let after = world.world_transform(child).unwrap();

        assert!(after.abs_diff_eq(&before, 1e-4));
        assert_eq!(world.get_entity(child).unwrap().parent(), Some(new_parent));
        assert!(world.get_entity(old_parent).unwrap().children().is_empty());
        assert_eq!(world.get_entity(new_parent).unwrap().children(), &[child]);
    }

    #[test]
    fn test_reparent_to_root() {
        let mut world = world();
        let parent = spawn(&mut world, Transform::from_position(Vec3::Z * 5.0), None);
        let child = spawn(&mut world, Transform::from_position(Vec3::Z), Some(parent));
        assert!(world.parent_entity(None, child));
        assert_eq!(world.entity_handles(None), vec![parent, child]);
        let local = world.get_component::<Transform>(child).unwrap();
        assert!(local.position.abs_diff_eq(Vec3::Z * 6.0, 1e-5));
    }

    #[test]
    fn test_reparent_refuses_cycles() {
        let mut world = world();
        let a = spawn(&mut world, Transform::IDENTITY, None);
        let b = spawn(&mut world, Transform::IDENTITY, Some(a));
        let c = spawn(&mut world, Transform::IDENTITY, Some(b));
        assert!(!world.parent_entity(Some(c), a));
        assert!(!world.parent_entity(Some(a), a));
        assert_eq!(world.get_entity(a).unwrap().parent(), None);
        assert!(!world.parent_entity(Some(EntityHandle::generate()), c));
        assert!(!world.parent_entity(None, EntityHandle::generate()));
    }

    #[test]
    fn test_unparent_moves_up_one_level() {
        let mut world = world();
        let a = spawn(&mut world, Transform::IDENTITY, None);
        let b = spawn(&mut world, Transform::IDENTITY, Some(a));
        let c = spawn(&mut world, Transform::IDENTITY, Some(b));

        assert!(world.unparent_entity(c));
        assert_eq!(world.get_entity(c).unwrap().parent(), Some(a));
        assert!(world.unparent_entity(c));
        assert_eq!(world.get_entity(c).unwrap().parent(), None);
        assert!(!world.unparent_entity(c));
    }
}
