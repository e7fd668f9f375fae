//! Scene files: building the demo scene, saving, loading and dumping.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use engine_component::{ComponentRegistry, EntityHandle};
use engine_math::{Transform, Vec3};
use engine_world::World;
use serde::Serialize;
use tracing::info;

use crate::components::{Light, Velocity};

/// Populate `world` with a root entity holding `lights` moving lights.
///
/// Returns the root's handle.
pub fn build_demo(world: &mut World, lights: usize) -> Result<EntityHandle> {
    let root = world
        .make_entity(&[&Transform::IDENTITY], "Scene", None, None)
        .context("failed to create scene root")?;
    for i in 0..lights {
        let angle = i as f32 / lights.max(1) as f32 * std::f32::consts::TAU;
        let position = Vec3::new(angle.cos(), 1.0, angle.sin()) * 4.0;
        let hue = i as f32 / lights.max(1) as f32;
        world
            .make_entity(
                &[
                    &Transform::from_position(position),
                    &Light {
                        color: Vec3::new(1.0 - hue, hue, 0.5),
                        intensity: 1.0,
                    },
                    &Velocity {
                        linear: Vec3::new(-position.z, 0.0, position.x) * 0.1,
                    },
                ],
                &format!("Light{}", i + 1),
                None,
                Some(root),
            )
            .with_context(|| format!("failed to create light {}", i + 1))?;
    }
    Ok(root)
}

/// Write every top-level entity of `world` to `path`.
pub fn save(world: &World, path: &Path) -> Result<()> {
    let bytes = world.serialize_scene()?;
    fs::write(path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    info!(
        path = %path.display(),
        bytes = bytes.len(),
        entities = world.entity_count(),
        "saved scene"
    );
    Ok(())
}

/// Read a scene written by [`save`].
pub fn load(registry: Arc<ComponentRegistry>, path: &Path) -> Result<World> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let world = World::from_bytes(registry, &bytes)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    info!(path = %path.display(), entities = world.entity_count(), "loaded scene");
    Ok(world)
}

/// One entity in a scene dump.
#[derive(Debug, Serialize)]
pub struct SceneNode {
    pub handle: String,
    /// Parent's handle, `None` for top-level entities.
    pub parent: Option<String>,
    /// Distance from the top level.
    pub depth: usize,
    pub name: String,
    pub components: Vec<&'static str>,
}

/// The entity tree under `root` (or every top-level entity) flattened depth
/// first, parents before children.
#[must_use]
pub fn describe(world: &World, root: Option<EntityHandle>) -> Vec<SceneNode> {
    let base = root.map_or(0, |root| ancestor_count(world, root) + 1);
    let mut stack: Vec<(EntityHandle, usize)> = world
        .entity_handles(root)
        .into_iter()
        .rev()
        .map(|handle| (handle, base))
        .collect();
    let mut nodes = Vec::new();
    while let Some((handle, depth)) = stack.pop() {
        let Some(node) = world.get_entity(handle) else {
            continue;
        };
        let components = node
            .components()
            .iter()
            .filter_map(|entry| world.registry().meta(entry.component_id))
            .map(|meta| meta.name)
            .collect();
        nodes.push(SceneNode {
            handle: handle.token(),
            parent: node.parent().map(|parent| parent.token()),
            depth,
            name: node.name().to_string(),
            components,
        });
        stack.extend(node.children().iter().rev().map(|child| (*child, depth + 1)));
    }
    nodes
}

fn ancestor_count(world: &World, handle: EntityHandle) -> usize {
    let mut count = 0;
    let mut current = world.get_entity(handle).and_then(|node| node.parent());
    while let Some(parent) = current {
        count += 1;
        current = world.get_entity(parent).and_then(|node| node.parent());
    }
    count
}

/// [`describe`] the whole world as pretty-printed JSON.
pub fn to_json(world: &World) -> Result<String> {
    Ok(serde_json::to_string_pretty(&describe(world, None))?)
}
