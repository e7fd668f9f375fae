//! Component types the scene runner knows about.

use std::sync::Arc;

use engine_component::{Component, ComponentRegistry};
use engine_math::{Transform, Vec3};
use serde::{Deserialize, Serialize};

/// Linear velocity in world units per second.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Velocity {
    pub linear: Vec3,
}

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

/// A point light.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Light {
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }
}

impl Component for Light {
    fn type_name() -> &'static str {
        "Light"
    }
}

/// Registry with every component type of the scene runner.
#[must_use]
pub fn registry() -> Arc<ComponentRegistry> {
    let mut registry = ComponentRegistry::new();
    registry.register::<Transform>();
    registry.register::<Velocity>();
    registry.register::<Light>();
    Arc::new(registry)
}
