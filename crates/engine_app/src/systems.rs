//! Per-tick systems of the scene runner.

use engine_component::{ComponentId, ComponentRegistry, Signature};
use engine_math::{Quat, Transform};
use engine_world::{QueryResult, System};
use tracing::trace;

use crate::components::{Light, Velocity};

/// Moves every entity with a [`Transform`] and a [`Velocity`].
#[derive(Debug)]
pub struct Movement {
    transform: ComponentId,
    velocity: ComponentId,
}

impl Movement {
    /// `None` if either component type is not registered.
    #[must_use]
    pub fn new(registry: &ComponentRegistry) -> Option<Self> {
        Some(Self {
            transform: registry.id_of::<Transform>()?,
            velocity: registry.id_of::<Velocity>()?,
        })
    }
}

impl System for Movement {
    fn signature(&self) -> Signature {
        Signature::new()
            .required(self.transform)
            .required(self.velocity)
    }

    fn update_components(&mut self, dt: f32, rows: &mut QueryResult<'_>) {
        for mut row in rows.rows_mut() {
            if let Some((transform, velocity)) = row.pair_mut::<Transform, Velocity>(0, 1) {
                transform.position += velocity.linear * dt;
            }
        }
    }

    fn name(&self) -> &str {
        "movement"
    }
}

/// Turns lights about the vertical axis and pulses their intensity.
///
/// Lights without a [`Transform`] only pulse.
#[derive(Debug)]
pub struct LightSway {
    light: ComponentId,
    transform: ComponentId,
    /// Radians per second.
    pub turn_rate: f32,
    elapsed: f32,
}

impl LightSway {
    /// `None` if either component type is not registered.
    #[must_use]
    pub fn new(registry: &ComponentRegistry) -> Option<Self> {
        Some(Self {
            light: registry.id_of::<Light>()?,
            transform: registry.id_of::<Transform>()?,
            turn_rate: 0.5,
            elapsed: 0.0,
        })
    }
}

impl System for LightSway {
    fn signature(&self) -> Signature {
        Signature::new()
            .required(self.light)
            .optional(self.transform)
    }

    fn update_components(&mut self, dt: f32, rows: &mut QueryResult<'_>) {
        self.elapsed += dt;
        let pulse = 0.75 + 0.25 * self.elapsed.sin();
        let turn = Quat::from_rotation_y(self.turn_rate * dt);
        let mut unplaced = 0;
        for mut row in rows.rows_mut() {
            if let Some(light) = row.get_mut::<Light>(0) {
                light.intensity = pulse;
            }
            match row.get_mut::<Transform>(1) {
                Some(transform) => transform.rotation = (turn * transform.rotation).normalize(),
                None => unplaced += 1,
            }
        }
        trace!(lights = rows.len(), unplaced, pulse, "swayed lights");
    }

    fn name(&self) -> &str {
        "light_sway"
    }
}
