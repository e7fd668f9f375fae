//! 3D transform component.
//!
//! [`Transform`] is an entity's position, rotation and scale relative to its
//! parent entity (or to the world, for top-level entities). The world
//! transform of an entity is the product of the local matrices along its
//! ancestor chain; with non-uniform scale that product is only exact as a
//! [`Mat4`], so composition happens on matrices.

use engine_component::Component;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A local-space transform: position, rotation and per-axis scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// Position relative to the parent.
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a transform at `position` with default rotation and scale.
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Create a transform with position and rotation.
    #[must_use]
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Self::IDENTITY
        }
    }

    /// Decompose an affine matrix. Shear is discarded.
    #[must_use]
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Compute the 4×4 model matrix for this transform.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Multiply the scale by `factor` on every axis.
    #[must_use]
    pub fn scaled(mut self, factor: f32) -> Self {
        self.scale *= factor;
        self
    }

    /// Returns `true` if every component is within `max_abs_diff`.
    #[must_use]
    pub fn abs_diff_eq(&self, other: &Transform, max_abs_diff: f32) -> bool {
        self.position.abs_diff_eq(other.position, max_abs_diff)
            && self.scale.abs_diff_eq(other.scale, max_abs_diff)
            && (self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
                || self.rotation.abs_diff_eq(-other.rotation, max_abs_diff))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for Transform {
    fn type_name() -> &'static str {
        "Transform"
    }
}
