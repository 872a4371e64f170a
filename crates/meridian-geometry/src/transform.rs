//! Rigid transformations between interface coordinate frames.
//!
//! Every interface in a sequential model has a local frame whose origin is
//! the surface vertex and whose z axis is the local optical axis. A
//! [`Transform`] maps local points into the global frame: rotate, then
//! translate. Element outlines are drawn in local coordinates and placed
//! with the transform of their reference interface.

use nalgebra::{Matrix3, Vector3};

/// A rigid transformation: rotation matrix + translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// 3x3 rotation matrix.
    pub rotation: Matrix3<f64>,
    /// Translation vector (system units).
    pub translation: Vector3<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }
}

impl Transform {
    /// Create a pure translation.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::new(dx, dy, dz),
        }
    }

    /// Apply this transformation to a 3D point.
    pub fn apply(&self, point: &[f64; 3]) -> [f64; 3] {
        let v = Vector3::new(point[0], point[1], point[2]);
        let result = self.rotation * v + self.translation;
        [result.x, result.y, result.z]
    }
}
