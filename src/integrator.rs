//! Semi-implicit Euler integration.

use glam::Vec3;

use crate::body::Body;

/// Advance one body by one timestep: gravity into velocity, then
/// velocity into position. Immovable bodies are left untouched.
///
/// Runs after all collision responses for the step have been applied.
pub fn step(body: &mut Body, gravity: Vec3, dt: f32) {
    if body.inv_mass == 0.0 {
        return;
    }

    body.linear_velocity += gravity * dt;
    body.position += body.linear_velocity * dt;
}
