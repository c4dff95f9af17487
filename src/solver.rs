//! Single-pass sequential impulse collision response.

use glam::Vec3;

use crate::body::Body;
use crate::contact::Contact;

/// Coefficient of restitution applied to every contact.
const RESTITUTION: f32 = 0.5;
/// Penetration bias factor folded into the normal impulse.
const BAUMGARTE_BETA: f32 = 0.2;
/// Allowed penetration before the bias kicks in.
const PENETRATION_SLOP: f32 = 0.005;
/// Relative normal speeds below this count as resting, not separating.
const SEPARATION_EPSILON: f32 = 1e-5;

/// Resolve one contact by mutating both bodies' linear and angular
/// velocities. A no-op when both bodies are immovable or already
/// separating along the contact normal.
pub fn resolve(a: &mut Body, b: &mut Body, contact: &Contact, dt: f32) {
    if a.inv_mass == 0.0 && b.inv_mass == 0.0 {
        return;
    }

    // Re-orient the normal from b toward a if needed
    let mut normal = contact.normal;
    if normal.dot(a.position - b.position) < 0.0 {
        normal = -normal;
    }

    let r1 = contact.point - a.position;
    let r2 = contact.point - b.position;

    let v1 = a.linear_velocity + a.angular_velocity.cross(r1);
    let v2 = b.linear_velocity + b.angular_velocity.cross(r2);
    let relative_velocity = v1 - v2;

    let contact_velocity = relative_velocity.dot(normal);
    if contact_velocity > SEPARATION_EPSILON {
        // Already separating
        return;
    }

    let r1_cross_n = r1.cross(normal);
    let r2_cross_n = r2.cross(normal);
    let inv_mass_sum = a.inv_mass
        + b.inv_mass
        + (a.inv_inertia * r1_cross_n).dot(r1_cross_n)
        + (b.inv_inertia * r2_cross_n).dot(r2_cross_n);
    if inv_mass_sum <= 0.0 {
        return;
    }

    // Penetration bias folded directly into the impulse magnitude
    let bias = BAUMGARTE_BETA / dt * (contact.depth - PENETRATION_SLOP).max(0.0);
    let j_normal = ((-(1.0 + RESTITUTION) * contact_velocity + bias) / inv_mass_sum).max(0.0);

    let impulse = normal * j_normal;
    apply_impulse(a, b, impulse, r1, r2);

    // Friction against the post-impulse tangential velocity
    let v1 = a.linear_velocity + a.angular_velocity.cross(r1);
    let v2 = b.linear_velocity + b.angular_velocity.cross(r2);
    let relative_velocity = v1 - v2;

    let tangent_velocity = relative_velocity - normal * relative_velocity.dot(normal);
    let tangent_speed = tangent_velocity.length();
    if tangent_speed <= 1e-6 {
        return;
    }
    let tangent = tangent_velocity / tangent_speed;

    let r1_cross_t = r1.cross(tangent);
    let r2_cross_t = r2.cross(tangent);
    let inv_mass_tangent = a.inv_mass
        + b.inv_mass
        + (a.inv_inertia * r1_cross_t).dot(r1_cross_t)
        + (b.inv_inertia * r2_cross_t).dot(r2_cross_t);
    if inv_mass_tangent <= 0.0 {
        return;
    }

    // No Coulomb cone: the tangential impulse is not clamped against
    // the normal impulse.
    let j_tangent = -tangent_speed / inv_mass_tangent;
    apply_impulse(a, b, tangent * j_tangent, r1, r2);
}

/// Apply an impulse (oriented toward `a`) at the contact point.
fn apply_impulse(a: &mut Body, b: &mut Body, impulse: Vec3, r1: Vec3, r2: Vec3) {
    a.linear_velocity += impulse * a.inv_mass;
    a.angular_velocity += a.inv_inertia * r1.cross(impulse);

    b.linear_velocity -= impulse * b.inv_mass;
    b.angular_velocity -= b.inv_inertia * r2.cross(impulse);
}
