//! Broadphase collision filtering with bounding spheres.

use glam::Vec3;

use crate::body::{Body, ShapeKind};
use crate::error::PhysicsError;

/// Enlargement factor applied to bounding radii; grazing pairs must
/// still reach the narrowphase.
const BOUNDS_MARGIN: f32 = 1.1;

/// Cheap conservative test gating which pairs reach the narrowphase.
///
/// `false` is a sound negative; `true` only means the pair must be
/// checked exactly. Surface-surface pairs are undefined and rejected.
pub fn maybe_colliding(a: &Body, b: &Body) -> Result<bool, PhysicsError> {
    match (&a.kind, &b.kind) {
        (ShapeKind::Surface { .. }, ShapeKind::Surface { .. }) => Err(PhysicsError::SurfacePair),
        (ShapeKind::Surface { corners, normal }, _) => {
            Ok(near_plane(b, corners[0], *normal))
        }
        (_, ShapeKind::Surface { corners, normal }) => {
            Ok(near_plane(a, corners[0], *normal))
        }
        _ => {
            let reach = (a.bounding_radius() + b.bounding_radius()) * BOUNDS_MARGIN;
            Ok((a.position - b.position).length_squared() <= reach * reach)
        }
    }
}

/// Compare the signed distance from the body center to the surface's
/// infinite plane against the body's enlarged bounding radius.
fn near_plane(body: &Body, plane_point: Vec3, plane_normal: Vec3) -> bool {
    let signed = (body.position - plane_point).dot(plane_normal);
    signed.abs() <= body.bounding_radius() * BOUNDS_MARGIN
}
