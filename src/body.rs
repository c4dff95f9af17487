//! Convex shapes and per-body kinematic state.

use glam::{Quat, Vec3};

use crate::error::PhysicsError;

/// Maximum distance a fourth corner may sit off the plane of the first
/// three before the surface is rejected as non-planar.
const PLANARITY_TOLERANCE: f32 = 1e-4;

/// Convex shape carried by a [`Body`].
#[derive(Debug, Clone)]
pub enum ShapeKind {
    Sphere {
        radius: f32,
    },
    Box {
        half_extents: Vec3,
        /// Corner points in the local frame, fixed at construction.
        corners: [Vec3; 8],
    },
    Surface {
        /// Coplanar corner points in world space.
        corners: [Vec3; 4],
        /// Unit plane normal, fixed at construction.
        normal: Vec3,
    },
}

/// A simulated rigid body: one convex shape plus kinematic state.
///
/// Mass may be `f32::INFINITY` for immovable bodies; the inverse mass
/// and inverse inertia are zero in that case and the solver leaves the
/// body untouched.
#[derive(Debug, Clone)]
pub struct Body {
    pub kind: ShapeKind,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub mass: f32,
    pub inv_mass: f32,
    /// Inverse inertia tensor diagonal in the body frame.
    pub inv_inertia: Vec3,
    /// Set while any contact involving this body was found this step.
    pub colliding: bool,
}

impl Body {
    /// Create a sphere body.
    pub fn sphere(position: Vec3, radius: f32, mass: f32) -> Self {
        let inv_mass = inverse_of(mass);
        // Solid sphere: I = 2/5 m r^2 about every axis
        let inertia = 0.4 * mass * radius * radius;
        Self {
            kind: ShapeKind::Sphere { radius },
            position,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass,
            inv_mass,
            inv_inertia: Vec3::splat(inverse_of(inertia)),
            colliding: false,
        }
    }

    /// Create a box body from half-extents per axis.
    pub fn cuboid(position: Vec3, orientation: Quat, half_extents: Vec3, mass: f32) -> Self {
        let h = half_extents;
        let corners = [
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
        ];
        // Solid cuboid: I_x = m/3 (h_y^2 + h_z^2), cyclically
        let inertia = Vec3::new(
            mass / 3.0 * (h.y * h.y + h.z * h.z),
            mass / 3.0 * (h.x * h.x + h.z * h.z),
            mass / 3.0 * (h.x * h.x + h.y * h.y),
        );
        Self {
            kind: ShapeKind::Box {
                half_extents: h,
                corners,
            },
            position,
            orientation,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass,
            inv_mass: inverse_of(mass),
            inv_inertia: Vec3::new(
                inverse_of(inertia.x),
                inverse_of(inertia.y),
                inverse_of(inertia.z),
            ),
            colliding: false,
        }
    }

    /// Create an immovable surface from four coplanar world-space
    /// corners, wound consistently around the implied normal.
    pub fn surface(corners: [Vec3; 4]) -> Result<Self, PhysicsError> {
        let cross = (corners[1] - corners[0]).cross(corners[2] - corners[0]);
        if cross.length_squared() < 1e-10 {
            return Err(PhysicsError::DegenerateSurface {
                reason: "zero area",
            });
        }
        let normal = cross.normalize();
        if (corners[3] - corners[0]).dot(normal).abs() > PLANARITY_TOLERANCE {
            return Err(PhysicsError::DegenerateSurface {
                reason: "corners are not coplanar",
            });
        }
        let centroid = (corners[0] + corners[1] + corners[2] + corners[3]) / 4.0;
        Ok(Self {
            kind: ShapeKind::Surface { corners, normal },
            position: centroid,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: f32::INFINITY,
            inv_mass: 0.0,
            inv_inertia: Vec3::ZERO,
            colliding: false,
        })
    }

    /// Whether this body can never move (zero inverse mass).
    #[inline]
    pub fn is_immovable(&self) -> bool {
        self.inv_mass == 0.0
    }

    /// Whether any contact involving this body was found this step.
    #[inline]
    pub fn is_colliding(&self) -> bool {
        self.colliding
    }

    /// Support function: the boundary point farthest along `direction`.
    ///
    /// Exact vertex enumeration for boxes and surfaces, analytic for
    /// spheres.
    pub fn support(&self, direction: Vec3) -> Vec3 {
        match &self.kind {
            ShapeKind::Sphere { radius } => {
                let dir = direction.try_normalize().unwrap_or(Vec3::X);
                self.position + dir * *radius
            }
            ShapeKind::Box { corners, .. } => {
                let mut best = self.orientation * corners[0];
                let mut best_dot = best.dot(direction);
                for corner in &corners[1..] {
                    let world = self.orientation * *corner;
                    let d = world.dot(direction);
                    if d > best_dot {
                        best_dot = d;
                        best = world;
                    }
                }
                self.position + best
            }
            ShapeKind::Surface { corners, .. } => {
                let mut best = corners[0];
                let mut best_dot = best.dot(direction);
                for corner in &corners[1..] {
                    let d = corner.dot(direction);
                    if d > best_dot {
                        best_dot = d;
                        best = *corner;
                    }
                }
                best
            }
        }
    }

    /// Outward surface normal at a boundary point.
    pub fn normal_at(&self, point: Vec3) -> Vec3 {
        match &self.kind {
            ShapeKind::Sphere { .. } => (point - self.position)
                .try_normalize()
                .unwrap_or(Vec3::Y),
            ShapeKind::Box { half_extents, .. } => {
                let local = self.orientation.inverse() * (point - self.position);
                // Face whose plane the point is proportionally closest to
                let ratios = Vec3::new(
                    local.x.abs() / half_extents.x.max(1e-6),
                    local.y.abs() / half_extents.y.max(1e-6),
                    local.z.abs() / half_extents.z.max(1e-6),
                );
                let local_normal = if ratios.x >= ratios.y && ratios.x >= ratios.z {
                    Vec3::new(local.x.signum(), 0.0, 0.0)
                } else if ratios.y >= ratios.z {
                    Vec3::new(0.0, local.y.signum(), 0.0)
                } else {
                    Vec3::new(0.0, 0.0, local.z.signum())
                };
                self.orientation * local_normal
            }
            ShapeKind::Surface { normal, .. } => *normal,
        }
    }

    /// Radius of the bounding sphere centered at the body position.
    pub fn bounding_radius(&self) -> f32 {
        match &self.kind {
            ShapeKind::Sphere { radius } => *radius,
            ShapeKind::Box { half_extents, .. } => half_extents.length(),
            ShapeKind::Surface { corners, .. } => corners
                .iter()
                .map(|c| (*c - self.position).length())
                .fold(0.0, f32::max),
        }
    }

    /// Half-extent of the shape along a unit direction, measured from
    /// the body position. Used by the penetration depth formulas.
    pub fn extent_along(&self, direction: Vec3) -> f32 {
        match &self.kind {
            ShapeKind::Sphere { radius } => *radius,
            ShapeKind::Box { half_extents, .. } => {
                let axes = [
                    self.orientation * Vec3::X,
                    self.orientation * Vec3::Y,
                    self.orientation * Vec3::Z,
                ];
                half_extents.x * axes[0].dot(direction).abs()
                    + half_extents.y * axes[1].dot(direction).abs()
                    + half_extents.z * axes[2].dot(direction).abs()
            }
            ShapeKind::Surface { .. } => 0.0,
        }
    }
}

#[inline]
fn inverse_of(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        1.0 / value
    } else {
        0.0
    }
}
