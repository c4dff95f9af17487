//! Contact geometry extraction from a terminal GJK simplex.

use glam::Vec3;

use crate::body::{Body, ShapeKind};
use crate::error::PhysicsError;
use crate::math::solve_linear4;
use crate::narrowphase::{Simplex, SupportPoint};

/// Negative depths within this tolerance are floating round-off and
/// clamp to zero; anything beyond is a contract violation.
const DEPTH_TOLERANCE: f32 = 1e-5;

/// Slack for the point-in-quad and face-region membership tests.
const REGION_TOLERANCE: f32 = 1e-5;

/// Information about a single contact between two bodies.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// Contact point in world space.
    pub point: Vec3,
    /// Unit contact normal, pointing from the second body toward the
    /// first.
    pub normal: Vec3,
    /// Penetration depth, never negative.
    pub depth: f32,
}

/// Shape-type precedence for the normal/depth policy. The operands are
/// reordered so the highest-precedence shape drives the branch.
fn precedence(kind: &ShapeKind) -> u8 {
    match kind {
        ShapeKind::Surface { .. } => 2,
        ShapeKind::Box { .. } => 1,
        ShapeKind::Sphere { .. } => 0,
    }
}

/// Convert a terminal 4-point simplex into a world-space contact.
pub fn extract_contact(simplex: &Simplex, a: &Body, b: &Body) -> Result<Contact, PhysicsError> {
    let points = simplex.points();
    if points.len() != 4 {
        return Err(PhysicsError::IncompleteSimplex { len: points.len() });
    }

    // Reorder so the higher-precedence shape type is "first"; witness
    // points are taken from the same side.
    let swapped = precedence(&b.kind) > precedence(&a.kind);
    let (first, second) = if swapped { (b, a) } else { (a, b) };

    let point = match barycentric_witness(points, swapped) {
        Some(p) => p,
        None => nearest_feature_witness(points, swapped),
    };

    let (normal, depth) = match (&first.kind, &second.kind) {
        (ShapeKind::Surface { .. }, ShapeKind::Surface { .. }) => {
            return Err(PhysicsError::SurfacePair)
        }
        (ShapeKind::Surface { corners, normal }, _) => {
            surface_normal_depth(corners, *normal, first, second, point)
        }
        (ShapeKind::Box { half_extents, .. }, _) => {
            box_normal_depth(*half_extents, first, second, point)
        }
        (ShapeKind::Sphere { radius }, _) => sphere_normal_depth(*radius, first, second, point),
    };

    let depth = if depth < 0.0 {
        if depth >= -DEPTH_TOLERANCE {
            0.0
        } else {
            return Err(PhysicsError::NegativeDepth { depth });
        }
    } else {
        depth
    };

    // Contact normals point from the second caller operand toward the
    // first.
    let toward_a = a.position - b.position;
    let normal = if normal.dot(toward_a) < 0.0 {
        -normal
    } else {
        normal
    };

    Ok(Contact {
        point,
        normal,
        depth,
    })
}

/// Primary contact-point method: solve for barycentric weights of the
/// origin inside the Minkowski tetrahedron, then apply them to the
/// first-role shape's witness points. `None` when the tetrahedron is
/// degenerate.
fn barycentric_witness(points: &[SupportPoint], swapped: bool) -> Option<Vec3> {
    let m = [
        [1.0, 1.0, 1.0, 1.0],
        [
            points[0].minkowski.x,
            points[1].minkowski.x,
            points[2].minkowski.x,
            points[3].minkowski.x,
        ],
        [
            points[0].minkowski.y,
            points[1].minkowski.y,
            points[2].minkowski.y,
            points[3].minkowski.y,
        ],
        [
            points[0].minkowski.z,
            points[1].minkowski.z,
            points[2].minkowski.z,
            points[3].minkowski.z,
        ],
    ];
    let weights = solve_linear4(m, [1.0, 0.0, 0.0, 0.0])?;

    let mut point = Vec3::ZERO;
    for (weight, support) in weights.iter().zip(points) {
        point += *weight * witness(support, swapped);
    }
    Some(point)
}

#[inline]
fn witness(support: &SupportPoint, swapped: bool) -> Vec3 {
    if swapped {
        support.on_b
    } else {
        support.on_a
    }
}

/// Fallback for degenerate tetrahedra: walk vertices, then edges, then
/// faces of the simplex for the feature closest to the origin, and
/// average that feature's witness points.
fn nearest_feature_witness(points: &[SupportPoint], swapped: bool) -> Vec3 {
    const EDGES: [(usize, usize); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];
    const FACES: [(usize, usize, usize); 4] = [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)];

    let mut best_dist = f32::MAX;
    let mut best_point = witness(&points[0], swapped);

    for support in points {
        let dist = support.minkowski.length_squared();
        if dist < best_dist {
            best_dist = dist;
            best_point = witness(support, swapped);
        }
    }

    for (i, j) in EDGES {
        let closest = closest_point_on_segment(points[i].minkowski, points[j].minkowski);
        let dist = closest.length_squared();
        if dist < best_dist {
            best_dist = dist;
            best_point = (witness(&points[i], swapped) + witness(&points[j], swapped)) / 2.0;
        }
    }

    for (i, j, k) in FACES {
        let closest = closest_point_on_triangle(
            points[i].minkowski,
            points[j].minkowski,
            points[k].minkowski,
        );
        let dist = closest.length_squared();
        if dist < best_dist {
            best_dist = dist;
            best_point = (witness(&points[i], swapped)
                + witness(&points[j], swapped)
                + witness(&points[k], swapped))
                / 3.0;
        }
    }

    best_point
}

/// Find the closest point on a segment to the origin.
fn closest_point_on_segment(a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-12 {
        return a;
    }
    let t = (-a.dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Find the closest point on a triangle to the origin.
fn closest_point_on_triangle(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ao = -a;

    let d1 = ab.dot(ao);
    let d2 = ac.dot(ao);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bo = -b;
    let d3 = ab.dot(bo);
    let d4 = ac.dot(bo);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let co = -c;
    let d5 = ab.dot(co);
    let d6 = ac.dot(co);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Surface paired with a mobile shape.
fn surface_normal_depth(
    corners: &[Vec3; 4],
    plane_normal: Vec3,
    surface: &Body,
    other: &Body,
    point: Vec3,
) -> (Vec3, f32) {
    // Orient the plane normal toward the other body
    let mut normal = plane_normal;
    if (other.position - corners[0]).dot(normal) < 0.0 {
        normal = -normal;
    }

    let projected =
        other.position - (other.position - corners[0]).dot(plane_normal) * plane_normal;
    if point_in_quad(projected, corners, plane_normal) {
        let depth = other.extent_along(normal) - (other.position - surface.position).dot(normal);
        (normal, depth)
    } else {
        // Center is past the finite rectangle; use the shape's own
        // normal at the contact point
        let own = other.normal_at(point);
        (own, depth_toward(other, point, own))
    }
}

/// Box paired with a non-surface shape.
fn box_normal_depth(half_extents: Vec3, box_body: &Body, other: &Body, point: Vec3) -> (Vec3, f32) {
    let local = box_body.orientation.inverse() * (other.position - box_body.position);
    let inside_axes = (local.x.abs() <= half_extents.x + REGION_TOLERANCE) as u8
        + (local.y.abs() <= half_extents.y + REGION_TOLERANCE) as u8
        + (local.z.abs() <= half_extents.z + REGION_TOLERANCE) as u8;

    if inside_axes >= 2 {
        // Face region: the face the other body sits beyond
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
        let normal = box_body.orientation * local_normal;
        let depth = box_body.extent_along(normal) + other.extent_along(normal)
            - (other.position - box_body.position).dot(normal);
        (normal, depth)
    } else {
        // Edge or corner region
        let own = other.normal_at(point);
        (own, depth_toward(other, point, own))
    }
}

/// Sphere paired with a sphere (the lowest-precedence pairing).
fn sphere_normal_depth(radius: f32, sphere: &Body, other: &Body, point: Vec3) -> (Vec3, f32) {
    let axis = other.position - sphere.position;
    let normal = axis.try_normalize().unwrap_or_else(|| {
        (point - sphere.position)
            .try_normalize()
            .unwrap_or(Vec3::Y)
    });
    let depth = radius + other.extent_along(normal) - axis.dot(normal);
    (normal, depth)
}

/// Generic depth of `body` past the contact point along its own
/// outward normal.
fn depth_toward(body: &Body, point: Vec3, normal: Vec3) -> f32 {
    body.extent_along(normal) - (point - body.position).dot(normal)
}

/// Whether a point already on the plane lies within the finite quad.
/// Corners must be wound consistently with `plane_normal`.
fn point_in_quad(point: Vec3, corners: &[Vec3; 4], plane_normal: Vec3) -> bool {
    for i in 0..4 {
        let edge = corners[(i + 1) % 4] - corners[i];
        if edge.cross(point - corners[i]).dot(plane_normal) < -REGION_TOLERANCE {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrowphase::{gjk_intersection, intersects};
    use glam::Quat;

    const MAX_ITERATIONS: u32 = 64;

    fn floor() -> Body {
        Body::surface([
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(10.0, 0.0, -10.0),
            Vec3::new(10.0, 0.0, 10.0),
            Vec3::new(-10.0, 0.0, 10.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_sphere_sphere_depth_and_normal() {
        let a = Body::sphere(Vec3::ZERO, 1.0, 1.0);
        let b = Body::sphere(Vec3::new(1.5, 0.0, 0.0), 1.0, 1.0);

        let contact = intersects(&a, &b, MAX_ITERATIONS).unwrap().unwrap();
        let eps = 1e-4;
        assert!((contact.depth - 0.5).abs() < eps);
        assert!((contact.normal.length() - 1.0).abs() < eps);
        // Parallel to the center axis, pointing from b toward a
        assert!((contact.normal - Vec3::new(-1.0, 0.0, 0.0)).length() < eps);
    }

    #[test]
    fn test_sphere_sphere_depth_varies_with_distance() {
        for distance in [0.5f32, 1.0, 1.7, 1.95] {
            let a = Body::sphere(Vec3::ZERO, 1.0, 1.0);
            let b = Body::sphere(Vec3::new(0.0, distance, 0.0), 1.0, 1.0);
            let contact = intersects(&a, &b, MAX_ITERATIONS).unwrap().unwrap();
            assert!(
                (contact.depth - (2.0 - distance)).abs() < 1e-4,
                "distance {distance}: depth {}",
                contact.depth
            );
            assert!(contact.depth >= 0.0);
        }
    }

    #[test]
    fn test_falling_sphere_on_cube() {
        // Cube of side 2 at the origin, sphere of radius 0.5 overlapping
        // its top face by 0.1
        let cube = Body::cuboid(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE, 1.0);
        let sphere = Body::sphere(Vec3::new(0.0, 1.4, 0.0), 0.5, 1.0);

        let contact = intersects(&sphere, &cube, MAX_ITERATIONS).unwrap().unwrap();
        let eps = 1e-4;
        assert!((contact.depth - 0.1).abs() < eps, "depth {}", contact.depth);
        assert!((contact.normal - Vec3::Y).length() < eps);
    }

    #[test]
    fn test_sphere_resting_on_surface() {
        let sphere = Body::sphere(Vec3::new(0.0, 0.4, 0.0), 0.5, 1.0);

        let contact = intersects(&sphere, &floor(), MAX_ITERATIONS)
            .unwrap()
            .unwrap();
        let eps = 1e-4;
        assert!((contact.depth - 0.1).abs() < eps, "depth {}", contact.depth);
        // Toward the sphere
        assert!((contact.normal - Vec3::Y).length() < eps);
        // The contact point sits on the plane under the sphere
        assert!(contact.point.y.abs() < 1e-3);
    }

    #[test]
    fn test_sphere_overhanging_surface_edge() {
        // Center projects outside the finite quad but the sphere still
        // reaches the edge
        let quad = Body::surface([
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(-1.0, 0.0, 1.0),
        ])
        .unwrap();
        let sphere = Body::sphere(Vec3::new(1.3, 0.2, 0.0), 0.5, 1.0);

        let contact = intersects(&sphere, &quad, MAX_ITERATIONS).unwrap().unwrap();
        assert!(contact.depth >= 0.0);
        assert!((contact.normal.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_contact_invariants_across_pairs() {
        let bodies = [
            Body::sphere(Vec3::new(0.3, 0.2, -0.1), 1.0, 1.0),
            Body::cuboid(
                Vec3::new(-0.8, 0.5, 0.2),
                Quat::from_rotation_y(0.4),
                Vec3::new(1.0, 0.6, 0.8),
                2.0,
            ),
            Body::cuboid(Vec3::new(0.5, -0.4, 0.0), Quat::IDENTITY, Vec3::ONE, 1.0),
        ];
        for (i, a) in bodies.iter().enumerate() {
            for b in bodies.iter().skip(i + 1) {
                let contact = intersects(a, b, MAX_ITERATIONS).unwrap();
                let contact = contact.expect("overlapping pair must collide");
                assert!((contact.normal.length() - 1.0).abs() < 1e-4);
                assert!(contact.depth >= 0.0);
            }
        }
    }

    #[test]
    fn test_incomplete_simplex_rejected() {
        let a = Body::sphere(Vec3::ZERO, 1.0, 1.0);
        let b = Body::sphere(Vec3::new(1.0, 0.0, 0.0), 1.0, 1.0);
        let simplex = Simplex::from_support_points(&[SupportPoint {
            minkowski: Vec3::X,
            on_a: Vec3::X,
            on_b: Vec3::ZERO,
        }]);
        let result = extract_contact(&simplex, &a, &b);
        assert!(matches!(
            result,
            Err(PhysicsError::IncompleteSimplex { len: 1 })
        ));
    }

    #[test]
    fn test_degenerate_tetrahedron_falls_back() {
        // Four coplanar Minkowski points: the barycentric system is
        // singular and the nearest-feature walk must take over
        let a = Body::sphere(Vec3::ZERO, 1.0, 1.0);
        let b = Body::sphere(Vec3::new(0.5, 0.0, 0.0), 1.0, 1.0);
        let flat = [
            SupportPoint {
                minkowski: Vec3::new(-1.0, -1.0, 0.0),
                on_a: Vec3::new(-1.0, -1.0, 0.0),
                on_b: Vec3::ZERO,
            },
            SupportPoint {
                minkowski: Vec3::new(1.0, -1.0, 0.0),
                on_a: Vec3::new(1.0, -1.0, 0.0),
                on_b: Vec3::ZERO,
            },
            SupportPoint {
                minkowski: Vec3::new(1.0, 1.0, 0.0),
                on_a: Vec3::new(1.0, 1.0, 0.0),
                on_b: Vec3::ZERO,
            },
            SupportPoint {
                minkowski: Vec3::new(-1.0, 1.0, 0.0),
                on_a: Vec3::new(-1.0, 1.0, 0.0),
                on_b: Vec3::ZERO,
            },
        ];
        let simplex = Simplex::from_support_points(&flat);
        let contact = extract_contact(&simplex, &a, &b).unwrap();
        assert!(contact.depth >= 0.0);
        assert!((contact.normal.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_box_sphere_edge_region() {
        // Sphere off past the box edge: the edge/corner branch fires
        let cube = Body::cuboid(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE, 1.0);
        let sphere = Body::sphere(Vec3::new(1.2, 1.2, 0.0), 0.5, 1.0);

        if let Some(simplex) = gjk_intersection(&sphere, &cube, MAX_ITERATIONS) {
            let contact = extract_contact(&simplex, &sphere, &cube).unwrap();
            assert!(contact.depth >= 0.0);
            assert!((contact.normal.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_point_in_quad() {
        // Wound counter-clockwise around +Y
        let corners = [
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(-1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, -1.0),
        ];
        let normal = Vec3::Y;
        assert!(point_in_quad(Vec3::ZERO, &corners, normal));
        assert!(point_in_quad(Vec3::new(0.99, 0.0, -0.99), &corners, normal));
        assert!(!point_in_quad(Vec3::new(1.5, 0.0, 0.0), &corners, normal));
    }
}
