//! Narrowphase collision detection: GJK over the Minkowski difference.

use glam::Vec3;

use crate::body::Body;
use crate::contact::{self, Contact};
use crate::error::PhysicsError;
use crate::math::triple_cross;

/// Magnitudes below this are treated as "on the boundary" to avoid
/// oscillation near grazing contacts.
pub(crate) const GJK_TOLERANCE: f32 = 1e-5;

/// Search direction used when the regular direction update degenerates
/// to (near) zero. Keeping the search alive lets the simplex complete
/// to a tetrahedron, which contact extraction requires.
const TIE_BREAK_AXIS: Vec3 = Vec3::Z;

/// A Minkowski-difference point together with the two generating
/// support points, kept so the contact point can be reconstructed by
/// barycentric interpolation.
#[derive(Debug, Clone, Copy)]
pub struct SupportPoint {
    pub minkowski: Vec3,
    pub on_a: Vec3,
    pub on_b: Vec3,
}

const ZERO_POINT: SupportPoint = SupportPoint {
    minkowski: Vec3::ZERO,
    on_a: Vec3::ZERO,
    on_b: Vec3::ZERO,
};

/// The GJK simplex: up to 4 support points, newest last.
///
/// Fixed capacity; each GJK invocation owns exactly one.
#[derive(Debug, Clone)]
pub struct Simplex {
    points: [SupportPoint; 4],
    len: usize,
}

impl Simplex {
    fn new() -> Self {
        Self {
            points: [ZERO_POINT; 4],
            len: 0,
        }
    }

    fn push(&mut self, point: SupportPoint) {
        debug_assert!(self.len < 4);
        self.points[self.len] = point;
        self.len += 1;
    }

    fn assign(&mut self, points: &[SupportPoint]) {
        debug_assert!(points.len() <= 4);
        self.points[..points.len()].copy_from_slice(points);
        self.len = points.len();
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn points(&self) -> &[SupportPoint] {
        &self.points[..self.len]
    }

    #[cfg(test)]
    pub(crate) fn from_support_points(points: &[SupportPoint]) -> Self {
        let mut simplex = Self::new();
        simplex.assign(points);
        simplex
    }
}

/// Minkowski difference support function.
fn minkowski_support(a: &Body, b: &Body, direction: Vec3) -> SupportPoint {
    let on_a = a.support(direction);
    let on_b = b.support(-direction);
    SupportPoint {
        minkowski: on_a - on_b,
        on_a,
        on_b,
    }
}

/// Full narrowphase test: GJK followed by contact extraction.
///
/// Returns `Ok(None)` when the shapes do not overlap.
pub fn intersects(a: &Body, b: &Body, max_iterations: u32) -> Result<Option<Contact>, PhysicsError> {
    match gjk_intersection(a, b, max_iterations) {
        Some(simplex) => contact::extract_contact(&simplex, a, b).map(Some),
        None => Ok(None),
    }
}

/// GJK intersection test. On collision the returned simplex is always a
/// full tetrahedron enclosing the origin.
pub fn gjk_intersection(a: &Body, b: &Body, max_iterations: u32) -> Option<Simplex> {
    let mut direction = a.position - b.position;
    if direction.length_squared() < GJK_TOLERANCE * GJK_TOLERANCE {
        direction = Vec3::X;
    }

    let mut simplex = Simplex::new();
    let first = minkowski_support(a, b, direction);
    simplex.push(first);
    direction = -first.minkowski;

    for _ in 0..max_iterations {
        if direction.length_squared() < GJK_TOLERANCE * GJK_TOLERANCE {
            direction = TIE_BREAK_AXIS;
        }

        let new_point = minkowski_support(a, b, direction);
        if new_point.minkowski.dot(direction) < 0.0 {
            // The Minkowski difference cannot reach past the origin
            return None;
        }
        simplex.push(new_point);

        if do_simplex(&mut simplex, &mut direction) {
            return Some(simplex);
        }
    }

    tracing::warn!(
        max_iterations,
        "GJK did not converge, treating pair as non-colliding"
    );
    None
}

/// Process the simplex and update the search direction.
/// Returns true if the origin is contained in the simplex.
fn do_simplex(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    match simplex.len() {
        2 => do_simplex_line(simplex, direction),
        3 => do_simplex_triangle(simplex, direction),
        4 => do_simplex_tetrahedron(simplex, direction),
        _ => false,
    }
}

fn do_simplex_line(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    let a = simplex.points()[1]; // Most recently added
    let b = simplex.points()[0];
    let ab = b.minkowski - a.minkowski;
    let ao = -a.minkowski;

    if ab.dot(ao) > 0.0 {
        let perpendicular = triple_cross(ab, ao, ab);
        if perpendicular.length_squared() < GJK_TOLERANCE * GJK_TOLERANCE {
            // Origin sits on the segment itself
            *direction = TIE_BREAK_AXIS;
        } else {
            *direction = perpendicular;
        }
    } else {
        simplex.assign(&[a]);
        *direction = ao;
    }
    false
}

fn do_simplex_triangle(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    let a = simplex.points()[2]; // Most recently added
    let b = simplex.points()[1];
    let c = simplex.points()[0];
    let ab = b.minkowski - a.minkowski;
    let ac = c.minkowski - a.minkowski;
    let ao = -a.minkowski;
    let abc = ab.cross(ac);

    if abc.length_squared() < GJK_TOLERANCE * GJK_TOLERANCE {
        // Degenerate (collinear) triangle
        *direction = TIE_BREAK_AXIS;
        return false;
    }

    if abc.cross(ac).dot(ao) > 0.0 {
        if ac.dot(ao) > 0.0 {
            simplex.assign(&[c, a]);
            let perpendicular = triple_cross(ac, ao, ac);
            if perpendicular.length_squared() < GJK_TOLERANCE * GJK_TOLERANCE {
                *direction = TIE_BREAK_AXIS;
            } else {
                *direction = perpendicular;
            }
        } else {
            simplex.assign(&[b, a]);
            return do_simplex_line(simplex, direction);
        }
    } else if ab.cross(abc).dot(ao) > 0.0 {
        simplex.assign(&[b, a]);
        return do_simplex_line(simplex, direction);
    } else {
        // Origin is above or below the triangle
        if abc.dot(ao) > 0.0 {
            *direction = abc;
        } else {
            simplex.assign(&[b, c, a]);
            *direction = -abc;
        }
    }
    false
}

fn do_simplex_tetrahedron(simplex: &mut Simplex, direction: &mut Vec3) -> bool {
    let a = simplex.points()[3]; // Most recently added
    let b = simplex.points()[2];
    let c = simplex.points()[1];
    let d = simplex.points()[0];
    let ab = b.minkowski - a.minkowski;
    let ac = c.minkowski - a.minkowski;
    let ad = d.minkowski - a.minkowski;
    let ao = -a.minkowski;

    let abc = ab.cross(ac);
    let acd = ac.cross(ad);
    let adb = ad.cross(ab);

    if abc.dot(ao) > 0.0 {
        simplex.assign(&[c, b, a]);
        *direction = abc;
        return do_simplex_triangle(simplex, direction);
    }
    if acd.dot(ao) > 0.0 {
        simplex.assign(&[d, c, a]);
        *direction = acd;
        return do_simplex_triangle(simplex, direction);
    }
    if adb.dot(ao) > 0.0 {
        simplex.assign(&[b, d, a]);
        *direction = adb;
        return do_simplex_triangle(simplex, direction);
    }

    // Origin is inside all four face half-spaces
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    const MAX_ITERATIONS: u32 = 64;

    #[test]
    fn test_gjk_spheres_intersecting() {
        let a = Body::sphere(Vec3::ZERO, 1.0, 1.0);
        let b = Body::sphere(Vec3::new(1.0, 0.0, 0.0), 1.0, 1.0);

        let simplex = gjk_intersection(&a, &b, MAX_ITERATIONS);
        assert!(simplex.is_some());
        assert_eq!(simplex.unwrap().len(), 4);
    }

    #[test]
    fn test_gjk_spheres_not_intersecting() {
        let a = Body::sphere(Vec3::ZERO, 1.0, 1.0);
        let b = Body::sphere(Vec3::new(5.0, 0.0, 0.0), 1.0, 1.0);

        assert!(gjk_intersection(&a, &b, MAX_ITERATIONS).is_none());
    }

    #[test]
    fn test_gjk_just_separated() {
        let a = Body::sphere(Vec3::ZERO, 1.0, 1.0);
        let b = Body::sphere(Vec3::new(2.01, 0.0, 0.0), 1.0, 1.0);

        assert!(gjk_intersection(&a, &b, MAX_ITERATIONS).is_none());
    }

    #[test]
    fn test_gjk_coincident_centers() {
        let a = Body::sphere(Vec3::ZERO, 1.0, 1.0);
        let b = Body::sphere(Vec3::ZERO, 0.5, 1.0);

        let simplex = gjk_intersection(&a, &b, MAX_ITERATIONS);
        assert!(simplex.is_some());
        assert_eq!(simplex.unwrap().len(), 4);
    }

    #[test]
    fn test_gjk_boxes_intersecting() {
        let a = Body::cuboid(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE, 1.0);
        let b = Body::cuboid(Vec3::new(1.5, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE, 1.0);

        assert!(gjk_intersection(&a, &b, MAX_ITERATIONS).is_some());
    }

    #[test]
    fn test_gjk_boxes_separated() {
        let a = Body::cuboid(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE, 1.0);
        let b = Body::cuboid(Vec3::new(3.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE, 1.0);

        assert!(gjk_intersection(&a, &b, MAX_ITERATIONS).is_none());
    }

    #[test]
    fn test_gjk_box_sphere() {
        let cube = Body::cuboid(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE, 1.0);
        let sphere = Body::sphere(Vec3::new(0.0, 1.4, 0.0), 0.5, 1.0);

        let simplex = gjk_intersection(&cube, &sphere, MAX_ITERATIONS);
        assert!(simplex.is_some());
        assert_eq!(simplex.unwrap().len(), 4);
    }

    #[test]
    fn test_gjk_sphere_above_surface() {
        let floor = Body::surface([
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(10.0, 0.0, -10.0),
            Vec3::new(10.0, 0.0, 10.0),
            Vec3::new(-10.0, 0.0, 10.0),
        ])
        .unwrap();
        let touching = Body::sphere(Vec3::new(0.0, 0.4, 0.0), 0.5, 1.0);
        let separated = Body::sphere(Vec3::new(0.0, 2.0, 0.0), 0.5, 1.0);

        assert!(gjk_intersection(&touching, &floor, MAX_ITERATIONS).is_some());
        assert!(gjk_intersection(&separated, &floor, MAX_ITERATIONS).is_none());
    }

    #[test]
    fn test_gjk_symmetric_in_argument_order() {
        let pairs = [
            (Vec3::new(1.2, 0.3, -0.4), true),
            (Vec3::new(3.0, 0.0, 0.0), false),
            (Vec3::new(0.0, 1.9, 0.0), true),
        ];
        for (offset, expected) in pairs {
            let a = Body::sphere(Vec3::ZERO, 1.0, 1.0);
            let b = Body::sphere(offset, 1.0, 1.0);
            let ab = gjk_intersection(&a, &b, MAX_ITERATIONS).is_some();
            let ba = gjk_intersection(&b, &a, MAX_ITERATIONS).is_some();
            assert_eq!(ab, expected, "offset {offset:?}");
            assert_eq!(ab, ba, "symmetry violated at offset {offset:?}");
        }
    }

    #[test]
    fn test_gjk_iteration_cap_terminates() {
        let a = Body::sphere(Vec3::ZERO, 1.0, 1.0);
        let b = Body::sphere(Vec3::new(1.0, 0.0, 0.0), 1.0, 1.0);
        // A cap of 1 cannot build a tetrahedron; must still terminate
        assert!(gjk_intersection(&a, &b, 1).is_none());
    }
}
