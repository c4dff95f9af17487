//! Small math helpers layered over glam.

use glam::{Quat, Vec3};

use crate::error::PhysicsError;

/// Pivots below this magnitude make the barycentric system singular.
const PIVOT_EPSILON: f32 = 1e-9;

/// Triple cross product: (a x b) x c.
#[inline]
pub fn triple_cross(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    a.cross(b).cross(c)
}

/// Build a rotation of `angle` radians about `axis`.
///
/// The axis does not need to be normalized, but it must not be zero.
pub fn rotation_about_axis(axis: Vec3, angle: f32) -> Result<Quat, PhysicsError> {
    if axis.length_squared() < 1e-10 {
        return Err(PhysicsError::ZeroRotationAxis);
    }
    Ok(Quat::from_axis_angle(axis.normalize(), angle))
}

/// Solve a 4x4 linear system by Gaussian elimination with partial
/// pivoting. Returns `None` when the matrix is singular.
pub fn solve_linear4(mut m: [[f32; 4]; 4], mut rhs: [f32; 4]) -> Option<[f32; 4]> {
    for col in 0..4 {
        // Pick the largest remaining pivot in this column
        let mut pivot_row = col;
        for row in (col + 1)..4 {
            if m[row][col].abs() > m[pivot_row][col].abs() {
                pivot_row = row;
            }
        }
        if m[pivot_row][col].abs() < PIVOT_EPSILON {
            return None;
        }
        if pivot_row != col {
            m.swap(col, pivot_row);
            rhs.swap(col, pivot_row);
        }

        for row in (col + 1)..4 {
            let factor = m[row][col] / m[col][col];
            for k in col..4 {
                m[row][k] -= factor * m[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    // Back substitution
    let mut x = [0.0f32; 4];
    for row in (0..4).rev() {
        let mut sum = rhs[row];
        for k in (row + 1)..4 {
            sum -= m[row][k] * x[k];
        }
        x[row] = sum / m[row][row];
    }
    Some(x)
}
