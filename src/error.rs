//! Crate-wide error type.

/// Errors reported by collision detection and body construction.
///
/// Numerical degeneracies (singular barycentric systems, near-zero
/// normalizations inside GJK) are recovered locally and never surface
/// here; these variants cover violated input contracts and broken
/// physical invariants.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    /// A rotation was requested about a zero-length axis.
    #[error("rotation axis has zero length")]
    ZeroRotationAxis,

    /// A surface was constructed from a zero-area or non-planar quad.
    #[error("surface corners are degenerate: {reason}")]
    DegenerateSurface { reason: &'static str },

    /// Two surfaces were paired for collision; surfaces never collide
    /// with each other.
    #[error("collision between two surfaces is undefined")]
    SurfacePair,

    /// Contact extraction was handed a simplex with fewer than four
    /// points.
    #[error("contact extraction requires a 4-point simplex, got {len}")]
    IncompleteSimplex { len: usize },

    /// Contact extraction produced a penetration depth below the
    /// negative tolerance, which indicates an upstream bug rather than
    /// a valid physical state.
    #[error("penetration depth {depth} is negative beyond tolerance")]
    NegativeDepth { depth: f32 },
}
