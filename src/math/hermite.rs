use nalgebra::Matrix3x4;

use super::{Point3, Vector3, Vector4};

/// A cubic Hermite segment in power-basis form.
///
/// The columns of the coefficient matrix are `C0..C3`, so that
/// `P(t) = C · [1, t, t², t³]ᵀ` for `t ∈ [0, 1]`. Velocities passed to the
/// constructor must already be scaled by the time span of the segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HermiteCubic {
    coeff: Matrix3x4<f64>,
}

impl HermiteCubic {
    /// Builds the cubic interpolating `p0`/`p1` with end tangents `v0`/`v1`.
    #[must_use]
    pub fn new(p0: &Point3, p1: &Point3, v0: &Vector3, v1: &Vector3) -> Self {
        let d = p1 - p0;
        let c2 = d * 3.0 - (v0 * 2.0 + v1);
        let c3 = d * -2.0 + (v1 + v0);
        Self {
            coeff: Matrix3x4::from_columns(&[p0.coords, *v0, c2, c3]),
        }
    }

    /// Returns the coefficient matrix.
    #[must_use]
    pub fn coefficients(&self) -> &Matrix3x4<f64> {
        &self.coeff
    }

    /// Evaluates the curve at parameter `t`.
    #[must_use]
    pub fn evaluate(&self, t: f64) -> Point3 {
        let basis = Vector4::new(1.0, t, t * t, t * t * t);
        Point3::from(self.coeff * basis)
    }

    /// Upper bound on the distance of any point of the curve (for
    /// `t ∈ [0, 1]`) from its start point.
    ///
    /// Computed as the norm of `|C| · [0, 1, 1, 1]ᵀ`.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        let extents = self.coeff.abs() * Vector4::new(0.0, 1.0, 1.0, 1.0);
        extents.norm()
    }
}
