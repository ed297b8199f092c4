use super::{Point3, Vector3};

/// A camera-space view volume used for conservative sphere culling.
///
/// The camera looks down the negative Z axis, so `near_z` and `far_z` are
/// both negative with `far_z < near_z`. The four side planes pass through the
/// origin; their normals point into the view volume (top, bottom, left, right).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    near_z: f64,
    far_z: f64,
    plane_normals: [Vector3; 4],
}

impl Frustum {
    /// Creates a new frustum from near/far depths and side-plane normals.
    #[must_use]
    pub fn new(near_z: f64, far_z: f64, plane_normals: [Vector3; 4]) -> Self {
        Self {
            near_z,
            far_z,
            plane_normals,
        }
    }

    /// Z coordinate of the near plane.
    #[must_use]
    pub fn near_z(&self) -> f64 {
        self.near_z
    }

    /// Z coordinate of the far plane.
    #[must_use]
    pub fn far_z(&self) -> f64 {
        self.far_z
    }

    /// Side-plane normals (top, bottom, left, right).
    #[must_use]
    pub fn plane_normals(&self) -> &[Vector3; 4] {
        &self.plane_normals
    }

    /// Returns `true` if the sphere lies entirely outside the view volume.
    ///
    /// The test is conservative: a sphere that touches the volume is never
    /// culled.
    #[must_use]
    pub fn cull_sphere(&self, center: &Point3, radius: f64) -> bool {
        center.z - radius > self.near_z
            || center.z + radius < self.far_z
            || self
                .plane_normals
                .iter()
                .any(|n| center.coords.dot(n) < -radius)
    }
}
