pub mod frustum;
pub mod hermite;

pub use frustum::Frustum;
pub use hermite::HermiteCubic;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Homogeneous 4-vector type.
pub type Vector4 = nalgebra::Vector4<f64>;

/// Affine camera transformation.
pub type Affine3 = nalgebra::Affine3<f64>;

/// RGBA color in single precision, as consumed by the graphics device.
pub type Color = nalgebra::Vector4<f32>;
