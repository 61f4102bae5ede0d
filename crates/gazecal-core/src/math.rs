//! Mathematical type definitions and small helpers.
//!
//! All gaze coordinates are normalized screen coordinates in `[0,1]×[0,1]`
//! with the origin at the bottom-left corner and y increasing upward.

use nalgebra::{Matrix3, Point2, Vector2, Vector3};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 2D vector with [`Real`] components.
pub type Vec2 = Vector2<Real>;
/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 2D point with [`Real`] coordinates.
pub type Pt2 = Point2<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;

/// Convert a 2D point into homogeneous coordinates `(x, y, 1)`.
pub fn to_homogeneous(p: &Pt2) -> Vec3 {
    Vec3::new(p.x, p.y, 1.0)
}

/// Convert a homogeneous vector `(x, y, w)` back to a 2D point `(x/w, y/w)`.
///
/// The caller is responsible for ensuring that `w != 0`.
pub fn from_homogeneous(v: &Vec3) -> Pt2 {
    Pt2::new(v.x / v.z, v.y / v.z)
}

/// Population standard deviation of a sample set.
///
/// Returns `0.0` for an empty slice.
pub fn std_dev(values: &[Real]) -> Real {
    variance(values).sqrt()
}

/// Population variance of a sample set.
///
/// Returns `0.0` for an empty slice.
pub fn variance(values: &[Real]) -> Real {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as Real;
    let mean = values.iter().sum::<Real>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<Real>() / n
}
