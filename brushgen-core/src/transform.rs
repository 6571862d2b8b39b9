//! Rotation matrix builders and point transforms
//!
//! Matrices follow the row-vector convention of the map tooling: a point
//! `v` rotated about `pivot` becomes `(v - pivot) · R + pivot`.

use nalgebra::{Matrix2, Matrix3, Point3};

/// Rotation about the X axis by `theta` radians
#[rustfmt::skip]
pub fn rotation_x(theta: f64) -> Matrix3<f64> {
    let (s, c) = theta.sin_cos();
    Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, c, s,
        0.0, -s, c,
    )
}

/// Rotation about the Y axis by `theta` radians
#[rustfmt::skip]
pub fn rotation_y(theta: f64) -> Matrix3<f64> {
    let (s, c) = theta.sin_cos();
    Matrix3::new(
        c, 0.0, s,
        0.0, 1.0, 0.0,
        -s, 0.0, c,
    )
}

/// Rotation about the Z axis by `theta` radians
#[rustfmt::skip]
pub fn rotation_z(theta: f64) -> Matrix3<f64> {
    let (s, c) = theta.sin_cos();
    Matrix3::new(
        c, s, 0.0,
        -s, c, 0.0,
        0.0, 0.0, 1.0,
    )
}

/// 2D texture rotation for an angle given in degrees
pub fn uv_rotation(angle_degrees: f64) -> Matrix2<f64> {
    let (s, c) = angle_degrees.to_radians().sin_cos();
    Matrix2::new(c, s, -s, c)
}

/// Rotate `point` about `pivot`, treating `point - pivot` as a row vector
pub fn rotate_point(
    point: &Point3<f64>,
    pivot: &Point3<f64>,
    rotation: &Matrix3<f64>,
) -> Point3<f64> {
    pivot + rotation.transpose() * (point - pivot)
}
