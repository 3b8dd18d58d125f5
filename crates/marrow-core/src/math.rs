//! Interpolation helpers shared by keyframe sampling and pose blending.

use glam::{Mat4, Quat, Vec3};

/// A value that can be sampled between two keyframes.
pub trait Interpolate: Copy {
    /// Blend from `a` (t = 0) to `b` (t = 1).
    fn interpolate(a: Self, b: Self, t: f32) -> Self;
}

impl Interpolate for Vec3 {
    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }
}

impl Interpolate for Quat {
    /// Spherical interpolation. Inputs are expected to be unit quaternions.
    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        a.slerp(b, t)
    }
}

/// Element-wise linear interpolation of two matrices.
///
/// This is not a rigid-body blend: for large rotation deltas the result is no
/// longer orthonormal. Pose cross-fades use it because it is cheap.
pub fn lerp_mat4(a: &Mat4, b: &Mat4, t: f32) -> Mat4 {
    *a + (*b - *a) * t
}
