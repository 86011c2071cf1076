//! Transform primitives on top of glam used by the retargeting compiler.

pub use glam::{Mat4, Quat, Vec3};

use serde::{Deserialize, Serialize};

/// Translation / rotation / scale triple for a single bone, in parent space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoneTransform {
    #[serde(default)]
    pub translation: Vec3,
    #[serde(default = "identity_rotation")]
    pub rotation: Quat,
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

fn identity_rotation() -> Quat {
    Quat::IDENTITY
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl BoneTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Affine matrix for this TRS (scale first, then rotation, then translation)
    #[inline]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Axis a mirrored clip is reflected through.
///
/// Mirroring is expressed as a 180 degree turn about the axis, applied on the
/// source side of an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MirrorAxis {
    None,
    #[default]
    X,
    Y,
    Z,
}

impl MirrorAxis {
    /// Half-turn quaternion about this axis (identity for `None`)
    pub const fn half_turn(self) -> Quat {
        match self {
            MirrorAxis::None => Quat::IDENTITY,
            MirrorAxis::X => Quat::from_xyzw(1.0, 0.0, 0.0, 0.0),
            MirrorAxis::Y => Quat::from_xyzw(0.0, 1.0, 0.0, 0.0),
            MirrorAxis::Z => Quat::from_xyzw(0.0, 0.0, 1.0, 0.0),
        }
    }
}

/// Tolerant comparisons for rotations produced by long transform chains.
pub trait QuatExt {
    /// Identity test that accepts both `q` and `-q`
    fn is_identity_within(&self, tolerance: f32) -> bool;

    /// Rotation equality that accepts both `q` and `-q`
    fn same_rotation(&self, other: Quat, tolerance: f32) -> bool;
}

impl QuatExt for Quat {
    fn is_identity_within(&self, tolerance: f32) -> bool {
        self.same_rotation(Quat::IDENTITY, tolerance)
    }

    fn same_rotation(&self, other: Quat, tolerance: f32) -> bool {
        self.abs_diff_eq(other, tolerance) || self.abs_diff_eq(-other, tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_half_turn_matches_axis_angle() {
        let x = Quat::from_rotation_x(PI);
        assert!(MirrorAxis::X.half_turn().same_rotation(x, 1e-6));
        let y = Quat::from_rotation_y(PI);
        assert!(MirrorAxis::Y.half_turn().same_rotation(y, 1e-6));
        let z = Quat::from_rotation_z(PI);
        assert!(MirrorAxis::Z.half_turn().same_rotation(z, 1e-6));
        assert_eq!(MirrorAxis::None.half_turn(), Quat::IDENTITY);
    }

    #[test]
    fn test_identity_accepts_double_cover() {
        assert!(Quat::IDENTITY.is_identity_within(1e-6));
        assert!((-Quat::IDENTITY).is_identity_within(1e-6));
        assert!(!Quat::from_rotation_y(0.1).is_identity_within(1e-6));
    }

    #[test]
    fn test_transform_matrix_round_trip() {
        let t = BoneTransform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_z(0.5),
            Vec3::splat(2.0),
        );
        let m = t.to_mat4();
        let (_, rotation, _) = m.to_scale_rotation_translation();
        assert!(rotation.same_rotation(t.rotation, 1e-5));
        assert!(m.w_axis.truncate().abs_diff_eq(t.translation, 1e-6));
    }

    #[test]
    fn test_transform_defaults_from_json() {
        let t: BoneTransform = serde_json::from_str(r#"{ "translation": [0, 1, 0] }"#).unwrap();
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.translation, Vec3::Y);
    }
}
