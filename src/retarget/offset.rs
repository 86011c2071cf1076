use super::correspondence::BonePair;
use crate::config::{CompilerConfig, RestSource};
use crate::math::{Mat4, MirrorAxis, Quat, QuatExt, Vec3};
use crate::skeleton::Skeleton;

/// Correction applied when a source channel is replayed on a destination bone:
/// `rotation' = pre * rotation * post`, `translation' = pre * (translation * scale)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneOffset {
    pub pre_rotation: Quat,
    pub post_rotation: Quat,
    pub scale: f32,
}

impl Default for BoneOffset {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl BoneOffset {
    pub const IDENTITY: Self = Self {
        pre_rotation: Quat::IDENTITY,
        post_rotation: Quat::IDENTITY,
        scale: 1.0,
    };

    /// Whether both rotations are the identity
    pub fn is_rotation_identity(&self, tolerance: f32) -> bool {
        self.pre_rotation.is_identity_within(tolerance)
            && self.post_rotation.is_identity_within(tolerance)
    }

    /// Whether the offset changes nothing, scale included
    pub fn is_identity(&self, tolerance: f32) -> bool {
        self.is_rotation_identity(tolerance) && (self.scale - 1.0).abs() <= tolerance
    }

    #[inline]
    pub fn apply_rotation(&self, rotation: Quat) -> Quat {
        (self.pre_rotation * rotation * self.post_rotation).normalize()
    }

    #[inline]
    pub fn apply_translation(&self, translation: Vec3) -> Vec3 {
        self.pre_rotation * (translation * self.scale)
    }
}

/// Computes per-pair corrections from the two skeletons' rest poses.
pub struct OffsetCalculator<'a> {
    source: &'a Skeleton,
    destination: &'a Skeleton,
    /// Half turn about the mirror axis, identity when not mirroring
    mirror: Quat,
    rest: RestSource,
    scale_epsilon: f32,
}

impl<'a> OffsetCalculator<'a> {
    pub fn new(
        source: &'a Skeleton,
        destination: &'a Skeleton,
        mirror: bool,
        config: &CompilerConfig,
    ) -> Self {
        let axis = if mirror {
            config.mirror_axis
        } else {
            MirrorAxis::None
        };
        Self {
            source,
            destination,
            mirror: axis.half_turn(),
            rest: config.rest_source,
            scale_epsilon: config.scale_epsilon,
        }
    }

    pub fn compute(&self, pair: BonePair) -> BoneOffset {
        let source_rest = self.source.rest(self.rest);
        let destination_rest = self.destination.rest(self.rest);

        let source_parent =
            self.mirror * source_rest.parent_rotation(self.source.bones(), pair.source);
        let destination_parent =
            destination_rest.parent_rotation(self.destination.bones(), pair.destination);
        let pre_rotation = (destination_parent.inverse() * source_parent).normalize();

        // Local-to-root matrices, source side mirrored
        let source_matrix = Mat4::from_quat(self.mirror) * source_rest.matrix(pair.source);
        let destination_matrix = destination_rest.matrix(pair.destination);

        let source_rotation = (self.mirror * source_rest.rotation(pair.source)).normalize();
        let (_, destination_rotation, _) = destination_matrix.to_scale_rotation_translation();
        let post_rotation = (source_rotation.inverse() * destination_rotation).normalize();

        // One-axis proxy for limb scale: ratio of local-to-root heights
        let source_y = source_matrix.w_axis.y;
        let destination_y = destination_matrix.w_axis.y;
        let scale = if source_y.abs() > self.scale_epsilon {
            destination_y / source_y
        } else {
            1.0
        };

        BoneOffset {
            pre_rotation,
            post_rotation,
            scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retarget::correspondence::MatchKind;
    use crate::test_support::skeleton_with;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn pair(source: usize, destination: usize) -> BonePair {
        BonePair {
            source,
            destination,
            kind: MatchKind::Name,
        }
    }

    #[test]
    fn test_identical_skeletons_give_identity() {
        let s = skeleton_with(
            "s",
            &[
                ("Root", Vec3::ZERO, Quat::IDENTITY),
                ("Root/Hips", Vec3::new(0.0, 1.0, 0.0), Quat::from_rotation_y(0.3)),
                ("Root/Hips/Spine", Vec3::new(0.0, 0.2, 0.0), Quat::from_rotation_x(0.2)),
            ],
        );
        let calc = OffsetCalculator::new(&s, &s, false, &CompilerConfig::default());
        for i in 0..3 {
            let offset = calc.compute(pair(i, i));
            assert!(offset.is_identity(1e-5), "bone {i}: {offset:?}");
        }
    }

    #[test]
    fn test_offset_reproduces_destination_rest() {
        let s = skeleton_with(
            "s",
            &[
                ("Root", Vec3::ZERO, Quat::IDENTITY),
                ("Root/Hips", Vec3::new(0.0, 1.0, 0.0), Quat::from_rotation_z(0.4)),
                ("Root/Hips/Arm", Vec3::new(0.3, 0.2, 0.0), Quat::from_rotation_y(-0.7)),
            ],
        );
        let d = skeleton_with(
            "d",
            &[
                ("Root", Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_2)),
                ("Root/Hips", Vec3::new(0.0, 0.8, 0.0), Quat::IDENTITY),
                ("Root/Hips/Arm", Vec3::new(0.2, 0.1, 0.0), Quat::from_rotation_x(1.1)),
            ],
        );

        for mirror in [false, true] {
            let calc = OffsetCalculator::new(&s, &d, mirror, &CompilerConfig::default());
            for i in 0..3 {
                let offset = calc.compute(pair(i, i));
                let replayed = offset.apply_rotation(s.bones()[i].pose.rotation);
                assert!(
                    replayed.same_rotation(d.bones()[i].pose.rotation, 1e-4),
                    "mirror={mirror} bone {i}: {replayed:?}"
                );
            }
        }
    }

    #[test]
    fn test_root_rotation_difference_shows_in_post() {
        let s = skeleton_with("s", &[("Root", Vec3::ZERO, Quat::IDENTITY)]);
        let d = skeleton_with("d", &[("Root", Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_2))]);
        let offset = OffsetCalculator::new(&s, &d, false, &CompilerConfig::default())
            .compute(BonePair::ROOT);
        assert!(offset.pre_rotation.is_identity_within(1e-6));
        assert!(!offset.post_rotation.is_identity_within(1e-3));
    }

    #[test]
    fn test_scale_is_height_ratio() {
        let s = skeleton_with("s", &[("Root", Vec3::new(0.0, 2.0, 0.0), Quat::IDENTITY)]);
        let d = skeleton_with("d", &[("Root", Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY)]);
        let config = CompilerConfig::default();
        let offset = OffsetCalculator::new(&s, &d, false, &config).compute(BonePair::ROOT);
        assert_relative_eq!(offset.scale, 0.5);
        assert_relative_eq!(
            offset.apply_translation(Vec3::new(0.0, 2.0, 0.0)).y,
            1.0,
            epsilon = 1e-6
        );

        // Source at ground level: no usable ratio
        let flat = skeleton_with("flat", &[("Root", Vec3::ZERO, Quat::IDENTITY)]);
        let offset = OffsetCalculator::new(&flat, &d, false, &config).compute(BonePair::ROOT);
        assert_eq!(offset.scale, 1.0);
    }

    #[test]
    fn test_mirrored_scale_reads_mirrored_source_height() {
        let s = skeleton_with("s", &[("Root", Vec3::new(0.0, 2.0, 0.0), Quat::IDENTITY)]);
        let d = skeleton_with("d", &[("Root", Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY)]);

        // A half turn about X or Z flips the source height
        for axis in [MirrorAxis::X, MirrorAxis::Z] {
            let config = CompilerConfig {
                mirror_axis: axis,
                ..CompilerConfig::default()
            };
            let offset = OffsetCalculator::new(&s, &d, true, &config).compute(BonePair::ROOT);
            assert_relative_eq!(offset.scale, -0.5, epsilon = 1e-6);
        }

        // About Y the height survives, as it does with no mirror at all
        let unflipped = [
            (true, MirrorAxis::Y),
            (true, MirrorAxis::None),
            (false, MirrorAxis::X),
        ];
        for (mirror, axis) in unflipped {
            let config = CompilerConfig {
                mirror_axis: axis,
                ..CompilerConfig::default()
            };
            let offset = OffsetCalculator::new(&s, &d, mirror, &config).compute(BonePair::ROOT);
            assert_relative_eq!(offset.scale, 0.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_mirror_puts_half_turn_in_pre_rotation() {
        let s = skeleton_with("s", &[("Root", Vec3::ZERO, Quat::IDENTITY)]);
        let offset = OffsetCalculator::new(&s, &s, true, &CompilerConfig::default())
            .compute(BonePair::ROOT);
        assert!(offset
            .pre_rotation
            .same_rotation(MirrorAxis::X.half_turn(), 1e-6));
        assert!(!offset.is_rotation_identity(1e-5));
    }
}
