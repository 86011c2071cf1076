use super::node::BoneNode;
use crate::math::{BoneTransform, Mat4, Quat};

/// Precomputed rest-pose forward kinematics for one skeleton.
///
/// Bones are stored in topological order, so a single forward pass fills every
/// entry: each bone only reads its parent, which is already computed.
#[derive(Debug, Clone, PartialEq)]
pub struct RestPoseCache {
    /// Local-to-root matrix of each bone (includes the bone's own TRS)
    local_to_root: Vec<Mat4>,
    /// Local-to-root rotation of each bone
    rotations: Vec<Quat>,
}

impl RestPoseCache {
    /// Run forward kinematics over `bones` using the transform picked by `select`
    pub fn build(bones: &[BoneNode], select: impl Fn(&BoneNode) -> &BoneTransform) -> Self {
        let mut local_to_root = Vec::with_capacity(bones.len());
        let mut rotations: Vec<Quat> = Vec::with_capacity(bones.len());

        for bone in bones {
            let local = select(bone);
            let (parent_matrix, parent_rotation) = match bone.parent {
                Some(parent) => (local_to_root[parent], rotations[parent]),
                None => (Mat4::IDENTITY, Quat::IDENTITY),
            };
            local_to_root.push(parent_matrix * local.to_mat4());
            rotations.push((parent_rotation * local.rotation).normalize());
        }

        Self {
            local_to_root,
            rotations,
        }
    }

    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty()
    }

    #[inline]
    pub fn matrix(&self, index: usize) -> Mat4 {
        self.local_to_root[index]
    }

    #[inline]
    pub fn rotation(&self, index: usize) -> Quat {
        self.rotations[index]
    }

    /// Local-to-root rotation of the parent (identity for the root)
    pub fn parent_rotation(&self, bones: &[BoneNode], index: usize) -> Quat {
        bones[index]
            .parent
            .map_or(Quat::IDENTITY, |parent| self.rotations[parent])
    }
}
