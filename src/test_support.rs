//! Skeleton and rig builders shared by unit tests.

use crate::math::{BoneTransform, Quat, Vec3};
use crate::rig::{HumanCorrespondence, Rig};
use crate::skeleton::{BoneNodeJson, Skeleton, PATH_SEPARATOR};

/// Skeleton from bone paths with per-bone translation and rotation.
/// Parents are found from the path prefix, so paths must be listed parents first.
pub fn skeleton_with(name: &str, bones: &[(&str, Vec3, Quat)]) -> Skeleton {
    let nodes: Vec<BoneNodeJson> = bones
        .iter()
        .map(|(path, translation, rotation)| {
            let parent = path
                .rsplit_once(PATH_SEPARATOR)
                .and_then(|(parent, _)| bones.iter().position(|(p, _, _)| *p == parent))
                .map_or(-1, |i| i as i32);
            BoneNodeJson {
                id: path.to_string(),
                parent,
                default: BoneTransform::new(*translation, *rotation, Vec3::ONE),
                pose: None,
            }
        })
        .collect();
    Skeleton::new(name, &nodes).expect("test skeleton must be valid")
}

/// Skeleton whose non-root bones sit one unit above their parent
pub fn skeleton(name: &str, paths: &[&str]) -> Skeleton {
    let bones: Vec<(&str, Vec3, Quat)> = paths
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let t = if i == 0 { Vec3::ZERO } else { Vec3::Y };
            (*p, t, Quat::IDENTITY)
        })
        .collect();
    skeleton_with(name, &bones)
}

pub fn human(entries: &[(&str, &str)]) -> HumanCorrespondence {
    entries
        .iter()
        .fold(HumanCorrespondence::new(), |h, (canonical, literal)| {
            h.with(canonical, literal)
        })
}

pub fn humanoid_rig(id: &str, paths: &[&str], entries: &[(&str, &str)]) -> Rig {
    Rig::new(id, skeleton(id, paths)).with_human(human(entries))
}
