use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::human::HumanCorrespondence;
use crate::error::CompileError;
use crate::math::BoneTransform;
use crate::skeleton::{Skeleton, SkeletonJson};

/// A skeleton plus its optional humanoid correspondence table.
///
/// Equality is structural: two rigs with the same bones and the same humanoid
/// table are the same rig, whatever their ids.
#[derive(Debug, Clone)]
pub struct Rig {
    pub id: String,
    pub skeleton: Skeleton,
    pub human: Option<HumanCorrespondence>,
}

impl PartialEq for Rig {
    fn eq(&self, other: &Self) -> bool {
        self.skeleton == other.skeleton && self.human == other.human
    }
}

impl Rig {
    pub fn new(id: impl Into<String>, skeleton: Skeleton) -> Self {
        Self {
            id: id.into(),
            skeleton,
            human: None,
        }
    }

    pub fn with_human(mut self, human: HumanCorrespondence) -> Self {
        self.human = Some(human);
        self
    }

    pub fn is_humanoid(&self) -> bool {
        self.human.as_ref().is_some_and(|h| !h.is_empty())
    }

    /// Bone index for a canonical humanoid name
    pub fn human_bone(&self, canonical: &str) -> Option<usize> {
        self.human
            .as_ref()
            .and_then(|h| h.resolve(&self.skeleton, canonical))
    }

    /// Canonical humanoid name of the bone at `index`
    pub fn canonical_name(&self, index: usize) -> Option<&str> {
        self.human
            .as_ref()
            .and_then(|h| h.canonical_for(&self.skeleton, index))
    }

    /// Hash over bone paths, parents, transform bits and the humanoid table.
    ///
    /// Consistent with `PartialEq`: structurally equal rigs hash equal.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.skeleton.len().hash(&mut hasher);
        for bone in self.skeleton.bones() {
            bone.id.hash(&mut hasher);
            bone.parent.hash(&mut hasher);
            hash_transform(&bone.default, &mut hasher);
            hash_transform(&bone.pose, &mut hasher);
        }
        self.human.hash(&mut hasher);
        hasher.finish()
    }
}

fn hash_transform(t: &BoneTransform, hasher: &mut impl Hasher) {
    for v in t
        .translation
        .to_array()
        .iter()
        .chain(t.rotation.to_array().iter())
        .chain(t.scale.to_array().iter())
    {
        // -0.0 == 0.0 under PartialEq, so hash them alike
        let v = if *v == 0.0 { 0.0f32 } else { *v };
        v.to_bits().hash(hasher);
    }
}

/// Rig as authored in JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RigJson {
    pub id: String,
    pub skeleton: SkeletonJson,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human: Option<HumanCorrespondence>,
}

impl RigJson {
    pub fn to_rig(&self) -> Result<Rig, CompileError> {
        let mut skeleton = self.skeleton.clone();
        if skeleton.name.is_empty() {
            skeleton.name = self.id.clone();
        }
        Ok(Rig {
            id: self.id.clone(),
            skeleton: skeleton.to_skeleton()?,
            human: self.human.clone(),
        })
    }

    pub fn from_rig(rig: &Rig) -> Self {
        Self {
            id: rig.id.clone(),
            skeleton: rig.skeleton.to_json(),
            human: rig.human.clone(),
        }
    }
}
