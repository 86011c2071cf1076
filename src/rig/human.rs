use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::skeleton::Skeleton;

/// Number of canonical humanoid bones
pub const HUMAN_BONE_COUNT: usize = 55;

/// Canonical humanoid bone names, in canonical order (hips and legs first,
/// then spine, head, arms and fingers).
pub const HUMAN_BONE_NAMES: [&str; HUMAN_BONE_COUNT] = [
    "Hips",
    "LeftUpperLeg",
    "RightUpperLeg",
    "LeftLowerLeg",
    "RightLowerLeg",
    "LeftFoot",
    "RightFoot",
    "Spine",
    "Chest",
    "Neck",
    "Head",
    "LeftShoulder",
    "RightShoulder",
    "LeftUpperArm",
    "RightUpperArm",
    "LeftLowerArm",
    "RightLowerArm",
    "LeftHand",
    "RightHand",
    "LeftToes",
    "RightToes",
    "LeftEye",
    "RightEye",
    "Jaw",
    "LeftThumbProximal",
    "LeftThumbIntermediate",
    "LeftThumbDistal",
    "LeftIndexProximal",
    "LeftIndexIntermediate",
    "LeftIndexDistal",
    "LeftMiddleProximal",
    "LeftMiddleIntermediate",
    "LeftMiddleDistal",
    "LeftRingProximal",
    "LeftRingIntermediate",
    "LeftRingDistal",
    "LeftLittleProximal",
    "LeftLittleIntermediate",
    "LeftLittleDistal",
    "RightThumbProximal",
    "RightThumbIntermediate",
    "RightThumbDistal",
    "RightIndexProximal",
    "RightIndexIntermediate",
    "RightIndexDistal",
    "RightMiddleProximal",
    "RightMiddleIntermediate",
    "RightMiddleDistal",
    "RightRingProximal",
    "RightRingIntermediate",
    "RightRingDistal",
    "RightLittleProximal",
    "RightLittleIntermediate",
    "RightLittleDistal",
    "UpperChest",
];

/// Canonical humanoid name -> literal bone name (leaf name or full path) of
/// one specific skeleton.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HumanCorrespondence {
    entries: BTreeMap<String, String>,
}

impl HumanCorrespondence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, canonical: &str, literal: &str) -> Self {
        self.insert(canonical, literal);
        self
    }

    pub fn insert(&mut self, canonical: &str, literal: &str) {
        self.entries
            .insert(canonical.to_string(), literal.to_string());
    }

    /// Literal bone name for a canonical name
    pub fn literal(&self, canonical: &str) -> Option<&str> {
        self.entries.get(canonical).map(String::as_str)
    }

    /// Canonical name the bone at `index` of `skeleton` is mapped from
    pub fn canonical_for(&self, skeleton: &Skeleton, index: usize) -> Option<&str> {
        // A literal names the bone `resolve` sends it to, not every leaf twin
        self.entries
            .iter()
            .find(|(_, literal)| skeleton.resolve(literal.as_str()) == Some(index))
            .map(|(canonical, _)| canonical.as_str())
    }

    /// Bone index in `skeleton` for a canonical name
    pub fn resolve(&self, skeleton: &Skeleton, canonical: &str) -> Option<usize> {
        self.literal(canonical)
            .and_then(|literal| skeleton.resolve(literal))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
