use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::cache::RestPoseCache;
use crate::config::RestSource;
use crate::error::CompileError;
use crate::math::{BoneTransform, Quat};

/// Separator between the segments of a bone path
pub const PATH_SEPARATOR: char = '/';

/// Last segment of a hierarchical bone path (`"Root/Hips/Spine"` -> `"Spine"`)
pub fn leaf_name(path: &str) -> &str {
    path.rsplit(PATH_SEPARATOR).next().unwrap_or(path)
}

/// A validated bone: hierarchical id, parent link and both transform sets.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneNode {
    /// Hierarchical path, e.g. `Root/Hips/Spine`
    pub id: String,
    /// Parent bone (None for root)
    pub parent: Option<usize>,
    /// Default channel values
    pub default: BoneTransform,
    /// Rest pose used for retargeting
    pub pose: BoneTransform,
}

impl BoneNode {
    #[inline]
    pub fn name(&self) -> &str {
        leaf_name(&self.id)
    }

    /// Parent index in the authoring convention (-1 for the root)
    pub fn parent_index(&self) -> i32 {
        self.parent.map_or(-1, |p| p as i32)
    }

    pub fn transform(&self, source: RestSource) -> &BoneTransform {
        match source {
            RestSource::Pose => &self.pose,
            RestSource::Default => &self.default,
        }
    }
}

/// Bone as authored in JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoneNodeJson {
    pub id: String,
    #[serde(default = "root_parent")]
    pub parent: i32,
    #[serde(default)]
    pub default: BoneTransform,
    /// Rest pose; the default values are used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<BoneTransform>,
}

fn root_parent() -> i32 {
    -1
}

/// Skeleton as authored in JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SkeletonJson {
    #[serde(default)]
    pub name: String,
    pub bones: Vec<BoneNodeJson>,
}

impl SkeletonJson {
    /// Validate and convert to a [`Skeleton`]
    pub fn to_skeleton(&self) -> Result<Skeleton, CompileError> {
        Skeleton::new(self.name.clone(), &self.bones)
    }
}

/// Immutable bone hierarchy with precomputed rest-pose kinematics.
#[derive(Debug, Clone)]
pub struct Skeleton {
    name: String,
    bones: Vec<BoneNode>,
    by_path: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    pose_cache: RestPoseCache,
    default_cache: RestPoseCache,
}

impl PartialEq for Skeleton {
    // Structural: the name and lookup tables are derived or cosmetic
    fn eq(&self, other: &Self) -> bool {
        self.bones == other.bones
    }
}

impl Skeleton {
    /// Validate authored bones and build the skeleton.
    ///
    /// Bone 0 must be the root and every other bone's parent must precede it.
    /// Rotations are normalized; non-finite or zero-length values are rejected.
    pub fn new(name: impl Into<String>, nodes: &[BoneNodeJson]) -> Result<Self, CompileError> {
        let name = name.into();
        if nodes.is_empty() {
            return Err(CompileError::EmptySkeleton(name));
        }
        if nodes[0].parent != -1 {
            return Err(CompileError::MissingRoot(name));
        }

        let mut bones = Vec::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            let parent = if index == 0 {
                None
            } else if node.parent >= 0 && (node.parent as usize) < index {
                Some(node.parent as usize)
            } else {
                return Err(CompileError::InvalidParent {
                    skeleton: name,
                    bone: node.id.clone(),
                    index,
                    parent: node.parent,
                });
            };

            let default = sanitize(&name, &node.id, node.default)?;
            let pose = match node.pose {
                Some(pose) => sanitize(&name, &node.id, pose)?,
                None => default,
            };

            bones.push(BoneNode {
                id: node.id.clone(),
                parent,
                default,
                pose,
            });
        }

        Ok(Self::from_bones(name, bones))
    }

    fn from_bones(name: String, bones: Vec<BoneNode>) -> Self {
        let mut by_path = HashMap::with_capacity(bones.len());
        let mut by_name = HashMap::with_capacity(bones.len());
        for (index, bone) in bones.iter().enumerate() {
            by_path.entry(bone.id.clone()).or_insert(index);
            by_name.entry(bone.name().to_string()).or_insert(index);
        }
        let pose_cache = RestPoseCache::build(&bones, |b| &b.pose);
        let default_cache = RestPoseCache::build(&bones, |b| &b.default);

        Self {
            name,
            bones,
            by_path,
            by_name,
            pose_cache,
            default_cache,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bones(&self) -> &[BoneNode] {
        &self.bones
    }

    pub fn bone(&self, index: usize) -> Option<&BoneNode> {
        self.bones.get(index)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Always false: construction rejects empty skeletons
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn find_by_path(&self, path: &str) -> Option<usize> {
        self.by_path.get(path).copied()
    }

    /// First bone (in topological order) whose leaf name is `name`
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Resolve a reference that may be either a full path or a leaf name
    pub fn resolve(&self, reference: &str) -> Option<usize> {
        self.find_by_path(reference)
            .or_else(|| self.find_by_name(reference))
    }

    pub fn rest(&self, source: RestSource) -> &RestPoseCache {
        match source {
            RestSource::Pose => &self.pose_cache,
            RestSource::Default => &self.default_cache,
        }
    }

    /// Authoring form of this skeleton
    pub fn to_json(&self) -> SkeletonJson {
        SkeletonJson {
            name: self.name.clone(),
            bones: self
                .bones
                .iter()
                .map(|b| BoneNodeJson {
                    id: b.id.clone(),
                    parent: b.parent_index(),
                    default: b.default,
                    pose: (b.pose != b.default).then_some(b.pose),
                })
                .collect(),
        }
    }
}

fn sanitize(
    skeleton: &str,
    bone: &str,
    transform: BoneTransform,
) -> Result<BoneTransform, CompileError> {
    let degenerate = |field| CompileError::DegenerateTransform {
        skeleton: skeleton.to_string(),
        bone: bone.to_string(),
        field,
    };

    if !transform.translation.is_finite() {
        return Err(degenerate("translation"));
    }
    if !transform.scale.is_finite() {
        return Err(degenerate("scale"));
    }
    if !transform.rotation.is_finite() || transform.rotation.length_squared() < 1e-12 {
        return Err(degenerate("rotation"));
    }

    Ok(BoneTransform {
        rotation: normalize(transform.rotation),
        ..transform
    })
}

fn normalize(q: Quat) -> Quat {
    if (q.length_squared() - 1.0).abs() < 1e-6 {
        q
    } else {
        q.normalize()
    }
}
