use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Body regions a mask can switch on or off as a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BodyRegion {
    Root,
    Body,
    Head,
    LeftLeg,
    RightLeg,
    LeftArm,
    RightArm,
    LeftFingers,
    RightFingers,
}

impl BodyRegion {
    pub const COUNT: usize = 9;

    pub const ALL: [BodyRegion; Self::COUNT] = [
        BodyRegion::Root,
        BodyRegion::Body,
        BodyRegion::Head,
        BodyRegion::LeftLeg,
        BodyRegion::RightLeg,
        BodyRegion::LeftArm,
        BodyRegion::RightArm,
        BodyRegion::LeftFingers,
        BodyRegion::RightFingers,
    ];

    /// Canonical humanoid bones covered by this region.
    ///
    /// `Root` has none: it stands for the skeleton's bone 0.
    pub const fn canonical_bones(self) -> &'static [&'static str] {
        match self {
            BodyRegion::Root => &[],
            BodyRegion::Body => &["Hips", "Spine", "Chest", "UpperChest"],
            BodyRegion::Head => &["Neck", "Head", "LeftEye", "RightEye", "Jaw"],
            BodyRegion::LeftLeg => &["LeftUpperLeg", "LeftLowerLeg", "LeftFoot", "LeftToes"],
            BodyRegion::RightLeg => &["RightUpperLeg", "RightLowerLeg", "RightFoot", "RightToes"],
            BodyRegion::LeftArm => &["LeftShoulder", "LeftUpperArm", "LeftLowerArm", "LeftHand"],
            BodyRegion::RightArm => &[
                "RightShoulder",
                "RightUpperArm",
                "RightLowerArm",
                "RightHand",
            ],
            BodyRegion::LeftFingers => &[
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
            ],
            BodyRegion::RightFingers => &[
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
            ],
        }
    }
}

/// One individually flagged bone path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformToggle {
    pub path: String,
    #[serde(default = "active")]
    pub active: bool,
}

fn active() -> bool {
    true
}

/// Authored region-mask asset.
///
/// Regions missing from `regions` count as active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionMaskDesc {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub regions: BTreeMap<BodyRegion, bool>,
    #[serde(default)]
    pub transforms: Vec<TransformToggle>,
}

impl RegionMaskDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_region(mut self, region: BodyRegion, active: bool) -> Self {
        self.regions.insert(region, active);
        self
    }

    pub fn with_transform(mut self, path: &str, active: bool) -> Self {
        self.transforms.push(TransformToggle {
            path: path.to_string(),
            active,
        });
        self
    }

    pub fn is_region_active(&self, region: BodyRegion) -> bool {
        self.regions.get(&region).copied().unwrap_or(true)
    }

    pub fn inactive_regions(&self) -> impl Iterator<Item = BodyRegion> + '_ {
        BodyRegion::ALL
            .into_iter()
            .filter(|r| !self.is_region_active(*r))
    }
}
