use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::region::{BodyRegion, RegionMaskDesc};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::rig::Rig;

/// Weight of one included bone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelWeight {
    pub index: u32,
    pub weight: f32,
}

/// Sparse per-bone weights; bones that are absent have an implicit weight of 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightMask {
    pub translation_weights: Vec<ChannelWeight>,
    pub rotation_weights: Vec<ChannelWeight>,
    pub scale_weights: Vec<ChannelWeight>,
}

impl WeightMask {
    /// Mask including every index of `included` with full weight
    pub fn from_included(included: impl IntoIterator<Item = usize>) -> Self {
        let weights: Vec<ChannelWeight> = included
            .into_iter()
            .map(|index| ChannelWeight {
                index: index as u32,
                weight: 1.0,
            })
            .collect();
        Self {
            translation_weights: weights.clone(),
            rotation_weights: weights.clone(),
            scale_weights: weights,
        }
    }

    pub fn len(&self) -> usize {
        self.rotation_weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotation_weights.is_empty()
    }

    pub fn includes(&self, index: u32) -> bool {
        self.rotation_weights
            .binary_search_by_key(&index, |w| w.index)
            .is_ok()
    }
}

/// Turns a region-mask asset into a [`WeightMask`] for one rig.
pub struct RegionMaskCompiler<'a> {
    rig: &'a Rig,
}

impl<'a> RegionMaskCompiler<'a> {
    pub fn new(rig: &'a Rig) -> Self {
        Self { rig }
    }

    /// Indices switched off by inactive regions and inactive transform paths
    pub fn exclusion_set(
        &self,
        mask: &RegionMaskDesc,
        diagnostics: &mut Diagnostics,
    ) -> BTreeSet<usize> {
        let mut excluded = BTreeSet::new();

        for region in mask.inactive_regions() {
            if region == BodyRegion::Root {
                excluded.insert(0);
                continue;
            }
            if !self.rig.is_humanoid() {
                log::debug!(
                    "Mask '{}': rig '{}' has no humanoid table, region {:?} selects nothing",
                    mask.name,
                    self.rig.id,
                    region
                );
                continue;
            }
            excluded.extend(
                region
                    .canonical_bones()
                    .iter()
                    .filter_map(|name| self.rig.human_bone(name)),
            );
        }

        for toggle in mask.transforms.iter().filter(|t| !t.active) {
            match self.rig.skeleton.find_by_path(&toggle.path) {
                Some(index) => {
                    excluded.insert(index);
                }
                None => diagnostics.warn(
                    DiagnosticKind::UnresolvedMaskPath,
                    format!(
                        "Mask '{}': '{}' is not a bone of rig '{}'",
                        mask.name, toggle.path, self.rig.id
                    ),
                ),
            }
        }

        excluded
    }

    pub fn compile(&self, mask: &RegionMaskDesc, diagnostics: &mut Diagnostics) -> WeightMask {
        let excluded = self.exclusion_set(mask, diagnostics);
        let weights = WeightMask::from_included(
            (0..self.rig.skeleton.len()).filter(|i| !excluded.contains(i)),
        );
        log::debug!(
            "Mask '{}' on rig '{}': {} of {} bones included",
            mask.name,
            self.rig.id,
            weights.len(),
            self.rig.skeleton.len()
        );
        weights
    }
}
