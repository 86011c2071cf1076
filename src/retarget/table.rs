use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::correspondence::BonePair;
use super::offset::BoneOffset;
use crate::math::Quat;

/// Source -> destination bone pairing with an optional offset reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelMap {
    pub source: u32,
    pub destination: u32,
    /// Index into the table's offset list, or [`ChannelMap::NO_OFFSET`]
    pub offset_index: i32,
}

impl ChannelMap {
    /// Direct copy, no correction
    pub const NO_OFFSET: i32 = -1;

    #[inline]
    pub fn has_offset(&self) -> bool {
        self.offset_index != Self::NO_OFFSET
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TranslationOffset {
    pub scale: f32,
    pub rotation: Quat,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationOffset {
    pub pre_rotation: Quat,
    pub post_rotation: Quat,
}

/// Compiled channel mapping from one rig onto another.
///
/// Only the root carries a translation channel; every other matched bone
/// carries a rotation channel. Offsets that change nothing are not stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemapTable {
    pub translation_channels: Vec<ChannelMap>,
    pub rotation_channels: Vec<ChannelMap>,
    pub translation_offsets: Vec<TranslationOffset>,
    pub rotation_offsets: Vec<RotationOffset>,
}

impl RemapTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the channels for one matched pair.
    pub fn push(&mut self, pair: BonePair, offset: BoneOffset, tolerance: f32) {
        let source = pair.source as u32;
        let destination = pair.destination as u32;

        if pair.is_root() {
            let (translation_index, rotation_index) = if offset.is_identity(tolerance) {
                (ChannelMap::NO_OFFSET, ChannelMap::NO_OFFSET)
            } else {
                self.translation_offsets.push(TranslationOffset {
                    scale: offset.scale,
                    rotation: offset.pre_rotation,
                });
                self.rotation_offsets.push(RotationOffset {
                    pre_rotation: offset.pre_rotation,
                    post_rotation: offset.post_rotation,
                });
                (
                    (self.translation_offsets.len() - 1) as i32,
                    (self.rotation_offsets.len() - 1) as i32,
                )
            };
            self.translation_channels.push(ChannelMap {
                source,
                destination,
                offset_index: translation_index,
            });
            self.rotation_channels.push(ChannelMap {
                source,
                destination,
                offset_index: rotation_index,
            });
            return;
        }

        let offset_index = if offset.is_rotation_identity(tolerance) {
            ChannelMap::NO_OFFSET
        } else {
            self.rotation_offsets.push(RotationOffset {
                pre_rotation: offset.pre_rotation,
                post_rotation: offset.post_rotation,
            });
            (self.rotation_offsets.len() - 1) as i32
        };
        self.rotation_channels.push(ChannelMap {
            source,
            destination,
            offset_index,
        });
    }

    pub fn rotation_channel(&self, destination: u32) -> Option<&ChannelMap> {
        self.rotation_channels
            .iter()
            .find(|c| c.destination == destination)
    }

    pub fn translation_channel(&self, destination: u32) -> Option<&ChannelMap> {
        self.translation_channels
            .iter()
            .find(|c| c.destination == destination)
    }

    /// Offset referenced by a rotation channel
    pub fn rotation_offset(&self, channel: &ChannelMap) -> Option<&RotationOffset> {
        usize::try_from(channel.offset_index)
            .ok()
            .and_then(|i| self.rotation_offsets.get(i))
    }

    /// Offset referenced by a translation channel
    pub fn translation_offset(&self, channel: &ChannelMap) -> Option<&TranslationOffset> {
        usize::try_from(channel.offset_index)
            .ok()
            .and_then(|i| self.translation_offsets.get(i))
    }

    /// Destination local rotation for a source local rotation on `channel`
    pub fn remap_rotation(&self, channel: &ChannelMap, rotation: Quat) -> Quat {
        match self.rotation_offset(channel) {
            Some(offset) => (offset.pre_rotation * rotation * offset.post_rotation).normalize(),
            None => rotation,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.translation_channels.len() + self.rotation_channels.len()
    }

    /// Hash over every channel and the exact bits of every offset
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.translation_channels.hash(&mut hasher);
        self.rotation_channels.hash(&mut hasher);
        for offset in &self.translation_offsets {
            offset.scale.to_bits().hash(&mut hasher);
            hash_quat(offset.rotation, &mut hasher);
        }
        for offset in &self.rotation_offsets {
            hash_quat(offset.pre_rotation, &mut hasher);
            hash_quat(offset.post_rotation, &mut hasher);
        }
        hasher.finish()
    }
}

fn hash_quat(q: Quat, hasher: &mut impl Hasher) {
    for v in q.to_array() {
        v.to_bits().hash(hasher);
    }
}
