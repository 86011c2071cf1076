use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::Rig;
use crate::error::CompileError;

/// Stable index of a rig inside a [`RigCatalog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RigIndex(pub u32);

impl RigIndex {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RigIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry of the rigs taking part in one build.
///
/// Registration deduplicates structurally equal rigs, so every distinct
/// skeleton/humanoid pair gets exactly one index.
#[derive(Debug, Default)]
pub struct RigCatalog {
    rigs: Vec<Rig>,
    by_hash: HashMap<u64, Vec<RigIndex>>,
}

impl RigCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rig, or return the index of a structurally equal one
    pub fn register(&mut self, rig: Rig) -> RigIndex {
        let hash = rig.content_hash();
        if let Some(existing) = self
            .by_hash
            .get(&hash)
            .and_then(|bucket| bucket.iter().find(|i| self.rigs[i.index()] == rig))
        {
            log::debug!("Rig '{}' deduplicated onto rig {}", rig.id, existing);
            return *existing;
        }

        let index = RigIndex(self.rigs.len() as u32);
        log::debug!(
            "Registered rig '{}' as {} ({} bones)",
            rig.id,
            index,
            rig.skeleton.len()
        );
        self.rigs.push(rig);
        self.by_hash.entry(hash).or_default().push(index);
        index
    }

    pub fn get(&self, index: RigIndex) -> Result<&Rig, CompileError> {
        self.rigs
            .get(index.index())
            .ok_or(CompileError::MissingRig(index))
    }

    pub fn contains(&self, index: RigIndex) -> bool {
        index.index() < self.rigs.len()
    }

    pub fn len(&self) -> usize {
        self.rigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rigs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RigIndex, &Rig)> {
        self.rigs
            .iter()
            .enumerate()
            .map(|(i, rig)| (RigIndex(i as u32), rig))
    }
}
