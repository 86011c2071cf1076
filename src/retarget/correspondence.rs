use std::borrow::Cow;

use serde::Serialize;

use super::mirror::mirror_name;
use crate::config::CompilerConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::rig::Rig;

/// How a destination bone found its source bone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchKind {
    /// The two roots, always paired
    Root,
    /// Through both rigs' humanoid tables
    Human,
    /// Equal (possibly mirrored) leaf names
    Name,
    /// Nothing matched; the bone replays the source bone with its own index
    Identity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BonePair {
    pub source: usize,
    pub destination: usize,
    pub kind: MatchKind,
}

impl BonePair {
    pub const ROOT: BonePair = BonePair {
        source: 0,
        destination: 0,
        kind: MatchKind::Root,
    };

    #[inline]
    pub fn is_root(&self) -> bool {
        self.destination == 0
    }
}

/// Finds, for each destination bone, the source bone it replays.
pub struct CorrespondenceResolver<'a> {
    source: &'a Rig,
    destination: &'a Rig,
    mirror: bool,
    identity_fallback: bool,
}

impl<'a> CorrespondenceResolver<'a> {
    pub fn new(source: &'a Rig, destination: &'a Rig, mirror: bool, config: &CompilerConfig) -> Self {
        Self {
            source,
            destination,
            mirror,
            identity_fallback: config.identity_fallback,
        }
    }

    /// Match a single destination bone.
    ///
    /// Tries the humanoid tables, then leaf names, then the identity fallback.
    /// None when the index is out of range or nothing, fallback included, applies.
    pub fn resolve(&self, destination: usize) -> Option<BonePair> {
        if destination >= self.destination.skeleton.len() {
            return None;
        }
        if destination == 0 {
            return Some(BonePair::ROOT);
        }

        let matched = self
            .resolve_human(destination)
            .map(|source| (source, MatchKind::Human))
            .or_else(|| {
                self.resolve_name(destination)
                    .map(|source| (source, MatchKind::Name))
            })
            .or_else(|| {
                (self.identity_fallback && destination < self.source.skeleton.len())
                    .then_some((destination, MatchKind::Identity))
            });

        matched.map(|(source, kind)| BonePair {
            source,
            destination,
            kind,
        })
    }

    fn resolve_human(&self, destination: usize) -> Option<usize> {
        let source_human = self.source.human.as_ref()?;
        let canonical = self.destination.canonical_name(destination)?;
        let canonical = self.mirrored(canonical);
        source_human.resolve(&self.source.skeleton, &canonical)
    }

    fn resolve_name(&self, destination: usize) -> Option<usize> {
        let name = self.destination.skeleton.bone(destination)?.name();
        self.source.skeleton.find_by_name(&self.mirrored(name))
    }

    fn mirrored<'n>(&self, name: &'n str) -> Cow<'n, str> {
        if self.mirror {
            mirror_name(name)
        } else {
            Cow::Borrowed(name)
        }
    }

    /// Resolve destination bones in `order`, keeping the first pair per
    /// destination index. Bones without any match and identity fallbacks are
    /// reported to `diagnostics`.
    pub fn resolve_all(
        &self,
        order: impl IntoIterator<Item = usize>,
        diagnostics: &mut Diagnostics,
    ) -> Vec<BonePair> {
        let mut covered = vec![false; self.destination.skeleton.len()];
        let mut pairs = Vec::with_capacity(covered.len());

        for destination in order {
            if covered.get(destination).copied().unwrap_or(true) {
                continue;
            }
            covered[destination] = true;

            match self.resolve(destination) {
                Some(pair) => {
                    if pair.kind == MatchKind::Identity {
                        diagnostics.warn(
                            DiagnosticKind::MissingBoneCorrespondence,
                            format!(
                                "{} -> {}: no match for '{}', replaying source bone {} by index",
                                self.source.id,
                                self.destination.id,
                                self.bone_id(destination),
                                destination
                            ),
                        );
                    } else {
                        log::debug!(
                            "{} -> {}: '{}' <- '{}' ({:?})",
                            self.source.id,
                            self.destination.id,
                            self.bone_id(destination),
                            self.source
                                .skeleton
                                .bone(pair.source)
                                .map_or("?", |b| b.id.as_str()),
                            pair.kind
                        );
                    }
                    pairs.push(pair);
                }
                None => diagnostics.warn(
                    DiagnosticKind::MissingBoneCorrespondence,
                    format!(
                        "{} -> {}: no source bone for '{}', it keeps its bind pose",
                        self.source.id,
                        self.destination.id,
                        self.bone_id(destination)
                    ),
                ),
            }
        }

        pairs
    }

    fn bone_id(&self, destination: usize) -> &str {
        self.destination
            .skeleton
            .bone(destination)
            .map_or("?", |b| b.id.as_str())
    }
}
