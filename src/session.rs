//! Compile session: turns a [`BuildManifest`] into a [`CompiledBuild`].
//!
//! Structural problems with rig data abort the build. Everything else (an
//! unknown index, an empty clip, a bone without a counterpart) becomes a
//! diagnostic and the build carries on without that entry.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::clip::{check_clip, CheckedClip};
use crate::config::CompilerConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::CompileError;
use crate::manifest::{BuildManifest, CharacterDesc, LayerDesc};
use crate::mask::{RegionMaskCompiler, RegionMaskDesc, WeightMask};
use crate::retarget::{RemapHandle, RemapKey, RemapTable, RemapTableBuilder};
use crate::rig::{RigCatalog, RigIndex};

// ============================================================================
// Output
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CompiledRig {
    pub id: String,
    /// Catalog slot; structurally equal rigs share one
    pub index: RigIndex,
    pub bone_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompiledRemap {
    pub key: RemapKey,
    pub table: RemapHandle,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompiledMask {
    /// Index into the manifest's mask list
    pub mask: u32,
    pub rig: RigIndex,
    pub weights: WeightMask,
}

/// Clip played by a layer, with the remap it needs on this character
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerClip {
    pub clip: u32,
    pub remap: Option<RemapKey>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompiledLayer {
    pub name: String,
    /// Index into [`CompiledBuild::masks`]
    pub mask: Option<usize>,
    pub clips: Vec<LayerClip>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompiledCharacter {
    pub name: String,
    pub rig: RigIndex,
    pub layers: Vec<CompiledLayer>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CompiledBuild {
    pub name: String,
    pub rigs: Vec<CompiledRig>,
    pub remaps: Vec<CompiledRemap>,
    pub tables: Vec<RemapTable>,
    pub masks: Vec<CompiledMask>,
    pub clips: Vec<CheckedClip>,
    pub characters: Vec<CompiledCharacter>,
    pub diagnostics: Diagnostics,
}

impl CompiledBuild {
    pub fn remap_table(&self, key: &RemapKey) -> Option<&RemapTable> {
        self.remaps
            .iter()
            .find(|r| r.key == *key)
            .and_then(|r| self.tables.get(r.table.index()))
    }

    pub fn character(&self, name: &str) -> Option<&CompiledCharacter> {
        self.characters.iter().find(|c| c.name == name)
    }
}

// ============================================================================
// Hooks
// ============================================================================

/// Observer notified as a session produces output.
///
/// Hooks run on the compiling thread, in registration order.
pub trait BuildHook: Send {
    /// A remap table was computed (memo hits do not fire)
    fn on_remap_table(&mut self, _key: &RemapKey, _table: &RemapTable) {}

    /// A weight mask was compiled for `rig`
    fn on_weight_mask(&mut self, _mask: &RegionMaskDesc, _rig: RigIndex, _weights: &WeightMask) {}

    fn on_build_finished(&mut self, _build: &CompiledBuild) {}
}

/// Logs a one-line summary of each finished build
#[derive(Debug, Default)]
pub struct LogSummary;

impl BuildHook for LogSummary {
    fn on_build_finished(&mut self, build: &CompiledBuild) {
        log::info!(
            "Build '{}': {} rigs, {} remaps ({} tables), {} masks, {} clips, {} characters, {} diagnostics",
            build.name,
            build.rigs.len(),
            build.remaps.len(),
            build.tables.len(),
            build.masks.len(),
            build.clips.len(),
            build.characters.len(),
            build.diagnostics.len()
        );
    }
}

// ============================================================================
// Session
// ============================================================================

/// Config for `manifest`: an explicit override wins over the manifest's own.
pub fn resolve_config(manifest: &BuildManifest, config: Option<&CompilerConfig>) -> CompilerConfig {
    config
        .cloned()
        .or_else(|| manifest.config.clone())
        .unwrap_or_default()
}

pub struct CompileSession {
    catalog: RigCatalog,
    builder: RemapTableBuilder,
    mask_memo: HashMap<(RegionMaskDesc, RigIndex), usize>,
    masks: Vec<CompiledMask>,
    diagnostics: Diagnostics,
    hooks: Vec<Box<dyn BuildHook>>,
}

impl CompileSession {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            catalog: RigCatalog::new(),
            builder: RemapTableBuilder::new(config),
            mask_memo: HashMap::new(),
            masks: Vec::new(),
            diagnostics: Diagnostics::new(),
            hooks: Vec::new(),
        }
    }

    pub fn add_hook(&mut self, hook: Box<dyn BuildHook>) {
        self.hooks.push(hook);
    }

    pub fn with_hook(mut self, hook: Box<dyn BuildHook>) -> Self {
        self.add_hook(hook);
        self
    }

    /// Remap table handle for `key`, notifying hooks when it is newly built
    pub fn remap(&mut self, key: RemapKey) -> Result<RemapHandle, CompileError> {
        let before = self.builder.build_count();
        let handle = self
            .builder
            .get_or_build(&self.catalog, key, &mut self.diagnostics)?;

        if self.builder.build_count() > before {
            if let Some(table) = self.builder.table(handle) {
                for hook in &mut self.hooks {
                    hook.on_remap_table(&key, table);
                }
            }
        }
        Ok(handle)
    }

    /// Weight mask of `desc` on `rig`, compiled once per `(mask, rig)` pair.
    /// Returns its position in the build's mask list.
    pub fn weight_mask(
        &mut self,
        index: u32,
        desc: &RegionMaskDesc,
        rig: RigIndex,
    ) -> Result<usize, CompileError> {
        let memo_key = (desc.clone(), rig);
        if let Some(slot) = self.mask_memo.get(&memo_key) {
            return Ok(*slot);
        }

        let weights = RegionMaskCompiler::new(self.catalog.get(rig)?)
            .compile(desc, &mut self.diagnostics);
        for hook in &mut self.hooks {
            hook.on_weight_mask(desc, rig, &weights);
        }

        let slot = self.masks.len();
        self.masks.push(CompiledMask {
            mask: index,
            rig,
            weights,
        });
        self.mask_memo.insert(memo_key, slot);
        Ok(slot)
    }

    /// Compile every asset of `manifest`.
    ///
    /// Fails only when a rig cannot be ingested.
    pub fn compile(mut self, manifest: &BuildManifest) -> Result<CompiledBuild, CompileError> {
        log::info!(
            "Compiling '{}': {} rigs, {} clips, {} characters",
            manifest.name,
            manifest.rigs.len(),
            manifest.clips.len(),
            manifest.characters.len()
        );

        let mut rigs = Vec::with_capacity(manifest.rigs.len());
        for json in &manifest.rigs {
            let rig = json.to_rig()?;
            let bone_count = rig.skeleton.len();
            let index = self.catalog.register(rig);
            rigs.push(CompiledRig {
                id: json.id.clone(),
                index,
                bone_count,
            });
        }
        let rig_slots: Vec<RigIndex> = rigs.iter().map(|r| r.index).collect();

        let mut clips: Vec<CheckedClip> = manifest
            .clips
            .iter()
            .map(|clip| {
                for rig in std::iter::once(clip.rig).chain(clip.retarget_from) {
                    if rig_slots.get(rig as usize).is_none() {
                        self.diagnostics.warn(
                            DiagnosticKind::MissingRigOrIndex,
                            format!("Clip '{}' references missing rig {}", clip.name, rig),
                        );
                    }
                }
                check_clip(clip, &mut self.diagnostics)
            })
            .collect();

        let characters: Vec<CompiledCharacter> = manifest
            .characters
            .iter()
            .filter_map(|character| self.compile_character(manifest, &rig_slots, character))
            .collect();

        for layer_clip in characters
            .iter()
            .flat_map(|c| c.layers.iter())
            .flat_map(|l| l.clips.iter())
        {
            if let Some(key) = layer_clip.remap {
                let remaps = &mut clips[layer_clip.clip as usize].remaps;
                if !remaps.contains(&key) {
                    remaps.push(key);
                }
            }
        }

        let remaps = self
            .builder
            .keys()
            .into_iter()
            .map(|(key, table)| CompiledRemap { key, table })
            .collect();

        let build = CompiledBuild {
            name: manifest.name.clone(),
            rigs,
            remaps,
            tables: self.builder.into_tables(),
            masks: self.masks,
            clips,
            characters,
            diagnostics: self.diagnostics,
        };
        for hook in &mut self.hooks {
            hook.on_build_finished(&build);
        }
        Ok(build)
    }

    fn compile_character(
        &mut self,
        manifest: &BuildManifest,
        rig_slots: &[RigIndex],
        character: &CharacterDesc,
    ) -> Option<CompiledCharacter> {
        let Some(&rig) = rig_slots.get(character.rig as usize) else {
            self.diagnostics.warn(
                DiagnosticKind::MissingRigOrIndex,
                format!(
                    "Character '{}' references missing rig {}",
                    character.name, character.rig
                ),
            );
            return None;
        };

        let layers = character
            .layers
            .iter()
            .filter_map(|layer| self.compile_layer(manifest, rig_slots, character, rig, layer))
            .collect();

        Some(CompiledCharacter {
            name: character.name.clone(),
            rig,
            layers,
        })
    }

    fn compile_layer(
        &mut self,
        manifest: &BuildManifest,
        rig_slots: &[RigIndex],
        character: &CharacterDesc,
        rig: RigIndex,
        layer: &LayerDesc,
    ) -> Option<CompiledLayer> {
        let Some(graph) = manifest.graphs.get(layer.graph as usize) else {
            self.diagnostics.warn(
                DiagnosticKind::MissingRigOrIndex,
                format!(
                    "Character '{}', layer '{}': missing graph {}",
                    character.name, layer.name, layer.graph
                ),
            );
            return None;
        };

        let mask = match layer.mask {
            None => None,
            Some(index) => match manifest.masks.get(index as usize) {
                Some(desc) => self.weight_mask(index, desc, rig).ok(),
                None => {
                    self.diagnostics.warn(
                        DiagnosticKind::MissingRigOrIndex,
                        format!(
                            "Character '{}', layer '{}': missing mask {}",
                            character.name, layer.name, index
                        ),
                    );
                    None
                }
            },
        };

        let mut clips = Vec::new();
        for clip_index in graph.collect_clips(manifest.clips.len(), &mut self.diagnostics) {
            let clip = &manifest.clips[clip_index as usize];
            // Missing rigs were already reported when the clip was checked
            let Some(&source) = rig_slots.get(clip.source_rig() as usize) else {
                continue;
            };

            let remap = if source != rig || clip.mirror {
                let key = RemapKey::new(source, rig, clip.mirror);
                match self.remap(key) {
                    Ok(_) => Some(key),
                    Err(err) => {
                        self.diagnostics.warn(
                            DiagnosticKind::MissingRigOrIndex,
                            format!("Clip '{}' on '{}': {}", clip.name, character.name, err),
                        );
                        continue;
                    }
                }
            } else {
                None
            };
            clips.push(LayerClip {
                clip: clip_index,
                remap,
            });
        }

        Some(CompiledLayer {
            name: layer.name.clone(),
            mask,
            clips,
        })
    }
}

/// Compile one manifest with a fresh session
pub fn compile_manifest(
    manifest: &BuildManifest,
    config: Option<&CompilerConfig>,
) -> Result<CompiledBuild, CompileError> {
    CompileSession::new(resolve_config(manifest, config))
        .with_hook(Box::new(LogSummary))
        .compile(manifest)
}

/// Compile independent manifests in parallel, one session each
pub fn compile_all(
    manifests: &[BuildManifest],
    config: Option<&CompilerConfig>,
) -> Vec<Result<CompiledBuild, CompileError>> {
    manifests
        .par_iter()
        .map(|manifest| compile_manifest(manifest, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipDesc;
    use crate::graph::{Blend1DChild, MotionGraph, MotionNode, NodeIndex};
    use crate::mask::BodyRegion;
    use crate::rig::RigJson;
    use crate::skeleton::SkeletonJson;
    use crate::test_support::humanoid_rig;
    use std::sync::{Arc, Mutex};

    fn hero() -> RigJson {
        let paths = [
            "Root",
            "Root/Hips",
            "Root/Hips/Spine",
            "Root/Hips/LeftUpperLeg",
            "Root/Hips/RightUpperLeg",
            "Root/Hips/Spine/LeftUpperArm",
            "Root/Hips/Spine/RightUpperArm",
        ];
        let entries: Vec<(&str, &str)> = paths[1..]
            .iter()
            .map(|p| {
                let leaf = p.rsplit('/').next().unwrap();
                (leaf, leaf)
            })
            .collect();
        RigJson::from_rig(&humanoid_rig("hero", &paths, &entries))
    }

    fn villain() -> RigJson {
        RigJson::from_rig(&humanoid_rig(
            "villain",
            &[
                "Root",
                "Root/pelvis",
                "Root/pelvis/spine",
                "Root/pelvis/thigh_l",
                "Root/pelvis/thigh_r",
            ],
            &[
                ("Hips", "pelvis"),
                ("Spine", "spine"),
                ("LeftUpperLeg", "thigh_l"),
                ("RightUpperLeg", "thigh_r"),
            ],
        ))
    }

    fn play(clip: u32) -> MotionGraph {
        let mut graph = MotionGraph::new(format!("play{clip}"));
        graph.add(MotionNode::Clip { clip });
        graph
    }

    fn layer(name: &str, mask: Option<u32>, graph: u32) -> LayerDesc {
        LayerDesc {
            name: name.to_string(),
            mask,
            graph,
        }
    }

    fn manifest() -> BuildManifest {
        let mut locomotion = MotionGraph::new("locomotion");
        locomotion.add(MotionNode::Blend1D {
            parameter: "speed".to_string(),
            children: vec![
                Blend1DChild {
                    node: NodeIndex(1),
                    threshold: 0.0,
                },
                Blend1DChild {
                    node: NodeIndex(2),
                    threshold: 1.0,
                },
            ],
        });
        locomotion.add(MotionNode::Clip { clip: 0 });
        locomotion.add(MotionNode::Clip { clip: 2 });

        BuildManifest {
            name: "demo".to_string(),
            config: None,
            rigs: vec![hero(), villain()],
            clips: vec![
                ClipDesc::new("walk", 0, 1.0).with_channels(&["Root", "Root/Hips"]),
                ClipDesc::new("wave", 0, 2.0)
                    .with_channels(&["Root/Hips/Spine/LeftUpperArm"])
                    .mirrored(),
                ClipDesc::new("run", 1, 0.8).with_channels(&["Root", "Root/pelvis"]),
                ClipDesc::new("empty", 0, 0.0),
            ],
            masks: vec![RegionMaskDesc::new("upper")
                .with_region(BodyRegion::LeftLeg, false)
                .with_region(BodyRegion::RightLeg, false)],
            graphs: vec![locomotion, play(1)],
            characters: vec![
                CharacterDesc {
                    name: "hero".to_string(),
                    rig: 0,
                    layers: vec![layer("base", None, 0), layer("upper", Some(0), 1)],
                },
                CharacterDesc {
                    name: "villain".to_string(),
                    rig: 1,
                    layers: vec![layer("base", None, 0)],
                },
            ],
        }
    }

    #[derive(Default)]
    struct Counts {
        tables: usize,
        masks: usize,
        finished: usize,
    }

    struct Recorder(Arc<Mutex<Counts>>);

    impl BuildHook for Recorder {
        fn on_remap_table(&mut self, _key: &RemapKey, _table: &RemapTable) {
            self.0.lock().unwrap().tables += 1;
        }

        fn on_weight_mask(&mut self, _mask: &RegionMaskDesc, _rig: RigIndex, _w: &WeightMask) {
            self.0.lock().unwrap().masks += 1;
        }

        fn on_build_finished(&mut self, _build: &CompiledBuild) {
            self.0.lock().unwrap().finished += 1;
        }
    }

    #[test]
    fn test_compile_manifest_end_to_end() {
        let build = compile_manifest(&manifest(), None).unwrap();
        let (hero, villain) = (RigIndex(0), RigIndex(1));

        assert_eq!(build.rigs.len(), 2);
        assert_eq!(build.clips.len(), 4);
        assert!(build.clips[3].needs_review);
        assert_eq!(
            build.diagnostics.count(DiagnosticKind::UnsupportedOrEmptyClip),
            1
        );

        let keys: Vec<RemapKey> = build.remaps.iter().map(|r| r.key).collect();
        assert_eq!(keys.len(), 3);
        for key in [
            RemapKey::new(villain, hero, false),
            RemapKey::new(hero, hero, true),
            RemapKey::new(hero, villain, false),
        ] {
            assert!(keys.contains(&key), "missing {key}");
            assert!(build.remap_table(&key).is_some());
        }

        let character = build.character("hero").unwrap();
        assert_eq!(
            character.layers[0].clips,
            vec![
                LayerClip {
                    clip: 0,
                    remap: None
                },
                LayerClip {
                    clip: 2,
                    remap: Some(RemapKey::new(villain, hero, false))
                },
            ]
        );
        let upper = &character.layers[1];
        assert_eq!(upper.clips[0].remap, Some(RemapKey::new(hero, hero, true)));
        let mask = &build.masks[upper.mask.unwrap()];
        assert_eq!(mask.rig, hero);
        let included: Vec<u32> = mask.weights.rotation_weights.iter().map(|w| w.index).collect();
        assert_eq!(included, vec![0, 1, 2, 5, 6]);

        let villain_base = &build.character("villain").unwrap().layers[0];
        assert_eq!(
            villain_base.clips[0].remap,
            Some(RemapKey::new(hero, villain, false))
        );
        assert_eq!(villain_base.clips[1].remap, None);

        // "walk" is played natively by the hero and remapped onto the villain
        assert_eq!(build.clips[0].remaps, vec![RemapKey::new(hero, villain, false)]);
        assert_eq!(build.clips[1].remaps, vec![RemapKey::new(hero, hero, true)]);
        assert_eq!(build.clips[2].remaps, vec![RemapKey::new(villain, hero, false)]);
        assert!(build.clips[3].remaps.is_empty());
    }

    #[test]
    fn test_hooks_fire_once_per_new_output() {
        let counts = Arc::new(Mutex::new(Counts::default()));
        let mut manifest = manifest();
        // Same mask on the same rig twice: compiled once
        manifest.characters[0]
            .layers
            .push(layer("upper-again", Some(0), 1));

        let build = CompileSession::new(CompilerConfig::default())
            .with_hook(Box::new(Recorder(Arc::clone(&counts))))
            .compile(&manifest)
            .unwrap();

        let counts = counts.lock().unwrap();
        assert_eq!(counts.tables, 3);
        assert_eq!(counts.masks, 1);
        assert_eq!(counts.finished, 1);
        assert_eq!(build.masks.len(), 1);
        let hero = build.character("hero").unwrap();
        assert_eq!(hero.layers[1].mask, hero.layers[2].mask);
    }

    #[test]
    fn test_missing_indices_are_reported_per_entry() {
        let mut manifest = manifest();
        manifest.characters.push(CharacterDesc {
            name: "ghost".to_string(),
            rig: 9,
            layers: vec![layer("base", None, 0)],
        });
        manifest.characters[1].layers.push(layer("broken", Some(4), 7));
        manifest.characters[1].layers.push(layer("masked", Some(4), 1));
        manifest.clips.push(ClipDesc::new("orphan", 5, 1.0).with_channels(&["Root"]));

        let build = compile_manifest(&manifest, None).unwrap();
        assert_eq!(build.characters.len(), 2);
        assert!(build.character("ghost").is_none());

        let villain = build.character("villain").unwrap();
        assert_eq!(villain.layers.len(), 2);
        assert_eq!(villain.layers[1].mask, None);
        // ghost rig, missing graph, missing mask, orphan clip rig
        assert_eq!(build.diagnostics.count(DiagnosticKind::MissingRigOrIndex), 4);
    }

    #[test]
    fn test_duplicate_rigs_need_no_remap() {
        let mut manifest = manifest();
        manifest.rigs.push(hero());
        // "walk" authored on the copy of the hero rig
        manifest.clips[0].retarget_from = Some(2);

        let build = compile_manifest(&manifest, None).unwrap();
        assert_eq!(build.rigs[2].index, RigIndex(0));
        let hero = build.character("hero").unwrap();
        assert_eq!(hero.layers[0].clips[0].remap, None);
    }

    #[test]
    fn test_bad_rig_aborts_build() {
        let mut manifest = manifest();
        manifest.rigs.push(RigJson {
            id: "broken".to_string(),
            skeleton: SkeletonJson {
                name: "broken".to_string(),
                bones: Vec::new(),
            },
            human: None,
        });
        assert!(matches!(
            compile_manifest(&manifest, None),
            Err(CompileError::EmptySkeleton(_))
        ));
    }

    #[test]
    fn test_degenerate_rig_aborts_build() {
        let mut manifest = manifest();
        manifest.rigs[1].skeleton.bones[1].default.translation.y = f32::NAN;
        let result = compile_manifest(&manifest, None);
        assert!(matches!(
            result,
            Err(CompileError::DegenerateTransform { field: "translation", .. })
        ));
    }

    #[test]
    fn test_config_override_wins() {
        let mut manifest = manifest();
        manifest.config = Some(CompilerConfig {
            dedup_tables: false,
            ..CompilerConfig::default()
        });
        assert!(!resolve_config(&manifest, None).dedup_tables);
        assert!(resolve_config(&manifest, Some(&CompilerConfig::default())).dedup_tables);
    }

    #[test]
    fn test_compile_all_in_parallel() {
        let mut broken = manifest();
        broken.rigs[1].skeleton.bones.clear();
        let manifests = vec![manifest(), broken, manifest()];

        let results = compile_all(&manifests, None);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok() && results[2].is_ok());
        assert!(results[1].is_err());

        let a = results[0].as_ref().unwrap();
        let b = results[2].as_ref().unwrap();
        assert_eq!(a.tables, b.tables);
    }

    #[test]
    fn test_build_serializes_to_json() {
        let build = compile_manifest(&manifest(), None).unwrap();
        let json = serde_json::to_value(&build).unwrap();
        assert_eq!(json["name"], "demo");
        assert_eq!(json["clips"][3]["needs_review"], true);
        assert_eq!(json["clips"][0]["name"], "walk");
        assert!(json["diagnostics"].as_array().is_some());
    }
}
