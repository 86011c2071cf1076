//! Build manifest: every asset one compile pass consumes, as authored in JSON.
//!
//! Cross references (a clip's rig, a layer's mask or graph) are indices into
//! the manifest's own lists.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clip::ClipDesc;
use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::graph::MotionGraph;
use crate::mask::RegionMaskDesc;
use crate::rig::RigJson;

/// One animation layer of a character
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LayerDesc {
    pub name: String,
    #[serde(default)]
    pub mask: Option<u32>,
    pub graph: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CharacterDesc {
    pub name: String,
    pub rig: u32,
    #[serde(default)]
    pub layers: Vec<LayerDesc>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BuildManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<CompilerConfig>,
    pub rigs: Vec<RigJson>,
    #[serde(default)]
    pub clips: Vec<ClipDesc>,
    #[serde(default)]
    pub masks: Vec<RegionMaskDesc>,
    #[serde(default)]
    pub graphs: Vec<MotionGraph>,
    #[serde(default)]
    pub characters: Vec<CharacterDesc>,
}

impl BuildManifest {
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CompileError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}
