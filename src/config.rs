//! Compiler configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CompileError;
use crate::math::MirrorAxis;

/// Which transform set of a bone feeds the offset computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestSource {
    /// Authored rest pose (falls back to the default values when absent)
    #[default]
    Pose,
    /// Default channel values
    Default,
}

/// Configuration for a compile pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Below this magnitude a source translation Y is treated as zero and the
    /// root scale falls back to 1.0
    pub scale_epsilon: f32,
    /// Quaternion tolerance when deciding whether an offset is the identity
    pub identity_tolerance: f32,
    /// Axis used for mirrored clips
    pub mirror_axis: MirrorAxis,
    /// Map a destination bone onto the same index in the source when nothing
    /// else matches
    pub identity_fallback: bool,
    pub rest_source: RestSource,
    /// Share remap tables with identical content across keys
    pub dedup_tables: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            scale_epsilon: 1e-5,
            identity_tolerance: 1e-5,
            mirror_axis: MirrorAxis::X,
            identity_fallback: true,
            rest_source: RestSource::Pose,
            dedup_tables: true,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CompileError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = CompilerConfig::default();
        assert_eq!(cfg.mirror_axis, MirrorAxis::X);
        assert!(cfg.identity_fallback);
        assert!(cfg.scale_epsilon > 0.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = CompilerConfig::from_json(r#"{ "mirror_axis": "Z", "rest_source": "default" }"#)
            .unwrap();
        assert_eq!(cfg.mirror_axis, MirrorAxis::Z);
        assert_eq!(cfg.rest_source, RestSource::Default);
        assert!(cfg.dedup_tables);
        assert_eq!(cfg.identity_tolerance, 1e-5);
    }

    #[test]
    fn test_unknown_axis_is_rejected() {
        assert!(CompilerConfig::from_json(r#"{ "mirror_axis": "W" }"#).is_err());
    }
}
