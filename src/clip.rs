use serde::{Deserialize, Serialize};

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::retarget::RemapKey;

// ============================================================================
// Clip descriptors
// ============================================================================

/// Clip as listed in a build manifest.
///
/// `rig` and `retarget_from` index the manifest's rig list. The clip's keys
/// are authored against `retarget_from` when set, otherwise against `rig`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ClipDesc {
    pub name: String,
    pub rig: u32,
    #[serde(default)]
    pub duration: f32,
    /// Animated bone paths
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub mirror: bool,
    #[serde(default)]
    pub looping: bool,
    #[serde(default)]
    pub in_place: bool,
    #[serde(default)]
    pub retarget_from: Option<u32>,
}

impl ClipDesc {
    pub fn new(name: impl Into<String>, rig: u32, duration: f32) -> Self {
        Self {
            name: name.into(),
            rig,
            duration,
            channels: Vec::new(),
            mirror: false,
            looping: false,
            in_place: false,
            retarget_from: None,
        }
    }

    pub fn with_channels(mut self, channels: &[&str]) -> Self {
        self.channels = channels.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn mirrored(mut self) -> Self {
        self.mirror = true;
        self
    }

    pub fn retargeted_from(mut self, rig: u32) -> Self {
        self.retarget_from = Some(rig);
        self
    }

    /// Rig whose skeleton the keys were authored on
    pub fn source_rig(&self) -> u32 {
        self.retarget_from.unwrap_or(self.rig)
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() || !self.duration.is_finite() || self.duration <= 0.0
    }
}

/// Validated clip plus the review flag set for empty clips
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckedClip {
    #[serde(flatten)]
    pub desc: ClipDesc,
    pub needs_review: bool,
    /// Remap tables needed to play this clip on every character using it
    pub remaps: Vec<RemapKey>,
}

/// Flag empty clips; they are kept so references to them stay valid.
pub fn check_clip(desc: &ClipDesc, diagnostics: &mut Diagnostics) -> CheckedClip {
    let needs_review = desc.is_empty();
    if needs_review {
        diagnostics.warn(
            DiagnosticKind::UnsupportedOrEmptyClip,
            format!(
                "Clip '{}' is empty ({} channels, duration {})",
                desc.name,
                desc.channels.len(),
                desc.duration
            ),
        );
    }
    CheckedClip {
        desc: desc.clone(),
        needs_review,
        remaps: Vec::new(),
    }
}
