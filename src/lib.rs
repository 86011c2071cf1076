//! rigc - rig retargeting and body-mask compiler
//!
//! Build-time compiler for animation content: ingests skeletons, pairs bones
//! between rigs (with optional left/right mirroring), computes rest-pose
//! offsets and emits compact remap tables and per-bone weight masks for a
//! runtime to consume.

pub mod blob;
pub mod clip;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod manifest;
pub mod mask;
pub mod math;
pub mod retarget;
pub mod rig;
pub mod session;
pub mod skeleton;

#[cfg(test)]
mod test_support;

pub use config::{CompilerConfig, RestSource};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::{BlobError, CompileError};
pub use manifest::BuildManifest;
pub use math::{BoneTransform, MirrorAxis};
pub use retarget::{RemapKey, RemapTable, RemapTableBuilder, SharedRemapCache};
pub use rig::{Rig, RigCatalog, RigIndex};
pub use session::{compile_all, compile_manifest, BuildHook, CompileSession, CompiledBuild};
pub use skeleton::Skeleton;
