//! Error types for the rig compiler

use thiserror::Error;

use crate::rig::RigIndex;

/// Structural failures that stop the entry (or the whole build) being compiled.
///
/// Recoverable problems such as a bone without a counterpart are not errors;
/// they are recorded as [`crate::diagnostics::Diagnostic`]s instead.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("skeleton '{0}' has no bones")]
    EmptySkeleton(String),

    #[error("skeleton '{skeleton}': bone {index} ('{bone}') has parent {parent}, expected a parent index below {index}")]
    InvalidParent {
        skeleton: String,
        bone: String,
        index: usize,
        parent: i32,
    },

    #[error("skeleton '{0}': bone 0 must be the root (parent -1)")]
    MissingRoot(String),

    #[error("skeleton '{skeleton}': bone '{bone}' has a degenerate {field}")]
    DegenerateTransform {
        skeleton: String,
        bone: String,
        field: &'static str,
    },

    #[error("rig index {0} is not registered in the catalog")]
    MissingRig(RigIndex),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures decoding a binary remap table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlobError {
    #[error("blob too short: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("bad magic {0:#010x}")]
    BadMagic(u32),

    #[error("unsupported blob version {0}")]
    UnsupportedVersion(u32),
}
