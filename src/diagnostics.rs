//! Build diagnostics.
//!
//! Every recoverable problem found during a compile pass is logged through the
//! `log` facade and kept in a [`Diagnostics`] list that travels with the
//! compiled build, so a build always comes back paired with its report.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// Destination bone without a usable source bone; omitted from the table
    MissingBoneCorrespondence,
    /// Reference to a rig, clip, mask or graph node that does not exist
    MissingRigOrIndex,
    /// Clip with no channels or no usable duration
    UnsupportedOrEmptyClip,
    /// Mask transform path that names no bone of the skeleton
    UnresolvedMaskPath,
    /// Motion graph edge leading back to a node still being visited
    GraphCycle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{:?}: {}", kind, message);
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            kind,
            message,
        });
    }

    pub fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        log::error!("{:?}: {}", kind, message);
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            kind,
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries of the given kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    /// Move all entries of `other` to the end of this list
    pub fn append(&mut self, other: &mut Diagnostics) {
        self.entries.append(&mut other.entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_kind_and_severity() {
        let mut diag = Diagnostics::new();
        diag.warn(DiagnosticKind::MissingBoneCorrespondence, "Prop");
        diag.warn(DiagnosticKind::MissingBoneCorrespondence, "Cape");
        assert!(!diag.has_errors());

        diag.error(DiagnosticKind::MissingRigOrIndex, "rig 9");
        assert_eq!(diag.len(), 3);
        assert_eq!(diag.count(DiagnosticKind::MissingBoneCorrespondence), 2);
        assert!(diag.has_errors());
    }

    #[test]
    fn test_append_drains_other() {
        let mut a = Diagnostics::new();
        let mut b = Diagnostics::new();
        b.warn(DiagnosticKind::UnsupportedOrEmptyClip, "idle");
        a.append(&mut b);
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }
}
