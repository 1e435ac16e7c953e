//! Degraded-path notices (made by FontLab https://www.fontlab.com/)
//!
//! Every notice is logged through `tracing` when raised and also kept, so
//! callers without a subscriber can still show or inspect them.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Diagnostic {
    /// No requested family matched; the kind's default family was tried instead.
    FamilyFallback {
        families: Vec<String>,
        fallback: String,
    },
    /// Nothing matched well enough; the catalog's default font was used.
    DefaultFont {
        request: String,
        path: Option<PathBuf>,
    },
    /// The chosen file has vanished; the catalog is being rebuilt.
    MissingFontRebuild { path: Option<PathBuf> },
    /// The persisted snapshot could not be used and was regenerated.
    SnapshotRebuilt { reason: String },
    /// A freshly built catalog could not be persisted.
    SnapshotWriteFailed { reason: String },
}

impl Diagnostic {
    /// Raised because the answer is not the one the request asked for.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            Diagnostic::FamilyFallback { .. } | Diagnostic::DefaultFont { .. }
        )
    }

    /// Log `self` and append it to `sink`.
    pub(crate) fn emit(self, sink: &mut Vec<Diagnostic>) {
        match &self {
            Diagnostic::SnapshotRebuilt { .. } => tracing::info!("{self}"),
            _ => tracing::warn!("{self}"),
        }
        sink.push(self);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::FamilyFallback { families, fallback } => write!(
                f,
                "font family {:?} not found, falling back to {fallback}",
                families
            ),
            Diagnostic::DefaultFont { request, path } => match path {
                Some(path) => write!(
                    f,
                    "no good match for {request}, using default font {}",
                    path.display()
                ),
                None => write!(f, "no good match for {request} and no default font"),
            },
            Diagnostic::MissingFontRebuild { path } => match path {
                Some(path) => write!(
                    f,
                    "font file {} is missing, rebuilding the catalog",
                    path.display()
                ),
                None => write!(f, "no usable font file, rebuilding the catalog"),
            },
            Diagnostic::SnapshotRebuilt { reason } => {
                write!(f, "rebuilding font catalog snapshot: {reason}")
            }
            Diagnostic::SnapshotWriteFailed { reason } => {
                write!(f, "could not save font catalog snapshot: {reason}")
            }
        }
    }
}
