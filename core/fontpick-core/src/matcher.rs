//! Best-match selection with fallback and self-repair (made by FontLab https://www.fontlab.com/)
//!
//! A lookup runs in up to four steps:
//!
//! 1. an explicit file in the request wins outright;
//! 2. every catalog entry of the requested kind is scored and the lowest
//!    total wins, stopping early on a perfect 0.0;
//! 3. a best total of 10.0 or more means no family matched: with fallback
//!    enabled the kind's default family is tried once, otherwise the catalog's
//!    default font is returned;
//! 4. if the chosen file no longer exists the catalog is rebuilt once and the
//!    lookup repeated with rebuilding disabled.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{FontCatalog, FontEntry, FontKind};
use crate::diagnostics::Diagnostic;
use crate::discovery::resolve_path;
use crate::error::FontError;
use crate::generic::GenericFamilies;
use crate::properties::FontProperties;
use crate::score::{score_entry, ScoreBreakdown};

/// Best totals at or above this mean no requested family matched.
pub const SOFT_FAIL_SCORE: f64 = 10.0;

/// Source of the current catalog, able to replace it when files vanish.
pub trait CatalogProvider {
    fn catalog(&self) -> Arc<FontCatalog>;

    /// Replace `stale` with a fresh catalog. When another caller already
    /// replaced it, return that catalog instead of building again.
    fn rebuild(&self, stale: &Arc<FontCatalog>) -> Arc<FontCatalog>;
}

/// Family tried for each kind when a request's own families all miss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultFamilies {
    pub outline: String,
    pub metric: String,
}

impl DefaultFamilies {
    pub fn for_kind(&self, kind: FontKind) -> &str {
        match kind {
            FontKind::Outline => &self.outline,
            FontKind::Metric => &self.metric,
        }
    }
}

impl Default for DefaultFamilies {
    fn default() -> Self {
        Self {
            outline: "DejaVu Sans".to_string(),
            metric: "Helvetica".to_string(),
        }
    }
}

/// Per-lookup switches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FindOptions {
    pub kind: FontKind,
    /// Only consider fonts strictly inside this directory.
    pub directory: Option<PathBuf>,
    pub fallback_to_default: bool,
    pub rebuild_if_missing: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            kind: FontKind::Outline,
            directory: None,
            fallback_to_default: true,
            rebuild_if_missing: true,
        }
    }
}

impl FindOptions {
    pub fn kind(mut self, kind: FontKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn within(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn fallback_to_default(mut self, enabled: bool) -> Self {
        self.fallback_to_default = enabled;
        self
    }

    pub fn rebuild_if_missing(mut self, enabled: bool) -> Self {
        self.rebuild_if_missing = enabled;
        self
    }
}

/// A scored catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct ScoredEntry<'c> {
    pub entry: &'c FontEntry,
    pub score: ScoreBreakdown,
}

impl ScoredEntry<'_> {
    pub fn total(&self) -> f64 {
        self.score.total()
    }
}

/// Stateless matching over borrowed alias tables.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    generics: &'a GenericFamilies,
    defaults: &'a DefaultFamilies,
}

impl<'a> Matcher<'a> {
    pub fn new(generics: &'a GenericFamilies, defaults: &'a DefaultFamilies) -> Self {
        Self { generics, defaults }
    }

    /// Lowest-scoring entry; ties keep the earlier entry.
    pub fn best_match<'c>(
        &self,
        entries: &'c [FontEntry],
        props: &FontProperties,
        scope: Option<&Path>,
    ) -> Option<ScoredEntry<'c>> {
        let mut best: Option<ScoredEntry<'c>> = None;
        for entry in entries {
            if let Some(scope) = scope {
                if !is_within(&entry.path, scope) {
                    continue;
                }
            }
            let candidate = ScoredEntry {
                entry,
                score: score_entry(props, entry, self.generics),
            };
            let total = candidate.total();
            if best.as_ref().map_or(true, |b| total < b.total()) {
                best = Some(candidate);
            }
            if total == 0.0 {
                break;
            }
        }
        best
    }

    /// Steps 1 to 3 against one catalog, without touching the filesystem.
    pub fn resolve(
        &self,
        catalog: &FontCatalog,
        props: &FontProperties,
        kind: FontKind,
        scope: Option<&Path>,
        fallback: bool,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<PathBuf> {
        if let Some(file) = props.file() {
            return Some(file.to_path_buf());
        }

        match self.best_match(catalog.entries(kind), props, scope) {
            Some(best) if best.total() < SOFT_FAIL_SCORE => {
                tracing::debug!(
                    "matched {props} to {} (score {:.3})",
                    best.entry.path.display(),
                    best.total()
                );
                Some(best.entry.path.clone())
            }
            _ if fallback => {
                let family = self.defaults.for_kind(kind);
                Diagnostic::FamilyFallback {
                    families: props.family().to_vec(),
                    fallback: family.to_string(),
                }
                .emit(diagnostics);
                let retry = props.clone().with_family([family]);
                self.resolve(catalog, &retry, kind, scope, false, diagnostics)
            }
            _ => {
                let path = catalog.default_font(kind).map(Path::to_path_buf);
                Diagnostic::DefaultFont {
                    request: props.to_string(),
                    path: path.clone(),
                }
                .emit(diagnostics);
                path
            }
        }
    }

    /// Full lookup including the missing-file repair step.
    pub fn find(
        &self,
        provider: &dyn CatalogProvider,
        props: &FontProperties,
        opts: &FindOptions,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<PathBuf, FontError> {
        let scope = opts.directory.as_deref().map(resolve_path);
        self.find_with(
            provider,
            props,
            opts.kind,
            scope.as_deref(),
            opts.fallback_to_default,
            opts.rebuild_if_missing,
            diagnostics,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn find_with(
        &self,
        provider: &dyn CatalogProvider,
        props: &FontProperties,
        kind: FontKind,
        scope: Option<&Path>,
        fallback: bool,
        rebuild: bool,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<PathBuf, FontError> {
        if let Some(file) = props.file() {
            return Ok(file.to_path_buf());
        }

        let catalog = provider.catalog();
        match self.resolve(&catalog, props, kind, scope, fallback, diagnostics) {
            Some(path) if path.is_file() => Ok(path),
            missing if rebuild => {
                Diagnostic::MissingFontRebuild { path: missing }.emit(diagnostics);
                provider.rebuild(&catalog);
                self.find_with(provider, props, kind, scope, true, false, diagnostics)
            }
            _ => Err(FontError::NotFound {
                request: props.to_string(),
            }),
        }
    }
}

/// `path` lies strictly below `scope`, compared component by component.
fn is_within(path: &Path, scope: &Path) -> bool {
    path != scope && path.starts_with(scope)
}
