//! Font catalog: parsed faces grouped by kind (made by FontLab https://www.fontlab.com/)

use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};

use crate::discovery::{resolve_path, FontDiscovery};
use crate::error::{ExtractError, FontError};
use crate::extract::{FaceInfo, FontExtractor};
use crate::properties::{FontStretch, FontWeight, Slant, Variant};

/// The two families of font files the catalog keeps apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontKind {
    /// TrueType / OpenType outline fonts.
    #[default]
    Outline,
    /// Adobe Font Metrics files.
    Metric,
}

impl FontKind {
    pub const ALL: [FontKind; 2] = [FontKind::Outline, FontKind::Metric];

    pub fn as_str(self) -> &'static str {
        match self {
            FontKind::Outline => "outline",
            FontKind::Metric => "metric",
        }
    }

    /// Lowercase file extensions that belong to this kind.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FontKind::Outline => &["ttf", "otf", "ttc", "otc"],
            FontKind::Metric => &["afm"],
        }
    }

    pub fn matches_path(self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => {
                let ext = ext.to_ascii_lowercase();
                self.extensions().contains(&ext.as_str())
            }
            None => false,
        }
    }
}

impl FromStr for FontKind {
    type Err = FontError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "outline" | "ttf" | "otf" => Ok(FontKind::Outline),
            "metric" | "afm" => Ok(FontKind::Metric),
            _ => Err(FontError::validation("kind", s, "outline (ttf) or metric (afm)")),
        }
    }
}

impl fmt::Display for FontKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size a face was built for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FaceSize {
    Scalable,
    /// A fixed size kept as written, compared in points when it parses.
    Declared(String),
}

impl From<String> for FaceSize {
    fn from(raw: String) -> Self {
        if raw.eq_ignore_ascii_case("scalable") {
            FaceSize::Scalable
        } else {
            FaceSize::Declared(raw)
        }
    }
}

impl From<FaceSize> for String {
    fn from(size: FaceSize) -> Self {
        match size {
            FaceSize::Scalable => "scalable".to_string(),
            FaceSize::Declared(raw) => raw,
        }
    }
}

/// One parsed font face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontEntry {
    pub path: PathBuf,
    pub name: String,
    pub style: Slant,
    pub variant: Variant,
    pub weight: FontWeight,
    pub stretch: FontStretch,
    pub size: FaceSize,
}

impl FontEntry {
    pub fn from_face(path: PathBuf, face: FaceInfo) -> Self {
        Self {
            path,
            name: face.family_name,
            style: face.style,
            variant: face.variant,
            weight: face.weight,
            stretch: face.stretch,
            size: FaceSize::Scalable,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// A candidate file the extractor refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFont {
    pub path: PathBuf,
    pub reason: String,
}

/// Knobs for a catalog build.
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    pub jobs: Option<usize>,
    /// File name preferred as the outline fallback font.
    pub default_outline_file: Option<String>,
    pub default_metric_file: Option<String>,
}

/// Parsed entries of one kind plus the files that were skipped on the way.
#[derive(Debug, Clone, Default)]
pub struct CatalogSection {
    pub entries: Vec<FontEntry>,
    pub skipped: Vec<SkippedFont>,
}

/// Immutable view of every known face. Rebuilds replace the whole catalog.
#[derive(Debug, Clone, Default)]
pub struct FontCatalog {
    outline: Vec<FontEntry>,
    metric: Vec<FontEntry>,
    default_outline: Option<PathBuf>,
    default_metric: Option<PathBuf>,
    skipped: Vec<SkippedFont>,
}

impl FontCatalog {
    pub fn from_parts(
        outline: Vec<FontEntry>,
        metric: Vec<FontEntry>,
        default_outline: Option<PathBuf>,
        default_metric: Option<PathBuf>,
    ) -> Self {
        Self {
            outline,
            metric,
            default_outline,
            default_metric,
            skipped: Vec::new(),
        }
    }

    /// Discover, extract and pick default fonts for both kinds.
    pub fn build(
        discovery: &dyn FontDiscovery,
        extractor: &dyn FontExtractor,
        opts: &CatalogOptions,
    ) -> Self {
        let mut catalog = FontCatalog::default();

        for kind in FontKind::ALL {
            // Stored paths are resolved so directory scopes compare like with like.
            let candidates: Vec<PathBuf> = match discovery.discover(kind) {
                Ok(paths) => paths.iter().map(|path| resolve_path(path)).collect(),
                Err(err) => {
                    tracing::warn!("font discovery failed for {kind} fonts: {err:#}");
                    Vec::new()
                }
            };
            let section = build_section(&candidates, kind, extractor, opts.jobs);
            let preferred = match kind {
                FontKind::Outline => opts.default_outline_file.as_deref(),
                FontKind::Metric => opts.default_metric_file.as_deref(),
            };
            let default = pick_default(&section.entries, preferred);

            tracing::debug!(
                "{kind} catalog: {} entries, {} skipped",
                section.entries.len(),
                section.skipped.len()
            );
            catalog.skipped.extend(section.skipped);
            match kind {
                FontKind::Outline => {
                    catalog.outline = section.entries;
                    catalog.default_outline = default;
                }
                FontKind::Metric => {
                    catalog.metric = section.entries;
                    catalog.default_metric = default;
                }
            }
        }

        catalog
    }

    pub fn entries(&self, kind: FontKind) -> &[FontEntry] {
        match kind {
            FontKind::Outline => &self.outline,
            FontKind::Metric => &self.metric,
        }
    }

    /// Last-resort font for `kind`, if any entry could serve.
    pub fn default_font(&self, kind: FontKind) -> Option<&Path> {
        match kind {
            FontKind::Outline => self.default_outline.as_deref(),
            FontKind::Metric => self.default_metric.as_deref(),
        }
    }

    pub fn skipped(&self) -> &[SkippedFont] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.outline.len() + self.metric.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extract every candidate of one kind. Files sharing a name with an earlier
/// candidate are dropped before parsing; output order follows input order.
pub fn build_section(
    candidates: &[PathBuf],
    kind: FontKind,
    extractor: &dyn FontExtractor,
    jobs: Option<usize>,
) -> CatalogSection {
    let unique = dedup_by_file_name(candidates);

    let run = || -> Vec<Result<FaceInfo, String>> {
        unique
            .par_iter()
            .map(|path| extract_isolated(extractor, path, kind))
            .collect()
    };

    let results = match jobs {
        Some(jobs) => match ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(run),
            Err(err) => {
                tracing::warn!("cannot build a {jobs}-thread pool, using the global one: {err}");
                run()
            }
        },
        None => run(),
    };

    let mut section = CatalogSection::default();
    for (path, result) in unique.into_iter().zip(results) {
        match result {
            Ok(face) => section.entries.push(FontEntry::from_face(path.clone(), face)),
            Err(reason) => {
                tracing::debug!("skipping {}: {reason}", path.display());
                section.skipped.push(SkippedFont {
                    path: path.clone(),
                    reason,
                });
            }
        }
    }
    section
}

fn dedup_by_file_name(candidates: &[PathBuf]) -> Vec<&PathBuf> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|path| match path.file_name() {
            Some(name) => seen.insert(name.to_os_string()),
            None => false,
        })
        .collect()
}

fn extract_isolated(
    extractor: &dyn FontExtractor,
    path: &Path,
    kind: FontKind,
) -> Result<FaceInfo, String> {
    match panic::catch_unwind(AssertUnwindSafe(|| extractor.extract(path, kind))) {
        Ok(Ok(face)) if face.scalable => Ok(face),
        Ok(Ok(_)) => Err(ExtractError::NotScalable.to_string()),
        Ok(Err(err)) => Err(err.to_string()),
        Err(_) => Err("extractor panicked".to_string()),
    }
}

fn pick_default(entries: &[FontEntry], preferred: Option<&str>) -> Option<PathBuf> {
    preferred
        .and_then(|wanted| {
            entries.iter().find(|entry| {
                entry
                    .file_name()
                    .is_some_and(|name| name.eq_ignore_ascii_case(wanted))
            })
        })
        .or_else(|| entries.first())
        .map(|entry| entry.path.clone())
}
