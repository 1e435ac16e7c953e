//! Manager configuration (made by FontLab https://www.fontlab.com/)

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogOptions;
use crate::error::FontError;
use crate::generic::GenericFamilies;
use crate::matcher::DefaultFamilies;
use crate::properties::StyleDefaults;

/// Extra font roots, separated by `;` when present and by `:` otherwise.
pub const FONT_PATH_ENV: &str = "FONTPICK_FONT_PATH";
/// Directory for catalog snapshots.
pub const CACHE_DIR_ENV: &str = "FONTPICK_CACHE_DIR";

/// Everything a [`FontManager`](crate::manager::FontManager) needs to know.
///
/// `Default` touches neither the environment nor the disk; it has no cache
/// directory and therefore never persists. [`ManagerConfig::from_env`] is the
/// usual starting point for applications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Searched before the system directories, in order.
    pub font_paths: Vec<PathBuf>,
    pub include_system_fonts: bool,
    pub use_fontconfig: bool,
    pub follow_symlinks: bool,
    /// Bundled-font directory: searched first, and snapshot paths under it are
    /// stored relative to it.
    pub base_dir: Option<PathBuf>,
    /// Snapshots are read from and written to this directory when set.
    pub cache_dir: Option<PathBuf>,
    pub style: StyleDefaults,
    pub generic_families: GenericFamilies,
    pub default_family: DefaultFamilies,
    pub default_outline_file: Option<String>,
    pub default_metric_file: Option<String>,
    /// Candidate files above this many bytes are skipped.
    pub max_font_file_size: Option<u64>,
    pub jobs: Option<usize>,
    pub lookup_cache_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            font_paths: Vec::new(),
            include_system_fonts: true,
            use_fontconfig: cfg!(all(unix, not(target_os = "macos"))),
            follow_symlinks: false,
            base_dir: None,
            cache_dir: None,
            style: StyleDefaults::default(),
            generic_families: GenericFamilies::default(),
            default_family: DefaultFamilies::default(),
            default_outline_file: Some("DejaVuSans.ttf".to_string()),
            default_metric_file: None,
            max_font_file_size: Some(64 * 1024 * 1024),
            jobs: None,
            lookup_cache_capacity: 1024,
        }
    }
}

impl ManagerConfig {
    /// Defaults plus environment overrides and the per-user cache directory.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Read a JSON config file; absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: ManagerConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("validating config {}", path.display()))?;
        Ok(config)
    }

    /// Append roots from `FONTPICK_FONT_PATH`, take `FONTPICK_CACHE_DIR`, and
    /// fall back to the per-user cache directory.
    pub fn apply_env(&mut self) {
        if let Some(raw) = env::var_os(FONT_PATH_ENV) {
            self.font_paths
                .extend(split_font_path(&raw.to_string_lossy()));
        }
        if let Some(dir) = env::var_os(CACHE_DIR_ENV).filter(|d| !d.is_empty()) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        if self.cache_dir.is_none() {
            self.cache_dir = default_cache_dir();
        }
    }

    pub fn validate(&self) -> Result<(), FontError> {
        self.style.weight.validated()?;
        self.style.stretch.validated()?;
        if self.jobs == Some(0) {
            return Err(FontError::validation("jobs", "0", "at least 1"));
        }
        if self.lookup_cache_capacity == 0 {
            return Err(FontError::validation(
                "lookup_cache_capacity",
                "0",
                "at least 1",
            ));
        }
        Ok(())
    }

    /// Discovery roots in search order.
    pub fn font_roots(&self) -> Vec<PathBuf> {
        self.base_dir
            .iter()
            .chain(self.font_paths.iter())
            .cloned()
            .collect()
    }

    pub fn catalog_options(&self) -> CatalogOptions {
        CatalogOptions {
            jobs: self.jobs,
            default_outline_file: self.default_outline_file.clone(),
            default_metric_file: self.default_metric_file.clone(),
        }
    }
}

fn split_font_path(raw: &str) -> Vec<PathBuf> {
    let sep = if raw.contains(';') { ';' } else { ':' };
    raw.split(sep)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// `$XDG_CACHE_HOME/fontpick`, else `~/.cache/fontpick`, else
/// `%LOCALAPPDATA%\fontpick`.
pub fn default_cache_dir() -> Option<PathBuf> {
    let non_empty = |name: &str| env::var_os(name).filter(|v| !v.is_empty()).map(PathBuf::from);

    non_empty("XDG_CACHE_HOME")
        .map(|dir| dir.join("fontpick"))
        .or_else(|| non_empty("HOME").map(|home| home.join(".cache").join("fontpick")))
        .or_else(|| non_empty("LOCALAPPDATA").map(|dir| dir.join("fontpick")))
}
