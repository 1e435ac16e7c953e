//! Persistent catalog snapshots (made by FontLab https://www.fontlab.com/)
//!
//! Snapshots are JSON documents named after the catalog version, so a version
//! bump leaves old files behind instead of misreading them. Writes go to a
//! temporary file that is renamed into place while a sidecar lock file is held.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::catalog::{FontCatalog, FontEntry, FontKind};
use crate::error::SnapshotError;

/// Bumped whenever the catalog layout or extraction rules change.
pub const CATALOG_VERSION: u32 = 1;

/// Serializable form of a [`FontCatalog`].
///
/// Paths under the base directory are stored relative to it and re-anchored on
/// load, so a relocated installation keeps working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub version: u32,
    pub outline: Vec<FontEntry>,
    pub metric: Vec<FontEntry>,
    #[serde(default)]
    pub default_outline: Option<PathBuf>,
    #[serde(default)]
    pub default_metric: Option<PathBuf>,
}

impl CatalogSnapshot {
    pub fn from_catalog(catalog: &FontCatalog, base: Option<&Path>) -> Self {
        let entries = |kind| -> Vec<FontEntry> {
            catalog
                .entries(kind)
                .iter()
                .cloned()
                .map(|mut entry: FontEntry| {
                    entry.path = relativize(entry.path, base);
                    entry
                })
                .collect()
        };
        Self {
            version: CATALOG_VERSION,
            outline: entries(FontKind::Outline),
            metric: entries(FontKind::Metric),
            default_outline: catalog
                .default_font(FontKind::Outline)
                .map(|p| relativize(p.to_path_buf(), base)),
            default_metric: catalog
                .default_font(FontKind::Metric)
                .map(|p| relativize(p.to_path_buf(), base)),
        }
    }

    pub fn into_catalog(self, base: Option<&Path>) -> FontCatalog {
        let rebase = |entries: Vec<FontEntry>| -> Vec<FontEntry> {
            entries
                .into_iter()
                .map(|mut entry| {
                    entry.path = anchor(entry.path, base);
                    entry
                })
                .collect()
        };
        FontCatalog::from_parts(
            rebase(self.outline),
            rebase(self.metric),
            self.default_outline.map(|p| anchor(p, base)),
            self.default_metric.map(|p| anchor(p, base)),
        )
    }
}

fn relativize(path: PathBuf, base: Option<&Path>) -> PathBuf {
    match base.and_then(|base| path.strip_prefix(base).ok()) {
        Some(relative) => relative.to_path_buf(),
        None => path,
    }
}

fn anchor(path: PathBuf, base: Option<&Path>) -> PathBuf {
    match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path,
    }
}

/// Where snapshots live.
pub trait SnapshotStore: Send + Sync {
    fn load(&self, version: u32) -> Result<CatalogSnapshot, SnapshotError>;
    fn store(&self, version: u32, snapshot: &CatalogSnapshot) -> Result<(), SnapshotError>;
}

/// Snapshot files in one cache directory.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl JsonSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path_for(&self, version: u32) -> PathBuf {
        self.dir.join(format!("fontlist-v{version}.json"))
    }

    fn lock_path(&self, version: u32) -> PathBuf {
        self.dir.join(format!("fontlist-v{version}.json.lock"))
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load(&self, version: u32) -> Result<CatalogSnapshot, SnapshotError> {
        let path = self.path_for(version);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(SnapshotError::Missing(path))
            }
            Err(err) => return Err(err.into()),
        };
        let snapshot: CatalogSnapshot =
            serde_json::from_slice(&data).map_err(|err| SnapshotError::Corrupt(err.to_string()))?;
        if snapshot.version != version {
            return Err(SnapshotError::VersionMismatch {
                found: snapshot.version,
                expected: version,
            });
        }
        Ok(snapshot)
    }

    fn store(&self, version: u32, snapshot: &CatalogSnapshot) -> Result<(), SnapshotError> {
        fs::create_dir_all(&self.dir)?;
        let _lock = LockFile::acquire(self.lock_path(version), self.lock_timeout)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut tmp, snapshot).map_err(io::Error::from)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(version))
            .map_err(|err| SnapshotError::Io(err.error))?;
        tracing::debug!("wrote catalog snapshot to {}", self.path_for(version).display());
        Ok(())
    }
}

/// Exclusive sidecar lock, released on drop.
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    fn acquire(path: PathBuf, timeout: Duration) -> Result<Self, SnapshotError> {
        let deadline = Instant::now() + timeout;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        return Err(SnapshotError::LockTimeout(path));
                    }
                    thread::sleep(Duration::from_millis(50));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            tracing::debug!("could not remove lock {}: {err}", self.path.display());
        }
    }
}
