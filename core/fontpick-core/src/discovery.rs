//! Font discovery helpers for fontpick-core (made by FontLab https://www.fontlab.com/)

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use walkdir::WalkDir;

use crate::catalog::FontKind;

/// Trait for enumerating candidate font files of one kind.
pub trait FontDiscovery: Send + Sync {
    fn discover(&self, kind: FontKind) -> Result<Vec<PathBuf>>;
}

/// Recursive filesystem walker over explicit roots, optionally joined by the
/// platform font directories and fontconfig.
#[derive(Debug, Clone)]
pub struct PathDiscovery {
    roots: Vec<PathBuf>,
    system_fonts: bool,
    fontconfig: bool,
    follow_symlinks: bool,
}

impl PathDiscovery {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let roots = roots.into_iter().map(Into::into).collect();
        Self {
            roots,
            system_fonts: false,
            fontconfig: false,
            follow_symlinks: false,
        }
    }

    pub fn with_system_fonts(mut self, enabled: bool) -> Self {
        self.system_fonts = enabled;
        self
    }

    pub fn with_fontconfig(mut self, enabled: bool) -> Self {
        self.fontconfig = enabled;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

impl FontDiscovery for PathDiscovery {
    fn discover(&self, kind: FontKind) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();

        for root in &self.roots {
            walk_root(root, kind, self.follow_symlinks, &mut found);
        }
        if self.system_fonts {
            for root in system_font_dirs() {
                walk_root(&root, kind, self.follow_symlinks, &mut found);
            }
        }
        if self.fontconfig {
            found.extend(fontconfig_fonts(kind));
        }

        let mut seen = HashSet::new();
        found.retain(|path| seen.insert(path.clone()));
        Ok(found)
    }
}

/// Canonical form of `path` when it exists, absolute form otherwise.
pub fn resolve_path(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn walk_root(root: &Path, kind: FontKind, follow_symlinks: bool, found: &mut Vec<PathBuf>) {
    if !root.exists() {
        tracing::debug!("font root does not exist: {}", root.display());
        return;
    }

    let walker = WalkDir::new(root)
        .follow_links(follow_symlinks)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!("skipping unreadable entry under {}: {err}", root.display());
                continue;
            }
        };
        if entry.file_type().is_file() && kind.matches_path(entry.path()) {
            found.push(resolve_path(entry.path()));
        }
    }
}

/// Platform font directories, in search order.
pub fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "macos")]
    {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        dirs.push(PathBuf::from("/Library/Fonts"));
        dirs.push(PathBuf::from("/Network/Library/Fonts"));
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/opt/local/share/fonts"));
        if let Some(home) = &home {
            dirs.push(home.join("Library/Fonts"));
        }
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        dirs.push(PathBuf::from("/usr/X11R6/lib/X11/fonts/TTF"));
        dirs.push(PathBuf::from("/usr/X11/lib/X11/fonts"));
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Some(data_home) = std::env::var_os("XDG_DATA_HOME") {
            dirs.push(PathBuf::from(data_home).join("fonts"));
        } else if let Some(home) = &home {
            dirs.push(home.join(".local/share/fonts"));
        }
        if let Some(home) = &home {
            dirs.push(home.join(".fonts"));
        }
    }

    #[cfg(windows)]
    {
        if let Some(windir) = std::env::var_os("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        }
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            dirs.push(PathBuf::from(local).join("Microsoft/Windows/Fonts"));
        }
    }

    dirs
}

/// Files fontconfig knows about. Missing or failing `fc-list` yields nothing.
fn fontconfig_fonts(kind: FontKind) -> Vec<PathBuf> {
    let output = match std::process::Command::new("fc-list")
        .arg("--format=%{file}\\n")
        .output()
    {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            tracing::debug!("fc-list exited with {}", output.status);
            return Vec::new();
        }
        Err(err) => {
            tracing::debug!("fc-list unavailable: {err}");
            return Vec::new();
        }
    };

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .filter(|path| kind.matches_path(path) && path.is_file())
        .map(|path| resolve_path(&path))
        .collect()
}
