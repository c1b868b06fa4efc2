//! Resource location resolution
//!
//! This module handles resolution of schema locations (file paths and URLs)
//! and of relative `schemaLocation` values against the referencing document.

use crate::error::{Diagnostic, Result};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Resource location - a file path or a URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Location {
    /// File system path (absolute and lexically normalized once resolved)
    Path(PathBuf),
    /// URL (http, https, ...)
    Url(Url),
}

impl Location {
    /// Create a location from a string (auto-detect type)
    pub fn parse(s: &str) -> Result<Self> {
        if let Ok(url) = Url::parse(s) {
            // Single-letter schemes are Windows drive letters, not URLs.
            if url.scheme().len() > 1 {
                if url.scheme() == "file" {
                    let path = url.to_file_path().map_err(|_| {
                        Diagnostic::load(format!("Invalid file URL: '{}'", s))
                    })?;
                    return Ok(Location::from_path(path));
                }
                return Ok(Location::Url(url));
            }
        }
        Ok(Location::from_path(PathBuf::from(s)))
    }

    /// Create a normalized location from a filesystem path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };
        Location::Path(normalize_path(&absolute))
    }

    /// Resolve a `schemaLocation` relative to this location
    pub fn resolve(&self, reference: &str) -> Result<Location> {
        let reference = reference.trim();
        if let Ok(url) = Url::parse(reference) {
            if url.scheme().len() > 1 {
                return Location::parse(reference);
            }
        }

        match self {
            Location::Path(base) => {
                let dir = base.parent().unwrap_or_else(|| Path::new(""));
                Ok(Location::from_path(dir.join(reference)))
            }
            Location::Url(base) => Ok(Location::Url(base.join(reference)?)),
        }
    }

    /// Get the location as a string
    pub fn as_str(&self) -> String {
        match self {
            Location::Path(p) => p.to_string_lossy().to_string(),
            Location::Url(u) => u.to_string(),
        }
    }

    /// Check if this is a remote location (URL)
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }

    /// Check if this is a local file
    pub fn is_file(&self) -> bool {
        matches!(self, Location::Path(_))
    }

    /// File stem, used to derive stable rename suffixes
    pub fn stem(&self) -> String {
        match self {
            Location::Path(p) => p
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
            Location::Url(u) => u
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .map(|last| last.trim_end_matches(".xsd").to_string())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// Lexically normalize a path: drop `.` and fold `..` without touching the filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
