//! Resource loading utilities
//!
//! This module handles discovery of schema files in a directory tree and
//! bounded reading of individual schema resources.

use crate::error::{Diagnostic, Error, Result};
use crate::limits::Limits;
use crate::locations::Location;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;
use walkdir::WalkDir;

/// Resource loader for schema files
///
/// Shared by reference across worker threads; the running byte total is
/// tracked atomically so the total-size limit holds under parallel reads.
#[derive(Debug)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
    /// Bytes read so far
    total_read: AtomicUsize,
    /// Files read so far
    files_read: AtomicUsize,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
            total_read: AtomicUsize::new(0),
            files_read: AtomicUsize::new(0),
        }
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Limits in effect
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Load a resource as a string
    pub fn load(&self, location: &Location) -> Result<String> {
        match location {
            Location::Path(path) => {
                let files = self.files_read.fetch_add(1, Ordering::SeqCst) + 1;
                self.limits.check_schema_files(files)?;

                let metadata = fs::metadata(path).map_err(|e| {
                    Diagnostic::load(format!("Failed to read schema '{}': {}", path.display(), e))
                        .with_location(location.as_str())
                })?;
                self.limits.check_schema_size(metadata.len() as usize)?;

                let content = fs::read_to_string(path).map_err(|e| {
                    Diagnostic::load(format!("Failed to read schema '{}': {}", path.display(), e))
                        .with_location(location.as_str())
                })?;

                let total = self.total_read.fetch_add(content.len(), Ordering::SeqCst) + content.len();
                self.limits.check_total_size(total)?;

                debug!(location = %location, bytes = content.len(), "read schema");
                Ok(content)
            }
            Location::Url(url) => Err(Diagnostic::load(format!(
                "Cannot load '{}': remote schema locations are not supported",
                url
            ))
            .with_location(url.as_str())
            .into()),
        }
    }

    /// Number of files read so far
    pub fn files_read(&self) -> usize {
        self.files_read.load(Ordering::SeqCst)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Discover `.xsd` files under `root`, sorted by path
///
/// Walker errors (unreadable entries, symlink loops when following links)
/// are collected as load diagnostics rather than aborting discovery.
pub fn discover_schemas(
    root: &Path,
    recursive: bool,
    follow_symlinks: bool,
    limits: &Limits,
) -> Result<(Vec<Location>, Vec<Diagnostic>)> {
    if !root.is_dir() {
        return Err(Error::Load(
            Diagnostic::load(format!("Schema directory '{}' does not exist", root.display()))
                .with_location(root.to_string_lossy()),
        ));
    }

    let mut walker = WalkDir::new(root).follow_links(follow_symlinks);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut found = Vec::new();
    let mut problems = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let location = e
                    .path()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_else(|| root.to_string_lossy().to_string());
                problems.push(
                    Diagnostic::load(format!("Failed to scan schema directory: {}", e))
                        .with_location(location),
                );
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let is_xsd = entry
            .path()
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("xsd"))
            .unwrap_or(false);
        if !is_xsd {
            continue;
        }

        found.push(Location::from_path(entry.path()));
        limits.check_schema_files(found.len())?;
    }

    found.sort();
    found.dedup();
    debug!(root = %root.display(), count = found.len(), "discovered schemas");
    Ok((found, problems))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "<root>test</root>").unwrap();

        let location = Location::from_path(file.path());
        let loader = Loader::new();
        let content = loader.load(&location).unwrap();

        assert!(content.contains("<root>test</root>"));
        assert_eq!(loader.files_read(), 1);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let loader = Loader::new();
        let err = loader
            .load(&Location::from_path("/definitely/not/here.xsd"))
            .unwrap_err();
        assert!(matches!(err, Error::Load(_)));
    }

    #[test]
    fn test_remote_is_load_error() {
        let loader = Loader::new();
        let err = loader
            .load(&Location::parse("https://example.com/a.xsd").unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("remote schema locations are not supported"));
        assert!(matches!(err, Error::Load(_)));
    }

    #[test]
    fn test_size_limit() {
        let mut file = NamedTempFile::new().unwrap();
        let large_content = "x".repeat(11 * 1024 * 1024); // 11 MB
        write!(file, "{}", large_content).unwrap();

        let location = Location::from_path(file.path());
        let loader = Loader::new().with_limits(Limits::strict());
        let result = loader.load(&location);

        // Strict limits (10 MB max) should reject 11MB file
        assert!(matches!(result, Err(Error::LimitExceeded(_))));
    }

    #[test]
    fn test_discover_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.xsd"), "<x/>").unwrap();
        std::fs::write(dir.path().join("a.XSD"), "<x/>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::write(dir.path().join("nested/c.xsd"), "<x/>").unwrap();

        let (all, problems) = discover_schemas(dir.path(), true, false, &Limits::default()).unwrap();
        assert!(problems.is_empty());
        assert_eq!(all.len(), 3);
        let mut sorted = all.clone();
        sorted.sort();
        assert_eq!(all, sorted);

        let (top, _) = discover_schemas(dir.path(), false, false, &Limits::default()).unwrap();
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_discover_missing_root() {
        let result = discover_schemas(Path::new("/no/such/dir"), true, false, &Limits::default());
        assert!(matches!(result, Err(Error::Load(_))));
    }
}
