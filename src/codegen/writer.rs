//! Output writing
//!
//! Every file is written to a temporary sibling and renamed into place, so
//! a reader never sees a half-written source file. A marker file sits in
//! the output root while a run is writing; the manifest is written last and
//! its presence without the marker means the output set is complete.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::Result;

/// Present in the output root while a run is writing
pub const INCOMPLETE_MARKER: &str = ".xsdgen-incomplete";

/// File name of the manifest
pub const MANIFEST_FILE: &str = "manifest.json";

/// A rendered source file, path relative to the output root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Relative path
    pub path: PathBuf,
    /// Full contents
    pub contents: String,
}

/// One unit as listed in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestUnit {
    /// Module identifier
    pub module: String,
    /// Relative path
    pub path: String,
    /// Source namespace, if the layout groups by namespace
    pub namespace: Option<String>,
    /// Generated type identifiers in emission order
    pub types: Vec<String>,
    /// Global elements listed by this unit, as `{namespace}local`
    pub elements: Vec<String>,
}

/// Machine-readable summary of a generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Generator name
    pub generator: String,
    /// Generator version
    pub version: String,
    /// Layout the output was produced with
    pub layout: String,
    /// Namespace to module paths
    pub namespaces: BTreeMap<String, Vec<String>>,
    /// Units sorted by path
    pub units: Vec<ManifestUnit>,
}

impl Manifest {
    /// Pretty JSON with a trailing newline
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Parse a manifest written by a previous run
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Write `contents` to `path` through a temporary file in the same directory
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(contents)?;
    file.flush()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Write every file and the manifest under `root`
///
/// Files that exist but are not part of this output set are left alone.
pub fn write_output(root: &Path, files: &[RenderedFile], manifest: &Manifest) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(root)?;
    let marker = root.join(INCOMPLETE_MARKER);
    fs::write(&marker, b"")?;

    let mut written = Vec::with_capacity(files.len() + 1);
    for file in files {
        let path = root.join(&file.path);
        write_atomic(&path, file.contents.as_bytes())?;
        debug!(path = %path.display(), bytes = file.contents.len(), "file written");
        written.push(path);
    }

    let manifest_path = root.join(MANIFEST_FILE);
    write_atomic(&manifest_path, manifest.to_json()?.as_bytes())?;
    written.push(manifest_path);

    fs::remove_file(&marker)?;
    info!(root = %root.display(), files = written.len(), "output written");
    Ok(written)
}

/// Whether `root` holds the output of an interrupted run
pub fn is_incomplete(root: &Path) -> bool {
    root.join(INCOMPLETE_MARKER).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest() -> Manifest {
        Manifest {
            generator: "xsdgen".to_string(),
            version: crate::VERSION.to_string(),
            layout: "single".to_string(),
            namespaces: BTreeMap::from([("urn:a".to_string(), vec!["model".to_string()])]),
            units: vec![ManifestUnit {
                module: "model".to_string(),
                path: "model.rs".to_string(),
                namespace: None,
                types: vec!["Order".to_string()],
                elements: vec!["{urn:a}order".to_string()],
            }],
        }
    }

    #[test]
    fn test_write_output_creates_files_and_manifest() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("out");
        let files = vec![
            RenderedFile {
                path: PathBuf::from("model.rs"),
                contents: "pub struct Order {}\n".to_string(),
            },
            RenderedFile {
                path: PathBuf::from("nested/extra.rs"),
                contents: "// extra\n".to_string(),
            },
        ];
        let written = write_output(&root, &files, &manifest()).unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(fs::read_to_string(root.join("model.rs")).unwrap(), "pub struct Order {}\n");
        assert_eq!(fs::read_to_string(root.join("nested/extra.rs")).unwrap(), "// extra\n");
        assert!(!is_incomplete(&root));

        let json = fs::read_to_string(root.join(MANIFEST_FILE)).unwrap();
        assert!(json.ends_with('\n'));
        assert_eq!(Manifest::from_json(&json).unwrap(), manifest());
    }

    #[test]
    fn test_rewrite_replaces_contents_and_keeps_foreign_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("model.rs"), "old").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        let files = vec![RenderedFile {
            path: PathBuf::from("model.rs"),
            contents: "new".to_string(),
        }];
        write_output(dir.path(), &files, &manifest()).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("model.rs")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dir.path().join("notes.txt")).unwrap(), "keep");
    }

    #[test]
    fn test_leftover_marker_is_detected() {
        let dir = TempDir::new().unwrap();
        assert!(!is_incomplete(dir.path()));
        fs::write(dir.path().join(INCOMPLETE_MARKER), "").unwrap();
        assert!(is_incomplete(dir.path()));
    }
}
