//! Generator configuration
//!
//! Configuration is a plain serde struct with defaults for every field, so
//! a TOML file only needs to name what it changes:
//!
//! ```toml
//! output_root = "src/model"
//! package_naming = "per-type"
//! anonymous_naming = "path"
//! strict_unsupported = true
//!
//! [limits]
//! max_schema_files = 500
//! ```
//!
//! Command-line flags are applied on top of a loaded file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::AnonymousPath;
use crate::limits::Limits;

/// How generated types are partitioned into units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageNaming {
    /// One unit per target namespace
    #[default]
    PerNamespace,
    /// One unit per generated type
    PerType,
    /// Everything in one unit
    Single,
}

impl PackageNaming {
    /// Configuration spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageNaming::PerNamespace => "per-namespace",
            PackageNaming::PerType => "per-type",
            PackageNaming::Single => "single",
        }
    }
}

/// A user-supplied anonymous type namer
pub type AnonymousNamer = Arc<dyn Fn(&AnonymousPath) -> String + Send + Sync>;

/// How anonymous (inline) types are named
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnonymousNaming {
    /// Enclosing component name plus a kind suffix (`shipTo` -> `ShipToType`)
    #[default]
    Enclosing,
    /// The whole path from the top-level component (`Order/shipTo` -> `OrderShipToType`)
    Path,
    /// The path prefixed with the last segment of the namespace URI
    NamespacePrefixed,
    /// A caller-provided function; not expressible in a configuration file
    #[serde(skip)]
    Custom(AnonymousNamer),
}

impl AnonymousNaming {
    /// Wrap a naming function
    pub fn custom(namer: impl Fn(&AnonymousPath) -> String + Send + Sync + 'static) -> Self {
        AnonymousNaming::Custom(Arc::new(namer))
    }

    /// Local name for the anonymous type at `path`
    pub fn name(&self, path: &AnonymousPath) -> String {
        match self {
            AnonymousNaming::Enclosing => format!("{}{}", path.enclosing(), path.suffix()),
            AnonymousNaming::Path => format!("{}{}", path.segments.join("."), path.suffix()),
            AnonymousNaming::NamespacePrefixed => match namespace_prefix(path.namespace.as_deref()) {
                Some(prefix) => format!("{}.{}{}", prefix, path.segments.join("."), path.suffix()),
                None => format!("{}{}", path.segments.join("."), path.suffix()),
            },
            AnonymousNaming::Custom(namer) => namer(path),
        }
    }

    /// Configuration spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            AnonymousNaming::Enclosing => "enclosing",
            AnonymousNaming::Path => "path",
            AnonymousNaming::NamespacePrefixed => "namespace-prefixed",
            AnonymousNaming::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for AnonymousNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last meaningful segment of a namespace URI (`http://example.com/orders` -> `orders`)
fn namespace_prefix(namespace: Option<&str>) -> Option<String> {
    namespace?
        .split(|c: char| c == '/' || c == ':' || c == '#')
        .filter(|segment| segment.chars().any(|c| c.is_ascii_alphabetic()))
        .last()
        .map(str::to_string)
}

/// Options for one generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory generated files are written under
    pub output_root: PathBuf,
    /// Output layout
    pub package_naming: PackageNaming,
    /// Anonymous type naming strategy
    pub anonymous_naming: AnonymousNaming,
    /// Abort on unsupported constructs instead of degrading
    pub strict_unsupported: bool,
    /// Descend into subdirectories when discovering schemas
    pub recursive_scan: bool,
    /// Follow symbolic links during discovery
    pub follow_symlinks: bool,
    /// Worker pool size; `None` uses one worker per core
    pub jobs: Option<usize>,
    /// Module name used by the single-unit layout
    pub single_module_name: String,
    /// Resource limits
    pub limits: Limits,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("generated"),
            package_naming: PackageNaming::default(),
            anonymous_naming: AnonymousNaming::default(),
            strict_unsupported: false,
            recursive_scan: true,
            follow_symlinks: false,
            jobs: None,
            single_module_name: "model".to_string(),
            limits: Limits::default(),
        }
    }
}

impl GeneratorConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GeneratorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reject settings no run could satisfy
    pub fn validate(&self) -> Result<()> {
        if self.single_module_name.trim().is_empty() {
            return Err(Error::Config("single_module_name must not be empty".to_string()));
        }
        if crate::names::module_ident(&self.single_module_name) != self.single_module_name {
            return Err(Error::Config(format!(
                "single_module_name '{}' is not a valid module identifier",
                self.single_module_name
            )));
        }
        if self.jobs == Some(0) {
            return Err(Error::Config("jobs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Set the output directory
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Set the output layout
    pub fn with_package_naming(mut self, naming: PackageNaming) -> Self {
        self.package_naming = naming;
        self
    }

    /// Set the anonymous type naming strategy
    pub fn with_anonymous_naming(mut self, naming: AnonymousNaming) -> Self {
        self.anonymous_naming = naming;
        self
    }

    /// Abort on unsupported constructs
    pub fn with_strict_unsupported(mut self, strict: bool) -> Self {
        self.strict_unsupported = strict;
        self
    }

    /// Descend into subdirectories
    pub fn with_recursive_scan(mut self, recursive: bool) -> Self {
        self.recursive_scan = recursive;
        self
    }

    /// Follow symbolic links
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set the worker pool size
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Set the resource limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}
