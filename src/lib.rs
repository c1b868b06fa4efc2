//! # xsdgen
//!
//! A schema-driven model compiler: reads a directory tree of W3C XML Schema
//! (XSD) documents and emits strongly-typed, deterministic model sources.
//!
//! A run goes through five phases, each in its own module:
//!
//! - [`schema`]: discover, load and parse schema documents, following
//!   `import`/`include`/`redefine`
//! - [`graph`]: translate declarations into one type graph, naming anonymous
//!   types and inlining groups
//! - [`resolve`]: resolve references and derivations, break containment
//!   cycles, assign identifiers
//! - [`codegen`]: plan output units, render them and write them atomically
//! - [`pipeline`]: the [`Generator`] driving the phases
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use xsdgen::{Generator, GeneratorConfig, PackageNaming};
//!
//! fn main() -> xsdgen::Result<()> {
//!     let config = GeneratorConfig::new()
//!         .with_output_root("src/model")
//!         .with_package_naming(PackageNaming::PerNamespace);
//!     let report = Generator::new(config)?.run(Path::new("schemas"))?;
//!     for warning in &report.warnings {
//!         eprintln!("{}", warning);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Utilities
pub mod namespaces;
pub mod names;
pub mod locations;

// Resource loading
pub mod loaders;
pub mod documents;

pub mod config;

// Phases
pub mod schema;
pub mod graph;
pub mod resolve;
pub mod codegen;
pub mod pipeline;

// Re-exports for convenience
pub use config::{AnonymousNaming, GeneratorConfig, PackageNaming};
pub use error::{Diagnostic, DiagnosticKind, Diagnostics, Error, GenerationFailure, Result};
pub use limits::Limits;
pub use namespaces::QName;
pub use pipeline::{Analysis, GenerationReport, Generator, RenderedOutput, RunState};

/// Version of xsdgen
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
