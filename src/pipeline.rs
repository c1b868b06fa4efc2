//! Generation runs
//!
//! A [`Generator`] drives one run through its phases:
//!
//! ```text
//! Idle -> Loading -> GraphBuilding -> Resolving -> Planning -> Emitting -> Done
//! ```
//!
//! Every phase pushes its problems into one [`Diagnostics`] collection. After
//! each phase the run stops if anything collected so far is fatal, so a
//! failed run reports every problem of the phase that failed, and the state
//! becomes `Failed(kind)` with the kind of the first fatal diagnostic.

use std::fmt;
use std::path::{Path, PathBuf};

use rayon::ThreadPoolBuilder;
use tracing::{error, info};

use crate::codegen::{self, EmissionPlan, RenderedFile, Renderer, RustRenderer};
use crate::config::GeneratorConfig;
use crate::error::{Diagnostic, DiagnosticKind, Diagnostics, Error, GenerationFailure, Result};
use crate::graph::{build_graph, TypeGraph};
use crate::loaders::{discover_schemas, Loader};
use crate::resolve::{resolve, ResolvedGraph};
use crate::schema::SchemaSet;

/// Where a run is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Not started
    Idle,
    /// Discovering and parsing schema documents
    Loading,
    /// Translating documents into the type graph
    GraphBuilding,
    /// Resolving references, derivations, cycles and names
    Resolving,
    /// Partitioning types into units
    Planning,
    /// Rendering and writing units
    Emitting,
    /// Finished successfully
    Done,
    /// Aborted on a fatal diagnostic of this kind
    Failed(DiagnosticKind),
    /// Emitted output could not be written to disk
    WriteFailed,
}

impl RunState {
    /// Name used in failure messages
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Loading => "loading",
            RunState::GraphBuilding => "building",
            RunState::Resolving => "resolving",
            RunState::Planning => "planning",
            RunState::Emitting => "emitting",
            RunState::Done => "done",
            RunState::Failed(_) | RunState::WriteFailed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Failed(kind) => write!(f, "failed ({})", kind),
            RunState::WriteFailed => f.write_str("failed (write)"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Loaded, built and resolved schemas, before any emission
#[derive(Debug)]
pub struct Analysis {
    /// Number of schema documents loaded
    pub documents: usize,
    /// The unresolved type graph
    pub graph: TypeGraph,
    /// The resolved graph
    pub resolved: ResolvedGraph,
    /// Non-fatal diagnostics
    pub warnings: Vec<Diagnostic>,
}

/// In-memory output of a run
#[derive(Debug)]
pub struct RenderedOutput {
    /// Emission plan the files were rendered from
    pub plan: EmissionPlan,
    /// Rendered files sorted by path
    pub files: Vec<RenderedFile>,
    /// Manifest for the file set
    pub manifest: codegen::Manifest,
    /// Number of generated types
    pub types: usize,
    /// Non-fatal diagnostics
    pub warnings: Vec<Diagnostic>,
}

/// Summary of a successful run
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Directory the output was written to
    pub output_root: PathBuf,
    /// Every file written, manifest last
    pub files: Vec<PathBuf>,
    /// Number of generated units
    pub units: usize,
    /// Number of generated types
    pub types: usize,
    /// Non-fatal diagnostics
    pub warnings: Vec<Diagnostic>,
}

/// Runs the compiler over a schema directory
pub struct Generator {
    config: GeneratorConfig,
    renderer: Box<dyn Renderer>,
    state: RunState,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("config", &self.config)
            .field("renderer", &self.renderer.name())
            .field("state", &self.state)
            .finish()
    }
}

impl Generator {
    /// Create a generator; the configuration is validated first
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            renderer: Box::new(RustRenderer),
            state: RunState::Idle,
        })
    }

    /// Replace the source renderer
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Configuration in effect
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Load, build and resolve without emitting anything
    pub fn analyze(&mut self, schema_root: &Path) -> Result<Analysis> {
        self.in_pool(|generator| {
            let mut diagnostics = Diagnostics::new();
            let (documents, graph, resolved) = generator.analyze_phases(schema_root, &mut diagnostics)?;
            generator.state = RunState::Done;
            Ok(Analysis {
                documents,
                graph,
                resolved,
                warnings: diagnostics.warnings(generator.config.strict_unsupported),
            })
        })
    }

    /// Run every phase and return the output without writing it
    pub fn render(&mut self, schema_root: &Path) -> Result<RenderedOutput> {
        self.in_pool(|generator| {
            let output = generator.render_phases(schema_root)?;
            generator.state = RunState::Done;
            Ok(output)
        })
    }

    /// Run every phase and write the output under the configured root
    pub fn run(&mut self, schema_root: &Path) -> Result<GenerationReport> {
        self.in_pool(|generator| {
            let output = generator.render_phases(schema_root)?;
            let root = generator.config.output_root.clone();
            let files = match codegen::write_output(&root, &output.files, &output.manifest) {
                Ok(files) => files,
                Err(err) => {
                    error!(root = %root.display(), error = %err, "writing output failed");
                    generator.state = RunState::WriteFailed;
                    return Err(err);
                }
            };
            generator.state = RunState::Done;
            info!(
                units = output.plan.units.len(),
                types = output.types,
                warnings = output.warnings.len(),
                "generation complete"
            );
            Ok(GenerationReport {
                output_root: root,
                files,
                units: output.plan.units.len(),
                types: output.types,
                warnings: output.warnings,
            })
        })
    }

    /// Run `f` on a dedicated pool when a worker count is configured
    fn in_pool<T, F>(&mut self, f: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&mut Self) -> Result<T> + Send,
    {
        self.state = RunState::Idle;
        match self.config.jobs {
            Some(jobs) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(jobs)
                    .build()
                    .map_err(|e| Error::Config(format!("Failed to start worker pool: {}", e)))?;
                pool.install(|| f(self))
            }
            None => f(self),
        }
    }

    fn render_phases(&mut self, schema_root: &Path) -> Result<RenderedOutput> {
        let mut diagnostics = Diagnostics::new();
        let (_, _, resolved) = self.analyze_phases(schema_root, &mut diagnostics)?;

        self.state = RunState::Planning;
        let plan = codegen::plan(&resolved, self.config.package_naming, &self.config.single_module_name);
        self.checkpoint(&diagnostics)?;

        self.state = RunState::Emitting;
        let files = codegen::emit(&plan, &resolved, self.renderer.as_ref());
        let manifest = codegen::manifest(&plan, &resolved);
        Ok(RenderedOutput {
            types: resolved.len(),
            plan,
            files,
            manifest,
            warnings: diagnostics.warnings(self.config.strict_unsupported),
        })
    }

    fn analyze_phases(
        &mut self,
        schema_root: &Path,
        diagnostics: &mut Diagnostics,
    ) -> Result<(usize, TypeGraph, ResolvedGraph)> {
        let config = &self.config;

        self.state = RunState::Loading;
        info!(root = %schema_root.display(), "loading schemas");
        let roots = match discover_schemas(schema_root, config.recursive_scan, config.follow_symlinks, &config.limits)
        {
            Ok((roots, problems)) => {
                diagnostics.extend(problems);
                roots
            }
            Err(err) => {
                diagnostics.push(err.into_diagnostic());
                Vec::new()
            }
        };
        if roots.is_empty() && diagnostics.is_empty() {
            diagnostics.push(
                Diagnostic::load(format!("No .xsd files found under '{}'", schema_root.display()))
                    .with_location(schema_root.to_string_lossy()),
            );
        }
        let loader = Loader::new().with_limits(config.limits.clone());
        let set = SchemaSet::load(&roots, &loader, diagnostics);
        self.checkpoint(diagnostics)?;

        self.state = RunState::GraphBuilding;
        let graph = build_graph(&set, &self.config.anonymous_naming, &self.config.limits, diagnostics);
        self.checkpoint(diagnostics)?;

        self.state = RunState::Resolving;
        let resolved = resolve(&graph, diagnostics);
        self.checkpoint(diagnostics)?;

        Ok((set.len(), graph, resolved))
    }

    /// Abort if anything collected so far is fatal
    fn checkpoint(&mut self, diagnostics: &Diagnostics) -> Result<()> {
        let strict = self.config.strict_unsupported;
        let Some(kind) = diagnostics.first_fatal_kind(strict) else {
            return Ok(());
        };
        let failure = GenerationFailure {
            state: self.state.as_str().to_string(),
            kind,
            diagnostics: diagnostics.sorted(),
        };
        error!(
            state = self.state.as_str(),
            kind = kind.as_str(),
            errors = failure.errors().count(),
            "generation failed"
        );
        self.state = RunState::Failed(kind);
        Err(Error::Generation(failure))
    }
}
