//! Command-line interface for xsdgen

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};

#[cfg(feature = "cli")]
use std::collections::BTreeMap;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use xsdgen::{AnonymousNaming, Analysis, Error, Generator, GeneratorConfig, PackageNaming};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xsdgen")]
#[command(author, version, about = "Compile XML Schema (XSD) trees into typed model sources", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate model sources from a schema directory
    Generate {
        /// Directory scanned for .xsd files
        #[arg(value_name = "SCHEMA_DIR")]
        schema_dir: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Output layout
        #[arg(long, value_enum)]
        layout: Option<Layout>,

        /// Anonymous type naming strategy
        #[arg(long, value_enum)]
        anonymous_naming: Option<AnonymousStrategy>,

        /// Module name for the single layout
        #[arg(long, value_name = "NAME")]
        module_name: Option<String>,

        /// Abort on unsupported constructs instead of degrading them
        #[arg(long)]
        strict: bool,

        /// Only scan the top directory
        #[arg(long)]
        no_recursive: bool,

        /// Follow symbolic links while scanning
        #[arg(long)]
        follow_symlinks: bool,

        /// Worker threads
        #[arg(short, long, value_name = "N")]
        jobs: Option<usize>,

        /// TOML configuration file; flags override its values
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Load and resolve schemas, then print what would be generated
    Inspect {
        /// Directory scanned for .xsd files
        #[arg(value_name = "SCHEMA_DIR")]
        schema_dir: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Anonymous type naming strategy
        #[arg(long, value_enum)]
        anonymous_naming: Option<AnonymousStrategy>,

        /// TOML configuration file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
#[derive(ValueEnum, Clone, Copy, Debug)]
enum Layout {
    PerNamespace,
    PerType,
    Single,
}

#[cfg(feature = "cli")]
impl From<Layout> for PackageNaming {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::PerNamespace => PackageNaming::PerNamespace,
            Layout::PerType => PackageNaming::PerType,
            Layout::Single => PackageNaming::Single,
        }
    }
}

#[cfg(feature = "cli")]
#[derive(ValueEnum, Clone, Copy, Debug)]
enum AnonymousStrategy {
    Enclosing,
    Path,
    NamespacePrefixed,
}

#[cfg(feature = "cli")]
impl From<AnonymousStrategy> for AnonymousNaming {
    fn from(strategy: AnonymousStrategy) -> Self {
        match strategy {
            AnonymousStrategy::Enclosing => AnonymousNaming::Enclosing,
            AnonymousStrategy::Path => AnonymousNaming::Path,
            AnonymousStrategy::NamespacePrefixed => AnonymousNaming::NamespacePrefixed,
        }
    }
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            schema_dir,
            output,
            layout,
            anonymous_naming,
            module_name,
            strict,
            no_recursive,
            follow_symlinks,
            jobs,
            config,
        } => load_config(config.as_deref()).and_then(|mut base| {
            if let Some(output) = output {
                base.output_root = output;
            }
            if let Some(layout) = layout {
                base.package_naming = layout.into();
            }
            if let Some(strategy) = anonymous_naming {
                base.anonymous_naming = strategy.into();
            }
            if let Some(name) = module_name {
                base.single_module_name = name;
            }
            if strict {
                base.strict_unsupported = true;
            }
            if no_recursive {
                base.recursive_scan = false;
            }
            if follow_symlinks {
                base.follow_symlinks = true;
            }
            if jobs.is_some() {
                base.jobs = jobs;
            }
            cmd_generate(&schema_dir, base)
        }),
        Commands::Inspect {
            schema_dir,
            json,
            anonymous_naming,
            config,
        } => load_config(config.as_deref()).and_then(|mut base| {
            if let Some(strategy) = anonymous_naming {
                base.anonymous_naming = strategy.into();
            }
            cmd_inspect(&schema_dir, base, json)
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("xsdgen={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(feature = "cli")]
fn load_config(path: Option<&Path>) -> Result<GeneratorConfig, Error> {
    match path {
        Some(path) => GeneratorConfig::from_toml_file(path),
        None => Ok(GeneratorConfig::default()),
    }
}

#[cfg(feature = "cli")]
fn cmd_generate(schema_dir: &Path, config: GeneratorConfig) -> Result<(), Error> {
    let mut generator = Generator::new(config)?;
    let report = generator.run(schema_dir)?;

    for warning in &report.warnings {
        eprintln!("{}", warning);
    }
    println!(
        "Generated {} type(s) in {} unit(s) under {}",
        report.types,
        report.units,
        report.output_root.display()
    );
    if !report.warnings.is_empty() {
        println!("{} warning(s)", report.warnings.len());
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_inspect(schema_dir: &Path, config: GeneratorConfig, json: bool) -> Result<(), Error> {
    let mut generator = Generator::new(config)?;
    let analysis = generator.analyze(schema_dir)?;

    if json {
        print_analysis_json(&analysis)
    } else {
        print_analysis(&analysis);
        Ok(())
    }
}

#[cfg(feature = "cli")]
fn types_per_namespace(analysis: &Analysis) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for ty in analysis.resolved.types() {
        *counts.entry(ty.qname.namespace.clone().unwrap_or_default()).or_insert(0) += 1;
    }
    counts
}

#[cfg(feature = "cli")]
fn print_analysis(analysis: &Analysis) {
    println!("Schema documents: {}", analysis.documents);
    println!("Types: {}", analysis.resolved.len());
    println!("Global elements: {}", analysis.resolved.elements().len());

    println!("\nNamespaces:");
    for (namespace, count) in types_per_namespace(analysis) {
        let name = if namespace.is_empty() { "(none)" } else { namespace.as_str() };
        println!("  {} ({} types)", name, count);
    }

    println!("\nTypes:");
    for ty in analysis.resolved.types() {
        println!("  {} -> {} [{}]", ty.qname, ty.ident, ty.shape.label());
    }

    if !analysis.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &analysis.warnings {
            println!("  {}", warning.to_string().replace('\n', "\n  "));
        }
    }
}

#[cfg(feature = "cli")]
fn print_analysis_json(analysis: &Analysis) -> Result<(), Error> {
    use serde_json::json;

    let types: Vec<_> = analysis
        .resolved
        .types()
        .map(|ty| {
            json!({
                "qname": ty.qname.to_string(),
                "namespace": ty.qname.namespace,
                "ident": ty.ident,
                "kind": ty.shape.label(),
                "synthesized": ty.is_synthesized(),
            })
        })
        .collect();
    let elements: Vec<_> = analysis
        .resolved
        .elements()
        .iter()
        .map(|e| e.qname.to_string())
        .collect();
    let warnings: Vec<_> = analysis.warnings.iter().map(|w| w.to_string()).collect();

    let output = json!({
        "documents": analysis.documents,
        "namespaces": types_per_namespace(analysis),
        "types": types,
        "elements": elements,
        "warnings": warnings,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
