//! End-to-end generation tests
//!
//! Every test runs the full pipeline over a directory under
//! `tests/fixtures/`, copied into a temporary directory when the test
//! changes it.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use xsdgen::codegen::{self, Manifest, RenderedFile};
use xsdgen::graph::TypeRef;
use xsdgen::resolve::{Cardinality, ResolvedField, ResolvedGraph, Shape};
use xsdgen::{
    AnonymousNaming, DiagnosticKind, Error, GenerationFailure, Generator, GeneratorConfig, PackageNaming, QName,
    RunState,
};

const ORDERS_NS: &str = "urn:example:orders";
const COMMON_NS: &str = "urn:example:common";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn copy_fixture(name: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    for entry in fs::read_dir(fixture(name)).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
    dir
}

fn render(root: &Path, config: GeneratorConfig) -> Vec<RenderedFile> {
    Generator::new(config).unwrap().render(root).unwrap().files
}

fn analyze(root: &Path) -> ResolvedGraph {
    Generator::new(GeneratorConfig::new()).unwrap().analyze(root).unwrap().resolved
}

fn file<'a>(files: &'a [RenderedFile], path: &str) -> &'a str {
    files
        .iter()
        .find(|f| f.path == Path::new(path))
        .map(|f| f.contents.as_str())
        .unwrap_or_else(|| panic!("no file {}", path))
}

fn failure<T: std::fmt::Debug>(result: xsdgen::Result<T>) -> GenerationFailure {
    match result {
        Err(Error::Generation(failure)) => failure,
        other => panic!("expected a generation failure, got {:?}", other),
    }
}

fn fields<'a>(resolved: &'a ResolvedGraph, ns: &str, name: &str) -> &'a [ResolvedField] {
    match resolved.get(&QName::namespaced(ns, name)).map(|t| &t.shape) {
        Some(Shape::Struct { fields, .. }) => fields,
        other => panic!("expected struct {}, got {:?}", name, other),
    }
}

#[test]
fn test_generation_is_deterministic() {
    let first = render(&fixture("orders"), GeneratorConfig::new());
    let second = render(&fixture("orders"), GeneratorConfig::new());
    assert_eq!(first, second);

    // Where the schemas live does not matter
    let copy = copy_fixture("orders");
    let moved = render(copy.path(), GeneratorConfig::new());
    assert_eq!(first, moved);
}

#[test]
fn test_extension_fields_come_base_first() {
    let resolved = analyze(&fixture("orders"));
    let names: Vec<&str> = fields(&resolved, ORDERS_NS, "Derived")
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, vec!["f1", "f2", "f3"]);
}

#[test]
fn test_enumeration_order_is_preserved() {
    let resolved = analyze(&fixture("orders"));
    let color = resolved.get(&QName::namespaced(COMMON_NS, "Color")).unwrap();
    let Shape::Enumeration { ref members, .. } = color.shape else {
        panic!("expected an enumeration");
    };
    let values: Vec<&str> = members.iter().map(|m| m.value.as_str()).collect();
    assert_eq!(values, vec!["RED", "GREEN", "BLUE"]);

    let files = render(&fixture("orders"), GeneratorConfig::new());
    let common = file(&files, "example_common.rs");
    assert!(common.contains("    Red,\n    Green,\n    Blue,\n"));
    assert!(common.contains("/// Paint colors\n"));
}

#[test]
fn test_recursive_type_uses_indirection() {
    let resolved = analyze(&fixture("orders"));
    let node = fields(&resolved, ORDERS_NS, "Node");
    assert_eq!(node[0].name, "parent");
    assert_eq!(node[0].cardinality, Cardinality::Optional);
    assert!(node[0].indirect);
    assert_eq!(node[1].cardinality, Cardinality::Repeated);
    assert!(!node[1].indirect);

    let files = render(&fixture("orders"), GeneratorConfig::new());
    let orders = file(&files, "example_orders.rs");
    assert!(orders.contains("    pub parent: Option<Box<Node>>,\n"));
    assert!(orders.contains("    pub children: Vec<Node>,\n"));
}

#[test]
fn test_mutually_required_types_fail_resolution() {
    let mut generator = Generator::new(GeneratorConfig::new()).unwrap();
    let failure = failure(generator.render(&fixture("mutual")));
    assert_eq!(failure.kind, DiagnosticKind::Resolution);
    assert_eq!(failure.state, "resolving");
    assert!(failure
        .errors()
        .any(|d| d.message.contains("Left") && d.message.contains("Right")));
    assert_eq!(generator.state(), RunState::Failed(DiagnosticKind::Resolution));
}

#[test]
fn test_import_and_include_form_one_graph() {
    let mut generator = Generator::new(GeneratorConfig::new()).unwrap();
    let analysis = generator.analyze(&fixture("imports")).unwrap();
    assert_eq!(analysis.documents, 3);
    assert!(analysis.warnings.is_empty());

    let resolved = &analysis.resolved;
    assert_eq!(resolved.len(), 3);
    let envelope = fields(resolved, "urn:example:a", "Envelope");
    assert_eq!(
        envelope[0].ty,
        TypeRef::Named(QName::namespaced("urn:example:b", "Payload"))
    );
    assert_eq!(envelope[1].ty, TypeRef::Named(QName::namespaced("urn:example:b", "Meta")));
    assert!(resolved.get(&QName::namespaced("urn:example:b", "Meta")).is_some());
}

#[test]
fn test_missing_included_schema_is_a_load_error() {
    let dir = copy_fixture("imports");
    fs::remove_file(dir.path().join("C.xsd")).unwrap();

    let mut generator = Generator::new(GeneratorConfig::new()).unwrap();
    let failure = failure(generator.render(dir.path()));
    assert_eq!(failure.kind, DiagnosticKind::Load);
    assert_eq!(failure.state, "loading");
    assert!(failure.errors().any(|d| d.kind == DiagnosticKind::Load
        && d.location.as_deref().map_or(false, |l| l.ends_with("C.xsd"))));
}

#[test]
fn test_unsupported_facets_abort_in_strict_mode() {
    let config = GeneratorConfig::new().with_strict_unsupported(true);
    let mut generator = Generator::new(config).unwrap();
    let failure = failure(generator.render(&fixture("unsupported")));
    assert_eq!(failure.kind, DiagnosticKind::Unsupported);
    assert_eq!(failure.state, "resolving");
}

#[test]
fn test_unsupported_facets_degrade_with_warning() {
    let mut generator = Generator::new(GeneratorConfig::new()).unwrap();
    let output = generator.render(&fixture("unsupported")).unwrap();
    assert_eq!(output.warnings.len(), 1);
    assert_eq!(output.warnings[0].kind, DiagnosticKind::Unsupported);
    assert!(output.warnings[0].message.contains("pattern"));

    let codes = file(&output.files, "example_codes.rs");
    assert!(codes.contains("pub enum Code {\n    Aa,\n    Bb,\n}\n"));
}

#[test]
fn test_per_namespace_output_on_disk() {
    let out = TempDir::new().unwrap();
    let config = GeneratorConfig::new().with_output_root(out.path());
    let report = Generator::new(config).unwrap().run(&fixture("orders")).unwrap();
    assert_eq!(report.units, 2);

    let names: Vec<String> = report
        .files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(
        names,
        vec!["example_common.rs", "example_orders.rs", "mod.rs", codegen::MANIFEST_FILE]
    );

    let index = fs::read_to_string(out.path().join("mod.rs")).unwrap();
    assert!(index.contains("pub mod example_common;\npub mod example_orders;\n"));

    let orders = fs::read_to_string(out.path().join("example_orders.rs")).unwrap();
    assert!(orders.contains("    pub ship_to: super::example_common::Address,\n"));
    assert!(orders.contains("    pub color: super::example_common::Color,\n"));
    assert!(orders.contains("    pub const STATUS_DEFAULT: &'static str = \"new\";\n"));
    assert!(orders.contains("/// A customer order\n"));

    let manifest = Manifest::from_json(&fs::read_to_string(out.path().join(codegen::MANIFEST_FILE)).unwrap()).unwrap();
    assert_eq!(manifest.layout, "per-namespace");
    assert_eq!(manifest.namespaces[COMMON_NS], vec!["example_common".to_string()]);
    assert_eq!(manifest.namespaces[ORDERS_NS], vec!["example_orders".to_string()]);
    assert_eq!(
        manifest.units[1].types,
        vec!["Base", "Derived", "Node", "OrderType"]
    );
    assert!(!codegen::is_incomplete(out.path()));
}

#[test]
fn test_per_type_and_single_layouts() {
    let per_type = render(
        &fixture("orders"),
        GeneratorConfig::new().with_package_naming(PackageNaming::PerType),
    );
    let paths: Vec<String> = per_type.iter().map(|f| f.path.to_string_lossy().to_string()).collect();
    assert_eq!(
        paths,
        vec!["address.rs", "base.rs", "color.rs", "derived.rs", "mod.rs", "node.rs", "order_type.rs"]
    );
    assert!(file(&per_type, "derived.rs").contains("pub struct Derived {"));

    let single = render(
        &fixture("orders"),
        GeneratorConfig::new().with_package_naming(PackageNaming::Single),
    );
    assert_eq!(single.len(), 1);
    let model = file(&single, "model.rs");
    assert!(model.contains("    pub ship_to: Address,\n"));
    assert!(!model.contains("super::"));
}

#[test]
fn test_anonymous_naming_strategy_is_applied() {
    let config = GeneratorConfig::new().with_anonymous_naming(AnonymousNaming::NamespacePrefixed);
    let resolved = Generator::new(config)
        .unwrap()
        .analyze(&fixture("orders"))
        .unwrap()
        .resolved;
    let idents: Vec<&str> = resolved.types().map(|t| t.ident.as_str()).collect();
    assert!(idents.contains(&"OrdersOrderType"));
    assert!(!idents.contains(&"OrderType"));
}

#[test]
fn test_chameleon_include_in_scanned_directory() {
    let mut generator = Generator::new(GeneratorConfig::new()).unwrap();
    let analysis = generator.analyze(&fixture("chameleon")).unwrap();
    assert_eq!(analysis.documents, 2);
    assert!(analysis.warnings.is_empty());

    let resolved = &analysis.resolved;
    assert_eq!(resolved.len(), 2);
    assert!(resolved
        .types()
        .all(|t| t.qname.namespace.as_deref() == Some("urn:example:main")));
    let part = fields(resolved, "urn:example:main", "Part");
    assert_eq!(part[0].ty, TypeRef::Named(QName::namespaced("urn:example:main", "Id")));

    let files = render(&fixture("chameleon"), GeneratorConfig::new());
    assert!(files.iter().all(|f| f.path != Path::new("unqualified.rs")));
}
