//! CLI integration tests
//!
//! These tests run the built binary against the schema fixtures.

#![cfg(feature = "cli")]

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

fn xsdgen_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_xsdgen"))
}

fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

// ============================================================================
// Generate Command Tests
// ============================================================================

#[test]
fn test_cli_generate_writes_output() {
    let out = TempDir::new().unwrap();
    let output = Command::new(xsdgen_bin())
        .arg("generate")
        .arg(fixtures_dir().join("orders"))
        .arg("-o")
        .arg(out.path())
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "generate should succeed: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Generated 6 type(s) in 2 unit(s)"), "unexpected summary: {}", stdout);
    assert!(out.path().join("example_orders.rs").exists());
    assert!(out.path().join("mod.rs").exists());
    assert!(out.path().join("manifest.json").exists());
}

#[test]
fn test_cli_generate_single_layout() {
    let out = TempDir::new().unwrap();
    let output = Command::new(xsdgen_bin())
        .arg("generate")
        .arg(fixtures_dir().join("orders"))
        .arg("-o")
        .arg(out.path())
        .args(["--layout", "single", "--module-name", "schema"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let source = fs::read_to_string(out.path().join("schema.rs")).unwrap();
    assert!(source.contains("pub struct Derived {"));
    assert!(!out.path().join("mod.rs").exists());
}

#[test]
fn test_cli_generate_reports_resolution_errors() {
    let out = TempDir::new().unwrap();
    let output = Command::new(xsdgen_bin())
        .arg("generate")
        .arg(fixtures_dir().join("mutual"))
        .arg("-o")
        .arg(out.path())
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("generation failed while resolving"), "stderr: {}", stderr);
    assert!(stderr.contains("error[resolution]"));
    assert!(stderr.contains("mutual.xsd"));
    assert!(!out.path().join("manifest.json").exists());
}

#[test]
fn test_cli_strict_flag_turns_warnings_into_errors() {
    let out = TempDir::new().unwrap();
    let lenient = Command::new(xsdgen_bin())
        .arg("generate")
        .arg(fixtures_dir().join("unsupported"))
        .arg("-o")
        .arg(out.path())
        .output()
        .expect("Failed to execute command");
    assert!(lenient.status.success());
    assert!(String::from_utf8_lossy(&lenient.stderr).contains("warning[unsupported]"));

    let strict = Command::new(xsdgen_bin())
        .arg("generate")
        .arg(fixtures_dir().join("unsupported"))
        .arg("-o")
        .arg(out.path())
        .arg("--strict")
        .output()
        .expect("Failed to execute command");
    assert_eq!(strict.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&strict.stderr).contains("error[unsupported]"));
}

#[test]
fn test_cli_generate_with_config_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("model");
    let config = dir.path().join("xsdgen.toml");
    fs::write(
        &config,
        format!(
            "output_root = {:?}\npackage_naming = \"per-type\"\n",
            out.to_string_lossy()
        ),
    )
    .unwrap();

    let output = Command::new(xsdgen_bin())
        .arg("generate")
        .arg(fixtures_dir().join("orders"))
        .arg("--config")
        .arg(&config)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(out.join("node.rs").exists());
    assert!(out.join("order_type.rs").exists());
}

#[test]
fn test_cli_generate_missing_directory() {
    let output = Command::new(xsdgen_bin())
        .args(["generate", "/nonexistent/schemas"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("error[load]"));
}

// ============================================================================
// Inspect Command Tests
// ============================================================================

#[test]
fn test_cli_inspect_basic() {
    let output = Command::new(xsdgen_bin())
        .arg("inspect")
        .arg(fixtures_dir().join("imports"))
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "inspect should succeed");
    assert!(stdout.contains("Schema documents: 3"));
    assert!(stdout.contains("urn:example:b (2 types)"));
    assert!(stdout.contains("{urn:example:a}Envelope -> Envelope [struct]"));
}

#[test]
fn test_cli_inspect_json_output() {
    let output = Command::new(xsdgen_bin())
        .arg("inspect")
        .arg("--json")
        .arg(fixtures_dir().join("orders"))
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "inspect --json should succeed");

    let json: serde_json::Value = serde_json::from_str(&stdout).expect("Output should be valid JSON");
    assert_eq!(json["documents"], 2);
    assert_eq!(json["namespaces"]["urn:example:common"], 2);
    let types = json["types"].as_array().expect("types should be an array");
    assert!(types.iter().any(|t| t["ident"] == "OrderType" && t["synthesized"] == true));
    assert_eq!(json["elements"].as_array().map(Vec::len), Some(2));
}
