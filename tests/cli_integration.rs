//! CLI integration tests for xcfuse.
//!
//! These tests exercise the commands that work without the Swift toolchain.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const PACKAGE_JSON: &str = r#"{
  "name": "Networking",
  "products": [
    {"name": "HTTPClient", "targets": ["HTTPClient"]},
    {"name": "Core", "targets": ["Core"]}
  ],
  "targets": [
    {"name": "HTTPClient", "type": "regular", "dependencies": [{"byName": ["Core", null]}]},
    {"name": "Core", "type": "regular", "dependencies": [{"byName": ["Crypto", null]}]},
    {"name": "Crypto", "type": "binary", "url": "https://example.com/releases/Crypto.xcframework.zip"},
    {"name": "HTTPClientTests", "type": "test", "dependencies": [{"byName": ["HTTPClient", null]}]}
  ]
}"#;

/// Get the xcfuse binary command with an isolated home directory.
fn xcfuse(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("xcfuse").unwrap();
    cmd.env("XCFUSE_HOME", home);
    cmd
}

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

// ============================================================================
// xcfuse --help
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let tmp = TempDir::new().unwrap();

    xcfuse(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("buildables"))
        .stdout(predicate::str::contains("headers"))
        .stdout(predicate::str::contains("cache"));
}

// ============================================================================
// xcfuse buildables
// ============================================================================

#[test]
fn test_buildables_from_json() {
    let tmp = TempDir::new().unwrap();
    let desc = tmp.path().join("package.json");
    write(&desc, PACKAGE_JSON);

    xcfuse(tmp.path())
        .args(["buildables", "--from-json"])
        .arg(&desc)
        .assert()
        .success()
        .stdout(predicate::str::contains("target(HTTPClient)"))
        .stdout(predicate::str::contains(
            "binaryTarget(Crypto @ https://example.com/releases/Crypto.xcframework.zip)",
        ))
        .stdout(predicate::str::contains("target(Core)").not())
        .stdout(predicate::str::contains("HTTPClientTests").not());
}

#[test]
fn test_buildables_json_output() {
    let tmp = TempDir::new().unwrap();
    let desc = tmp.path().join("package.json");
    write(&desc, PACKAGE_JSON);

    let output = xcfuse(tmp.path())
        .args(["buildables", "--json", "--from-json"])
        .arg(&desc)
        .output()
        .unwrap();
    assert!(output.status.success());

    let units: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let units = units.as_array().unwrap();
    assert_eq!(units.len(), 2);
    assert_eq!(units[0]["kind"], "target");
    assert_eq!(units[0]["name"], "HTTPClient");
    assert_eq!(units[1]["kind"], "binaryTarget");
    assert_eq!(units[1]["target"], "Crypto");
}

#[test]
fn test_buildables_rejects_bad_description() {
    let tmp = TempDir::new().unwrap();
    let desc = tmp.path().join("package.json");
    write(&desc, r#"{"name": "Broken", "targets": [{"name": "X", "type": "plugin"}]}"#);

    xcfuse(tmp.path())
        .args(["buildables", "--from-json"])
        .arg(&desc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to decode package description"));
}

// ============================================================================
// xcfuse headers
// ============================================================================

#[test]
fn test_headers_closure() {
    let tmp = TempDir::new().unwrap();
    let include = tmp.path().join("include");
    write(
        &include.join("Kit.h"),
        "#import \"A.h\"\n#import <Kit/B.h>\n#import <Foundation/Foundation.h>\n",
    );
    write(&include.join("A.h"), "#include \"Missing.h\"\n");
    write(&include.join("B.h"), "#import \"A.h\"\n");

    let output = xcfuse(tmp.path())
        .args(["headers", "--framework", "Kit"])
        .arg(include.join("Kit.h"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["Kit.h", "A.h", "Missing.h (missing)", "B.h"]);
}

// ============================================================================
// xcfuse build
// ============================================================================

#[test]
fn test_build_fails_without_package() {
    let tmp = TempDir::new().unwrap();
    let empty = tmp.path().join("empty");
    fs::create_dir(&empty).unwrap();

    xcfuse(tmp.path())
        .arg("build")
        .current_dir(&empty)
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find `Package.swift`"));
}

#[test]
fn test_build_rejects_unknown_platform() {
    let tmp = TempDir::new().unwrap();
    let pkg = tmp.path().join("Kit");
    write(&pkg.join("Package.swift"), "// swift-tools-version:5.9\n");

    xcfuse(tmp.path())
        .args(["build", "--platform", "amiga", "--package-path"])
        .arg(&pkg)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown platform `amiga`"));
}

#[test]
fn test_build_dependencies_conflicts_with_product() {
    let tmp = TempDir::new().unwrap();

    xcfuse(tmp.path())
        .args(["build", "--dependencies", "--product", "Kit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// xcfuse cache
// ============================================================================

#[test]
fn test_cache_dir_and_clean() {
    let tmp = TempDir::new().unwrap();
    let manifests = tmp.path().join("cache").join("manifests");
    write(&manifests.join("Kit-0123.json"), "{}");

    xcfuse(tmp.path())
        .args(["cache", "dir"])
        .assert()
        .success()
        .stdout(predicate::str::contains(manifests.display().to_string()));

    xcfuse(tmp.path())
        .args(["cache", "clean"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed 1 cached description(s)"));
    assert!(!manifests.exists());
}
