//! Test fixtures for common test scenarios.
//!
//! Package descriptions in the shape printed by `swift package dump-package`.

/// A `Package.swift` matching [`DUMP_PACKAGE_JSON`].
pub const PACKAGE_SWIFT: &str = r#"// swift-tools-version:5.9
import PackageDescription

let package = Package(
    name: "Networking",
    products: [
        .library(name: "HTTPClient", targets: ["HTTPClient"]),
        .library(name: "Core", targets: ["Core"]),
    ],
    dependencies: [
        .package(url: "https://github.com/apple/swift-log.git", from: "1.5.0"),
    ],
    targets: [
        .target(
            name: "HTTPClient",
            dependencies: ["Core", .product(name: "Logging", package: "swift-log")],
            cSettings: [.headerSearchPath("internal")]
        ),
        .target(name: "Core", dependencies: ["Crypto"]),
        .binaryTarget(
            name: "Crypto",
            url: "https://example.com/releases/Crypto.xcframework.zip",
            checksum: "6f1c1fe1e2c2bd1b6a2c1d7e8f9a0b1c2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a"
        ),
        .testTarget(name: "HTTPClientTests", dependencies: ["HTTPClient"]),
    ]
)
"#;

/// Description of a package with a source product, a wrapper around a
/// binary target, an external product dependency and a test target.
pub const DUMP_PACKAGE_JSON: &str = r#"{
  "name": "Networking",
  "products": [
    {"name": "HTTPClient", "targets": ["HTTPClient"], "type": {"library": ["automatic"]}, "settings": []},
    {"name": "Core", "targets": ["Core"], "type": {"library": ["automatic"]}, "settings": []}
  ],
  "targets": [
    {
      "name": "HTTPClient",
      "type": "regular",
      "dependencies": [
        {"byName": ["Core", null]},
        {"product": ["Logging", "swift-log", null, null]}
      ],
      "exclude": [],
      "resources": [],
      "settings": [
        {"tool": "c", "kind": {"headerSearchPath": {"_0": "internal"}}}
      ]
    },
    {
      "name": "Core",
      "type": "regular",
      "dependencies": [{"byName": ["Crypto", null]}],
      "settings": []
    },
    {
      "name": "Crypto",
      "type": "binary",
      "dependencies": [],
      "url": "https://example.com/releases/Crypto.xcframework.zip",
      "checksum": "6f1c1fe1e2c2bd1b6a2c1d7e8f9a0b1c2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a"
    },
    {
      "name": "HTTPClientTests",
      "type": "test",
      "dependencies": [{"byName": ["HTTPClient", null]}]
    }
  ],
  "toolsVersion": {"_version": "5.9.0"}
}"#;

/// Description of a single-product package whose one target depends on
/// a local binary target.
pub fn wrapper_package_json(name: &str, binary_path: &str) -> String {
    format!(
        r#"{{
  "name": "{name}",
  "products": [{{"name": "{name}", "targets": ["{name}"]}}],
  "targets": [
    {{"name": "{name}", "type": "regular", "dependencies": [{{"byName": ["{name}Binary", null]}}]}},
    {{"name": "{name}Binary", "type": "binary", "path": "{binary_path}"}}
  ]
}}"#
    )
}

/// Description of a package with one regular target per product.
pub fn simple_package_json(name: &str, products: &[&str]) -> String {
    let products_json = products
        .iter()
        .map(|p| format!(r#"{{"name": "{p}", "targets": ["{p}"]}}"#))
        .collect::<Vec<_>>()
        .join(", ");
    let targets_json = products
        .iter()
        .map(|p| format!(r#"{{"name": "{p}", "type": "regular"}}"#))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"{{"name": "{name}", "products": [{products_json}], "targets": [{targets_json}]}}"#
    )
}
