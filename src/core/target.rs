//! Target definitions - the compilation units inside a package.
//!
//! A Target is either built from sources (`regular`, `test`) or wraps an
//! artifact that is already compiled (`binary`).

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::core::dependency::{single_tag, TargetDependency};

/// Default public header directory, relative to a target's source directory.
pub const DEFAULT_PUBLIC_HEADERS_PATH: &str = "include";

/// The kind of target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Source target compiled into a module
    Regular,

    /// Test target
    Test,

    /// Pre-built artifact, no sources
    Binary,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Regular => write!(f, "regular"),
            TargetKind::Test => write!(f, "test"),
            TargetKind::Binary => write!(f, "binary"),
        }
    }
}

/// Where a binary target's artifact lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryLocation {
    /// Path relative to the package root
    Local(PathBuf),

    /// Downloadable archive with its checksum
    Remote { url: Url, checksum: Option<String> },
}

impl BinaryLocation {
    /// Identity used for deduplication: the declared path or URL.
    pub fn identity(&self) -> String {
        match self {
            BinaryLocation::Local(path) => path.display().to_string(),
            BinaryLocation::Remote { url, .. } => url.to_string(),
        }
    }

    /// Artifact name derived from the last path or URL component,
    /// up to its first `.` (`Foo.xcframework.zip` -> `Foo`).
    pub fn artifact_name(&self) -> Option<String> {
        let last = match self {
            BinaryLocation::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
            BinaryLocation::Remote { url, .. } => url
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(str::to_string),
        }?;

        let stem = last.split('.').next().unwrap_or_default();
        if stem.is_empty() {
            None
        } else {
            Some(stem.to_string())
        }
    }
}

impl fmt::Display for BinaryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity())
    }
}

/// A build setting declared on a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    /// Tool the setting applies to (c, cxx, swift, linker)
    pub tool: Option<String>,

    /// The setting itself
    pub kind: SettingKind,
}

/// The supported setting kinds, each carrying one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingKind {
    Define(String),
    HeaderSearchPath(String),
    LinkedFramework(String),
    LinkedLibrary(String),
}

const SETTING_TAGS: [&str; 4] = [
    "define",
    "headerSearchPath",
    "linkedFramework",
    "linkedLibrary",
];

impl SettingKind {
    /// Decode from a record holding exactly one known tag.
    ///
    /// The value is either a bare string or the `{"_0": "value"}` wrapper
    /// emitted by the package description dump.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, String> {
        let (tag, value) = single_tag(map, &SETTING_TAGS, "setting")?;
        let value = match value {
            Value::String(s) => s.clone(),
            Value::Object(inner) => inner
                .get("_0")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| format!("setting `{}` has no string value", tag))?,
            other => return Err(format!("setting `{}` has unsupported value {}", tag, other)),
        };

        Ok(match tag {
            "define" => SettingKind::Define(value),
            "headerSearchPath" => SettingKind::HeaderSearchPath(value),
            "linkedFramework" => SettingKind::LinkedFramework(value),
            _ => SettingKind::LinkedLibrary(value),
        })
    }

    /// The carried value.
    pub fn value(&self) -> &str {
        match self {
            SettingKind::Define(v)
            | SettingKind::HeaderSearchPath(v)
            | SettingKind::LinkedFramework(v)
            | SettingKind::LinkedLibrary(v) => v,
        }
    }
}

impl<'de> Deserialize<'de> for Setting {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::deserialize(deserializer)?;
        let tool = map.get("tool").and_then(Value::as_str).map(str::to_string);

        // Dumps nest the tag under `kind`; hand-written records may not.
        let kind = match map.get("kind") {
            Some(Value::Object(kind)) => SettingKind::from_map(kind),
            _ => SettingKind::from_map(&map),
        }
        .map_err(de::Error::custom)?;

        Ok(Setting { tool, kind })
    }
}

/// A compilation unit of a package.
#[derive(Debug, Clone)]
pub struct Target {
    /// Target name, unique within the manifest
    pub name: String,

    /// Target kind
    pub kind: TargetKind,

    /// Declared dependencies, in declaration order
    pub dependencies: Vec<TargetDependency>,

    /// Custom source directory relative to the package root
    pub path: Option<PathBuf>,

    /// Custom public header directory relative to the source directory
    pub public_headers_path: Option<PathBuf>,

    /// Build settings
    pub settings: Vec<Setting>,

    /// Artifact location for binary targets
    pub binary: Option<BinaryLocation>,
}

impl Target {
    /// Create a new target with the given name and kind.
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Target {
            name: name.into(),
            kind,
            dependencies: Vec::new(),
            path: None,
            public_headers_path: None,
            settings: Vec::new(),
            binary: None,
        }
    }

    /// Check if this target wraps a pre-built artifact.
    pub fn is_binary(&self) -> bool {
        self.kind == TargetKind::Binary
    }

    /// Names referenced by the dependency list; platform-only constraints
    /// contribute nothing.
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().filter_map(TargetDependency::name)
    }

    /// Source directory (`path`, or `Sources/<name>`).
    pub fn source_dir(&self, package_root: &Path) -> PathBuf {
        match self.path {
            Some(ref path) => package_root.join(path),
            None => package_root.join("Sources").join(&self.name),
        }
    }

    /// Public header directory (`publicHeadersPath`, or `include`).
    pub fn public_headers_dir(&self, package_root: &Path) -> PathBuf {
        let relative = self
            .public_headers_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_HEADERS_PATH));
        self.source_dir(package_root).join(relative)
    }
}
