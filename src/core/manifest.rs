//! Package description decoding.
//!
//! The package manager prints the manifest of a package as JSON. That text is
//! decoded once into a [`Manifest`], which owns the targets, the products and
//! the name-resolved [`TargetGraph`] between them. A manifest never changes
//! after it has been built.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::core::dependency::TargetDependency;
use crate::core::graph::{Node, TargetGraph, TargetId};
use crate::core::target::{BinaryLocation, Setting, Target, TargetKind};

/// File name of the package manifest inside a package directory.
pub const MANIFEST_FILE_NAME: &str = "Package.swift";

/// Errors raised while reading or decoding a package description.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not read `{}` in {}", MANIFEST_FILE_NAME, dir.display())]
    Unreadable {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed package description: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("target `{0}` is declared more than once")]
    DuplicateTarget(String),

    #[error("binary target `{0}` declares neither `path` nor `url`")]
    MissingBinaryLocation(String),

    #[error("binary target `{target}` has an invalid url `{url}`")]
    InvalidBinaryUrl { target: String, url: String },
}

impl ManifestError {
    /// Whether the error comes from the description text rather than the
    /// package directory. Such errors are worth one retry with a fresh
    /// description.
    pub fn is_decode_failure(&self) -> bool {
        !matches!(self, ManifestError::Unreadable { .. })
    }
}

/// A product exported by the package.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    /// Product name
    pub name: String,

    /// Names of the targets making up the product, in declaration order
    #[serde(default)]
    pub targets: Vec<String>,
}

/// Raw description as printed by the package manager.
#[derive(Debug, Deserialize)]
struct RawManifest {
    name: String,

    #[serde(default)]
    products: Vec<Product>,

    #[serde(default)]
    targets: Vec<RawTarget>,
}

/// Raw target (before validation).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTarget {
    name: String,

    #[serde(rename = "type")]
    kind: TargetKind,

    #[serde(default)]
    dependencies: Vec<TargetDependency>,

    #[serde(default)]
    path: Option<PathBuf>,

    #[serde(default)]
    public_headers_path: Option<PathBuf>,

    #[serde(default)]
    settings: Option<Vec<Setting>>,

    #[serde(default)]
    url: Option<String>,

    #[serde(default)]
    checksum: Option<String>,
}

/// A decoded package description.
#[derive(Debug, Clone)]
pub struct Manifest {
    name: String,
    products: Vec<Product>,
    targets: Vec<Target>,
    graph: TargetGraph,
}

impl Manifest {
    /// Decode a package description from its JSON text.
    pub fn from_json(text: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest = serde_json::from_str(text)?;

        let targets = raw
            .targets
            .into_iter()
            .map(Self::convert_target)
            .collect::<Result<Vec<_>, _>>()?;

        let graph = TargetGraph::build(&targets).map_err(ManifestError::DuplicateTarget)?;
        if graph.has_cycles() {
            tracing::debug!("package `{}` has cyclic target dependencies", raw.name);
        }

        Ok(Manifest {
            name: raw.name,
            products: raw.products,
            targets,
            graph,
        })
    }

    fn convert_target(raw: RawTarget) -> Result<Target, ManifestError> {
        if raw.kind != TargetKind::Binary {
            return Ok(Target {
                name: raw.name,
                kind: raw.kind,
                dependencies: raw.dependencies,
                path: raw.path,
                public_headers_path: raw.public_headers_path,
                settings: raw.settings.unwrap_or_default(),
                binary: None,
            });
        }

        let location = match (raw.path, raw.url) {
            (Some(path), _) => BinaryLocation::Local(path),
            (None, Some(url)) => BinaryLocation::Remote {
                url: Url::parse(&url).map_err(|_| ManifestError::InvalidBinaryUrl {
                    target: raw.name.clone(),
                    url: url.clone(),
                })?,
                checksum: raw.checksum,
            },
            (None, None) => return Err(ManifestError::MissingBinaryLocation(raw.name)),
        };

        Ok(Target {
            dependencies: raw.dependencies,
            binary: Some(location),
            ..Target::new(raw.name, TargetKind::Binary)
        })
    }

    /// Package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared products, in declaration order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Declared targets, in declaration order.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Find a product by name.
    pub fn product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    /// Find a target by name.
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.target_id(name).map(|id| self.target_by_id(id))
    }

    pub fn target_id(&self, name: &str) -> Option<TargetId> {
        self.graph.id(name)
    }

    pub fn target_by_id(&self, id: TargetId) -> &Target {
        &self.targets[id.index()]
    }

    pub fn graph(&self) -> &TargetGraph {
        &self.graph
    }

    /// Targets reachable from the given products, each once, in product
    /// order then depth-first dependency order.
    pub fn closure<'a>(&self, products: impl IntoIterator<Item = &'a Product>) -> Vec<&Target> {
        self.graph
            .closure(products.into_iter().map(Node::Product))
            .into_iter()
            .map(|id| self.target_by_id(id))
            .collect()
    }

    /// Direct dependency targets of a target, in declaration order.
    pub fn direct_dependencies(&self, target: &Target) -> Vec<&Target> {
        match self.target_id(&target.name) {
            Some(id) => self
                .graph
                .dependencies(id)
                .into_iter()
                .map(|dep| self.target_by_id(dep))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Product names whose module would be shadowed by a same-named type.
    ///
    /// A product `X` is listed when target `X` is also reachable from some
    /// other product. Public interfaces compiled for it then qualify types as
    /// `X.X`, which no longer resolves once `X` is also a type.
    pub fn reexport_ambiguities(&self) -> BTreeSet<String> {
        let mut ambiguous = BTreeSet::new();
        for product in &self.products {
            let Some(id) = self.target_id(&product.name) else {
                continue;
            };
            let reached_elsewhere = self
                .products
                .iter()
                .filter(|other| other.name != product.name)
                .any(|other| self.graph.closure([Node::Product(other)]).contains(&id));
            if reached_elsewhere {
                ambiguous.insert(product.name.clone());
            }
        }
        ambiguous
    }
}
