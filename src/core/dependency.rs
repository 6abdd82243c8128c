//! Target-to-target dependency references.
//!
//! A package description names the dependencies of a target with small
//! tagged records such as `{"byName": ["Core", null]}` or
//! `{"product": {"name": "Logging", "platforms": ["ios"]}}`. Each record must
//! carry exactly one known tag; anything else is a decode error rather than
//! an open-ended dictionary.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

/// A reference to a named dependency, optionally limited to some platforms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyRef {
    /// Referenced target or product name
    pub name: String,

    /// Platforms the reference applies to (None = all platforms)
    pub platforms: Option<Vec<String>>,
}

impl DependencyRef {
    /// Create an unconditional reference.
    pub fn plain(name: impl Into<String>) -> Self {
        DependencyRef {
            name: name.into(),
            platforms: None,
        }
    }

    /// Create a platform-constrained reference.
    pub fn constrained(name: impl Into<String>, platforms: Vec<String>) -> Self {
        DependencyRef {
            name: name.into(),
            platforms: Some(platforms),
        }
    }

    /// Decode a reference from a plain string, a `{name, platforms}` object,
    /// or the `["Name", ..., {"platformNames": [..]}]` array form.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(name) => Ok(DependencyRef::plain(name.clone())),
            Value::Array(items) => {
                let name = items
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| "dependency reference array must start with a name".to_string())?;
                let platforms = items
                    .iter()
                    .skip(1)
                    .filter_map(Value::as_object)
                    .find_map(platform_names);
                Ok(DependencyRef {
                    name: name.to_string(),
                    platforms,
                })
            }
            Value::Object(map) => {
                let name = map
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| "dependency reference object has no `name`".to_string())?;
                let platforms = match map.get("platforms") {
                    Some(list @ Value::Array(_)) => Some(string_list(list)?),
                    _ => platform_names(map),
                };
                Ok(DependencyRef {
                    name: name.to_string(),
                    platforms,
                })
            }
            other => Err(format!("unsupported dependency reference: {}", other)),
        }
    }
}

/// A dependency edge declared by a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetDependency {
    /// Name that may refer to a target or a product
    ByName(DependencyRef),
    /// Product, usually from another package
    Product(DependencyRef),
    /// Target in the same package
    Target(DependencyRef),
    /// Platform restriction without a name of its own
    PlatformConstraint(Vec<String>),
}

const DEPENDENCY_TAGS: [&str; 4] = ["byName", "product", "target", "platformConstraint"];

impl TargetDependency {
    /// The referenced name, if this variant carries one.
    pub fn name(&self) -> Option<&str> {
        match self {
            TargetDependency::ByName(r)
            | TargetDependency::Product(r)
            | TargetDependency::Target(r) => Some(&r.name),
            TargetDependency::PlatformConstraint(_) => None,
        }
    }

    /// Decode from a record holding exactly one known tag.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, String> {
        let (tag, value) = single_tag(map, &DEPENDENCY_TAGS, "target dependency")?;
        match tag {
            "byName" => DependencyRef::from_value(value).map(TargetDependency::ByName),
            "product" => DependencyRef::from_value(value).map(TargetDependency::Product),
            "target" => DependencyRef::from_value(value).map(TargetDependency::Target),
            _ => {
                let platforms = match value {
                    Value::Object(inner) => platform_names(inner).unwrap_or_default(),
                    other => string_list(other)?,
                };
                Ok(TargetDependency::PlatformConstraint(platforms))
            }
        }
    }
}

impl<'de> Deserialize<'de> for TargetDependency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::deserialize(deserializer)?;
        TargetDependency::from_map(&map).map_err(de::Error::custom)
    }
}

impl fmt::Display for TargetDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetDependency::ByName(r) => write!(f, "byName({})", r.name),
            TargetDependency::Product(r) => write!(f, "product({})", r.name),
            TargetDependency::Target(r) => write!(f, "target({})", r.name),
            TargetDependency::PlatformConstraint(p) => {
                write!(f, "platformConstraint({})", p.join(", "))
            }
        }
    }
}

/// Find the single known tag present in a record.
///
/// Fails when no known tag is present or when several are.
pub(crate) fn single_tag<'m, 't>(
    map: &'m Map<String, Value>,
    known: &[&'t str],
    what: &str,
) -> Result<(&'t str, &'m Value), String> {
    let mut present = known
        .iter()
        .filter_map(|tag| map.get(*tag).map(|value| (*tag, value)));

    match (present.next(), present.next()) {
        (Some(found), None) => Ok(found),
        (None, _) => Err(format!(
            "{} record has none of the keys {:?} (found {:?})",
            what,
            known,
            map.keys().collect::<Vec<_>>()
        )),
        (Some((first, _)), Some((second, _))) => Err(format!(
            "{} record has more than one tag (`{}` and `{}`)",
            what, first, second
        )),
    }
}

fn platform_names(map: &Map<String, Value>) -> Option<Vec<String>> {
    map.get("platformNames")
        .and_then(|v| string_list(v).ok())
}

fn string_list(value: &Value) -> Result<Vec<String>, String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| format!("expected a string, found {}", item))
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(format!("expected a list of strings, found {}", other)),
    }
}
