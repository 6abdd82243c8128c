//! Header closure resolution.
//!
//! Given an umbrella header, finds every header it pulls in from the same
//! header directory, transitively. Only two import forms are followed:
//! `#import "X.h"` and `#import <Framework/X.h>` (and the `#include`
//! spellings of both). System and foreign-framework imports are left alone.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use walkdir::WalkDir;

static QUOTED_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^([ \t]*#[ \t]*(?:import|include)[ \t]+)"([^"]+)""#)
        .expect("quoted import pattern is valid")
});

/// Resolve the headers reachable from `umbrella`.
///
/// When `umbrella` is a directory, the result is every `.h` file directly
/// inside it, sorted by name. Otherwise the umbrella comes first, followed by
/// the headers it imports in depth-first order, each listed once. Imports
/// are looked up in `header_dir`; unreadable headers end their branch.
pub fn resolve_headers(
    umbrella: &Path,
    framework_name: &str,
    header_dir: &Path,
) -> Result<Vec<PathBuf>> {
    if umbrella.is_dir() {
        return headers_in_dir(umbrella);
    }

    let scanner = ImportScanner::new(framework_name)?;
    let mut closure = HeaderClosure::default();
    closure.insert(umbrella.to_path_buf());
    scanner.visit(umbrella, header_dir, &mut closure);
    Ok(closure.order)
}

/// Every `.h` file directly inside `dir`, sorted by file name.
pub fn headers_in_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut headers = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry =
            entry.with_context(|| format!("failed to read header directory: {}", dir.display()))?;
        if entry.file_type().is_file() && is_header(entry.path()) {
            headers.push(entry.into_path());
        }
    }
    Ok(headers)
}

/// Rewrite `#import "X.h"` into `#import <Framework/X.h>`.
///
/// Headers copied into a framework's `Headers/` directory are only reachable
/// through the framework name once the framework is consumed.
pub fn rewrite_quoted_imports(text: &str, framework_name: &str) -> String {
    QUOTED_IMPORT
        .replace_all(text, |caps: &regex::Captures<'_>| {
            format!("{}<{}/{}>", &caps[1], framework_name, &caps[2])
        })
        .into_owned()
}

pub(crate) fn is_header(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "h")
}

/// Headers collected so far, in discovery order.
#[derive(Debug, Default)]
struct HeaderClosure {
    seen: HashSet<PathBuf>,
    order: Vec<PathBuf>,
}

impl HeaderClosure {
    fn insert(&mut self, path: PathBuf) -> bool {
        if self.seen.insert(path.clone()) {
            self.order.push(path);
            true
        } else {
            false
        }
    }
}

/// Finds the imports of one framework's headers.
struct ImportScanner {
    pattern: Regex,
}

impl ImportScanner {
    fn new(framework_name: &str) -> Result<Self> {
        let pattern = format!(
            r#"(?m)^[ \t]*#[ \t]*(?:import|include)[ \t]+(?:"([^"]+)"|<{}/([^>]+)>)"#,
            regex::escape(framework_name)
        );
        let pattern = Regex::new(&pattern)
            .with_context(|| format!("invalid framework name `{}`", framework_name))?;
        Ok(ImportScanner { pattern })
    }

    /// Imported header names, in source order.
    fn imports<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str())
            .collect()
    }

    fn visit(&self, header: &Path, header_dir: &Path, closure: &mut HeaderClosure) {
        let text = match std::fs::read_to_string(header) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("cannot read header {}: {}", header.display(), e);
                return;
            }
        };

        for import in self.imports(&text) {
            let candidate = header_dir.join(import);
            if candidate == header {
                continue;
            }
            if closure.insert(candidate.clone()) {
                self.visit(&candidate, header_dir, closure);
            }
        }
    }
}
