//! Self-qualified type rewrite for compiled Swift interfaces.
//!
//! When a module `X` also declares a type `X`, the compiler writes `X.X` into
//! the module's `.swiftinterface`, which then fails to resolve because `X`
//! names the type first. Stripping the module prefix makes the interface
//! loadable again. This is a toolchain workaround and is kept to this module.

use std::borrow::Cow;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use walkdir::WalkDir;

use crate::util::fs;

/// Replace every `X.X` with `X` for the given module name.
pub fn strip_self_qualification<'t>(text: &'t str, module: &str) -> Result<Cow<'t, str>> {
    let escaped = regex::escape(module);
    let pattern = Regex::new(&format!(r"\b{0}\.{0}\b", escaped))
        .with_context(|| format!("invalid module name `{}`", module))?;
    Ok(pattern.replace_all(text, regex::NoExpand(module)))
}

/// Rewrite every `*.swiftinterface` inside `Modules/<module>.swiftmodule` of
/// a framework in place. Returns the number of files changed.
pub fn rewrite_interfaces(framework_path: &Path, module: &str) -> Result<usize> {
    let swiftmodule = framework_path
        .join("Modules")
        .join(format!("{}.swiftmodule", module));
    if !swiftmodule.is_dir() {
        tracing::debug!("no swiftmodule at {}", swiftmodule.display());
        return Ok(0);
    }

    let mut changed = 0;
    for entry in WalkDir::new(&swiftmodule).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", swiftmodule.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || !path.extension().is_some_and(|ext| ext == "swiftinterface")
        {
            continue;
        }

        let text = fs::read_to_string(path)?;
        if let Cow::Owned(rewritten) = strip_self_qualification(&text, module)? {
            fs::write_string(path, &rewritten)?;
            tracing::debug!("rewrote `{0}.{0}` in {1}", module, path.display());
            changed += 1;
        }
    }
    Ok(changed)
}
