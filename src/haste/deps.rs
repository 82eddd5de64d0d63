// src/haste/deps.rs

//! Module specifier extraction and relative resolution.
//!
//! Only relative specifiers (`./x`, `../y`) are resolved; bare package names
//! never point into the project and are dropped.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::project::normalize;

static SPECIFIER_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
        (?:\bimport|\bexport)\s[^'";]*?\bfrom\s*['"]([^'"]+)['"]
        | \bimport\s*['"]([^'"]+)['"]
        | \brequire\s*\(\s*['"]([^'"]+)['"]\s*\)
        | \bimport\s*\(\s*['"]([^'"]+)['"]\s*\)
        "#,
    )
    .ok()
});

/// Every module specifier referenced by `source`, in order of appearance,
/// without duplicates.
pub fn extract_specifiers(source: &str) -> Vec<String> {
    let Some(re) = SPECIFIER_RE.as_ref() else {
        return Vec::new();
    };
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for caps in re.captures_iter(source) {
        let Some(m) = (1..=4).find_map(|i| caps.get(i)) else {
            continue;
        };
        let spec = m.as_str().to_string();
        if seen.insert(spec.clone()) {
            out.push(spec);
        }
    }
    out
}

/// Resolve a relative `specifier` imported from `from` against the set of
/// known files.
///
/// Tries, in order: the exact path, the path with each extension appended,
/// and `<path>/index.<ext>`.
pub fn resolve_specifier(
    from: &Path,
    specifier: &str,
    extensions: &[String],
    known: &dyn Fn(&Path) -> bool,
) -> Option<PathBuf> {
    if !(specifier.starts_with("./") || specifier.starts_with("../")) {
        return None;
    }
    let base = normalize(&from.parent()?.join(specifier));

    if known(&base) {
        return Some(base);
    }
    for ext in extensions {
        let mut with_ext = base.clone().into_os_string();
        with_ext.push(".");
        with_ext.push(ext);
        let candidate = PathBuf::from(with_ext);
        if known(&candidate) {
            return Some(candidate);
        }
    }
    extensions
        .iter()
        .map(|ext| base.join(format!("index.{ext}")))
        .find(|candidate| known(candidate))
}
