use log::trace;
use path_clean::clean;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::constants::{INDEX_FILES, RESOLVE_EXTENSIONS};

pub fn is_relative_specifier(request: &str) -> bool {
    request == "."
        || request == ".."
        || request.starts_with("./")
        || request.starts_with("../")
}

/// Resolves `request` relative to `from_dir` to an existing file.
///
/// Bare specifiers return `None`: they point outside the analyzed package.
pub fn resolve_relative(from_dir: &Path, request: &str) -> Option<PathBuf> {
    if !is_relative_specifier(request) && !Path::new(request).is_absolute() {
        trace!("Not resolving bare specifier '{}'", request);
        return None;
    }

    let candidate = clean(from_dir.join(request));
    let result = resolve_file(&candidate);
    match &result {
        Some(p) => trace!("Resolved '{}' from {} to {}", request, from_dir.display(), p.display()),
        None => trace!("Failed to resolve '{}' from {}", request, from_dir.display()),
    }
    result
}

/// Literal file, then each extension, then TS-for-JS substitution, then
/// directory index files.
pub(crate) fn resolve_file(p: &Path) -> Option<PathBuf> {
    if p.is_file() {
        return Some(normalize(p));
    }

    for ext in RESOLVE_EXTENSIONS {
        let candidate = with_appended_extension(p, ext);
        if candidate.is_file() {
            return Some(normalize(&candidate));
        }
    }

    // `./Button.js` written against `Button.ts` under TypeScript ESM resolution
    let substitutes: &[&str] = match p.extension().and_then(|e| e.to_str()) {
        Some("js") => &["ts", "tsx"],
        Some("mjs") => &["mts"],
        Some("cjs") => &["cts"],
        _ => &[],
    };
    for ext in substitutes {
        let candidate = p.with_extension(ext);
        if candidate.is_file() {
            return Some(normalize(&candidate));
        }
    }

    for index_file in INDEX_FILES {
        let candidate = p.join(index_file);
        if candidate.is_file() {
            return Some(normalize(&candidate));
        }
    }

    None
}

/// Absolute, symlink-free form of `p` when it exists, a lexically cleaned one otherwise.
pub(crate) fn normalize(p: &Path) -> PathBuf {
    p.canonicalize().unwrap_or_else(|_| clean(p))
}

fn with_appended_extension(p: &Path, ext: &str) -> PathBuf {
    let mut s: OsString = p.as_os_str().to_owned();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}
