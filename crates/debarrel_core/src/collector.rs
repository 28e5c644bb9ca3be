use anyhow::Result;
use ignore::WalkBuilder;
use log::{debug, trace};
use std::path::PathBuf;

use crate::constants::{JS_TS_EXTENSIONS, NODE_MODULES};

pub struct CollectorConfig {
    pub root: PathBuf,
    /// Only files whose root-relative path contains this substring are kept.
    pub entry_glob: Option<String>,
}

/// Walks `root` for JS/TS sources to rewrite, honouring `.gitignore`.
/// Dependencies and test files are never collected.
pub fn collect_sources(cfg: &CollectorConfig) -> Result<Vec<PathBuf>> {
    let root = &cfg.root;
    debug!("Walking directory tree from root: {}", root.display());
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .ignore(true)
        .git_ignore(true)
        .filter_entry(|dent| dent.file_name() != NODE_MODULES && dent.file_name() != ".git")
        .build();

    let mut files: Vec<PathBuf> = Vec::new();
    for res in walker {
        let dent = res?;
        let p = dent.path();
        if !p.is_file() {
            continue;
        }

        let path_str = p.to_string_lossy();
        if path_str.contains(".test.") || path_str.contains(".spec.") {
            trace!("Skipping test file: {}", path_str);
            continue;
        }

        let Some(ext) = p.extension().and_then(|e| e.to_str()) else { continue };
        if !JS_TS_EXTENSIONS.contains(&ext) {
            continue;
        }

        if let Some(gl) = &cfg.entry_glob {
            let rel_str = p.strip_prefix(root).unwrap_or(p).to_string_lossy();
            if !rel_str.contains(gl.as_str()) {
                continue;
            }
            trace!("Matched source file with glob '{}': {}", gl, rel_str);
        }
        files.push(p.to_path_buf());
    }

    files.sort();
    debug!("Collected {} source files", files.len());
    Ok(files)
}
