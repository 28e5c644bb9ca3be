//! Export-graph resolution for a single package.
//!
//! Starting from the package entry point, the re-export graph is walked depth
//! first and every externally visible export name is bound to the file that
//! declares it. One [`Traversal`] owns all mutable state of a call, so
//! independent packages can be resolved on separate threads.

use log::{debug, info, trace, warn};
use rayon::prelude::*;
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    rc::Rc,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::{
    error::ResolutionError,
    manifest::entry_point,
    parser::parse_module_record,
    resolver::{normalize, resolve_relative},
    types::{ExportBinding, ExportMap, ModuleRecord},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions<'a> {
    /// Checked once per visited file; when set the call fails with
    /// [`ResolutionError::Cancelled`].
    pub cancel: Option<&'a AtomicBool>,
}

/// Builds the [`ExportMap`] of `package_name` as installed under `root`.
///
/// Fails only when the package entry point cannot be located. Unparsable
/// files contribute no exports and re-exports that leave the package are
/// ignored.
pub fn resolve(
    package_name: &str,
    root: &Path,
    options: &ResolveOptions<'_>,
) -> Result<ExportMap, ResolutionError> {
    info!("Resolving exports of '{}'", package_name);
    let entry = entry_point(package_name, root)?;

    let mut traversal = Traversal::new(package_name, options);
    let mut exports = ExportMap::new().with_entry(normalize(&entry));
    traversal.visit(&entry, &mut exports)?;

    // Names only reachable through nested files never shadow the barrel's own surface.
    let nested = std::mem::take(&mut traversal.discovered);
    exports.merge(nested);

    info!(
        "Resolved {} exports of '{}' from {} files",
        exports.len(),
        package_name,
        traversal.visited.len()
    );
    Ok(exports)
}

/// Resolves every package in parallel, one independent traversal each.
/// A failure affects only its own package.
pub fn resolve_many(
    package_names: &[String],
    root: &Path,
    options: &ResolveOptions<'_>,
) -> HashMap<String, Result<ExportMap, ResolutionError>> {
    debug!("Resolving {} packages in parallel", package_names.len());
    package_names
        .par_iter()
        .map(|name| {
            let result = resolve(name, root, options);
            if let Err(e) = &result {
                warn!("Failed to resolve '{}': {}", name, e);
            }
            (name.clone(), result)
        })
        .collect()
}

struct Traversal<'o> {
    package: &'o str,
    cancel: Option<&'o AtomicBool>,
    visited: HashSet<PathBuf>,
    /// Parsed module records; `None` marks a file that failed to parse.
    records: HashMap<PathBuf, Option<Rc<ModuleRecord>>>,
    /// Complete export surfaces of files whose visit has finished.
    surfaces: HashMap<PathBuf, ExportMap>,
    /// Names found by descending into named re-export sources.
    discovered: ExportMap,
}

impl<'o> Traversal<'o> {
    fn new(package: &'o str, options: &ResolveOptions<'o>) -> Self {
        Self {
            package,
            cancel: options.cancel,
            visited: HashSet::new(),
            records: HashMap::new(),
            surfaces: HashMap::new(),
            discovered: ExportMap::new(),
        }
    }

    fn visit(&mut self, file: &Path, into: &mut ExportMap) -> Result<(), ResolutionError> {
        let file = normalize(file);
        // Marked before recursing so mutual re-exports terminate.
        if !self.visited.insert(file.clone()) {
            match self.surfaces.get(&file) {
                Some(surface) => {
                    trace!("Reusing surface of {}", file.display());
                    into.merge(surface.clone());
                }
                None => trace!("Cycle through {}", file.display()),
            }
            return Ok(());
        }
        self.check_cancelled()?;
        trace!("Visiting {}", file.display());

        let mut surface = ExportMap::new();
        self.collect_surface(&file, &mut surface)?;
        into.merge(surface.clone());
        self.surfaces.insert(file, surface);
        Ok(())
    }

    fn collect_surface(&mut self, file: &Path, into: &mut ExportMap) -> Result<(), ResolutionError> {
        let Some(record) = self.record(file) else { return Ok(()) };
        let dir = parent_dir(file);

        for re_export in &record.re_exports {
            let Some(target) = resolve_relative(dir, &re_export.source) else {
                trace!("Skipping re-export from '{}' outside the package", re_export.source);
                continue;
            };
            for name in &re_export.names {
                if into.contains(&name.exported) {
                    continue;
                }
                let binding = self
                    .declarer_of(&target, &name.imported)
                    .unwrap_or_else(|| ExportBinding::new(target.clone(), name.imported.clone()));
                trace!("Bound '{}' to {}", name.exported, binding.file.display());
                into.bind(name.exported.clone(), binding);
            }

            let mut nested = ExportMap::new();
            self.visit(&target, &mut nested)?;
            self.discovered.merge_star(nested);
        }

        for name in &record.named_exports {
            into.bind(name.clone(), ExportBinding::new(file, name.clone()));
        }

        for source in &record.star_re_exports {
            let Some(target) = resolve_relative(dir, source) else {
                trace!("Skipping star re-export from '{}' outside the package", source);
                continue;
            };
            let mut scratch = ExportMap::new();
            self.visit(&target, &mut scratch)?;
            into.merge_star(scratch);

            // A target still being visited (a cycle) has no surface yet;
            // its own declarations still belong to this one.
            if let Some(target_record) = self.record(&target) {
                for name in target_record.named_exports.iter().filter(|n| *n != "default") {
                    into.bind(name.clone(), ExportBinding::new(target.clone(), name.clone()));
                }
            }
        }

        Ok(())
    }

    /// Follows `name` as exported by `file` to the file that declares it.
    fn declarer_of(&mut self, file: &Path, name: &str) -> Option<ExportBinding> {
        let mut seen = HashSet::new();
        self.trace_declarer(file, name, &mut seen)
    }

    fn trace_declarer(
        &mut self,
        file: &Path,
        name: &str,
        seen: &mut HashSet<(PathBuf, String)>,
    ) -> Option<ExportBinding> {
        let file = normalize(file);
        if !seen.insert((file.clone(), name.to_string())) {
            return None;
        }
        let record = self.record(&file)?;
        if record.declares(name) {
            return Some(ExportBinding::new(file, name));
        }

        let dir = parent_dir(&file);
        for re_export in &record.re_exports {
            let Some(forwarded) = re_export.names.iter().find(|n| n.exported == name) else {
                continue;
            };
            let target = resolve_relative(dir, &re_export.source)?;
            return self
                .trace_declarer(&target, &forwarded.imported, seen)
                .or_else(|| Some(ExportBinding::new(target, forwarded.imported.clone())));
        }

        if name == "default" {
            return None;
        }
        record.star_re_exports.iter().find_map(|source| {
            let target = resolve_relative(dir, source)?;
            self.trace_declarer(&target, name, seen)
        })
    }

    /// Parses each file at most once per traversal.
    fn record(&mut self, file: &Path) -> Option<Rc<ModuleRecord>> {
        if let Some(cached) = self.records.get(file) {
            return cached.clone();
        }
        let record = match parse_module_record(file) {
            Ok(record) => Some(Rc::new(record)),
            Err(e) => {
                warn!("Skipping exports of {}: {:#}", file.display(), e);
                None
            }
        };
        self.records.insert(file.to_path_buf(), record.clone());
        record
    }

    fn check_cancelled(&self) -> Result<(), ResolutionError> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => {
                debug!("Resolution of '{}' cancelled", self.package);
                Err(ResolutionError::Cancelled { package: self.package.to_string() })
            }
            _ => Ok(()),
        }
    }
}

fn parent_dir(file: &Path) -> &Path {
    file.parent().unwrap_or(file)
}
