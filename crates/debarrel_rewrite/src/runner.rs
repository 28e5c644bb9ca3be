use anyhow::Result;
use dashmap::DashMap;
use debarrel_core::{CollectorConfig, ExportMap, ResolveOptions, collect_sources, resolve_many};
use log::{debug, info, trace, warn};
use rayon::prelude::*;
use std::{
    collections::{HashMap, hash_map::Entry},
    fs,
    path::{Path, PathBuf},
    thread,
};

use crate::{
    config::Config,
    rewriter::rewrite_many,
    types::{FailedPackage, FileReport, RewriteWarning, RunReport, TransformResult},
};

/// Resolves every configured package, then rewrites the project's imports of
/// them. Files are only written back when `cfg.write` is set.
///
/// A package that fails to resolve is reported and left out, and so is a file
/// that cannot be written. The run only errors when the project cannot be
/// walked.
pub fn run_rewrite(mut cfg: Config) -> Result<RunReport> {
    info!("Starting barrel import rewrite");
    cfg.initialize()?;
    let root = cfg.root()?.clone();
    let modules_root = cfg.modules_root()?.clone();

    info!("Resolving {} packages in parallel", cfg.packages.len());
    let mut resolved = resolve_many(&cfg.packages, &modules_root, &ResolveOptions::default());

    let mut report = RunReport { written: cfg.write, ..Default::default() };
    let mut packages: Vec<(String, ExportMap)> = Vec::new();
    for package in &cfg.packages {
        match resolved.remove(package) {
            Some(Ok(map)) => {
                info!("Package '{}' exposes {} exports", package, map.len());
                report.exports_resolved += map.len();
                packages.push((package.clone(), map));
            }
            Some(Err(error)) => {
                report.failed_packages.push(FailedPackage { package: package.clone(), error });
            }
            None => {}
        }
    }

    if packages.is_empty() {
        warn!("No package could be resolved, nothing to rewrite");
        return Ok(report);
    }
    let targets: Vec<String> = packages.iter().map(|(package, _)| package.clone()).collect();

    debug!("Collecting source files with glob: {:?}", cfg.entry_glob);
    let files = collect_sources(&CollectorConfig {
        root: root.clone(),
        entry_glob: cfg.entry_glob.clone(),
    })?;
    report.files_scanned = files.len();
    if files.is_empty() {
        warn!("No source files found under {}", root.display());
        return Ok(report);
    }
    info!("Found {} source files", files.len());

    let sources = read_candidate_sources(&files, &targets);
    report.files_parsed = sources.len();
    info!("{} files import a target package", sources.len());

    let results = rewrite_per_package(&sources, &packages);

    let unresolved_counts: DashMap<String, usize> = DashMap::new();
    let mut file_reports = finish_files(results, &root, cfg.write, &unresolved_counts);
    file_reports.sort_by(|a, b| a.path.cmp(&b.path));
    report.files = file_reports;

    let mut unresolved: Vec<(String, usize)> = unresolved_counts.into_iter().collect();
    unresolved.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    report.unresolved = unresolved;

    info!(
        "Rewrite complete: {} files rewritten, {} imports optimized",
        report.files_rewritten(),
        report.imports_optimized()
    );
    if report.write_failures() > 0 {
        warn!("{} files could not be written", report.write_failures());
    }
    Ok(report)
}

/// Rewrites each package with its own export map, in command-line order.
/// A file's output for one package is the input of the next package's pass.
fn rewrite_per_package(
    sources: &HashMap<String, String>,
    packages: &[(String, ExportMap)],
) -> HashMap<String, TransformResult> {
    let mut results: HashMap<String, TransformResult> = HashMap::new();
    for (package, exports) in packages {
        let batch: HashMap<String, String> = sources
            .iter()
            .map(|(filename, text)| (filename, results.get(filename).map_or(text, |r| &r.code)))
            .filter(|(_, text)| mentions_package(text, package))
            .map(|(filename, text)| (filename.clone(), text.clone()))
            .collect();
        debug!("Rewriting imports of '{}' in {} files", package, batch.len());

        for (filename, result) in rewrite_many(&batch, exports, std::slice::from_ref(package), None) {
            match results.entry(filename) {
                Entry::Occupied(mut slot) => slot.get_mut().absorb(result),
                Entry::Vacant(slot) => {
                    slot.insert(result);
                }
            }
        }
    }
    results
}

/// Counts unresolved names and writes rewritten files back when `write` is
/// set. Runs only once every file has been rewritten; a failed write is
/// recorded on its file and the others are still written.
fn finish_files(
    results: HashMap<String, TransformResult>,
    root: &Path,
    write: bool,
    unresolved_counts: &DashMap<String, usize>,
) -> Vec<FileReport> {
    results
        .into_par_iter()
        .filter_map(|(filename, result)| {
            debug!("Thread {:?} finishing: {}", thread::current().id(), filename);
            for warning in &result.warnings {
                if let RewriteWarning::UnresolvedExport { name, .. } = warning {
                    *unresolved_counts.entry(name.clone()).or_insert(0) += 1;
                }
            }

            let write_error = if write && result.transformed {
                write_back(&filename, &result.code)
            } else {
                None
            };

            if result.optimized.is_empty()
                && result.skipped.is_empty()
                && result.warnings.is_empty()
                && write_error.is_none()
            {
                return None;
            }

            let path = Path::new(&filename);
            Some(FileReport {
                path: path.strip_prefix(root).unwrap_or(path).to_path_buf(),
                transformed: result.transformed,
                optimized: result.optimized,
                skipped: result.skipped,
                warnings: result.warnings,
                write_error,
            })
        })
        .collect()
}

fn write_back(filename: &str, code: &str) -> Option<String> {
    match fs::write(filename, code) {
        Ok(()) => {
            debug!("Wrote {}", filename);
            None
        }
        Err(e) => {
            warn!("Failed to write {}: {}", filename, e);
            Some(e.to_string())
        }
    }
}

fn mentions_package(text: &str, package: &str) -> bool {
    text.contains(&format!("'{}'", package)) || text.contains(&format!("\"{}\"", package))
}

/// Reads the files that mention a target package as a quoted specifier.
/// Unreadable files and paths that are not valid UTF-8 are logged and left
/// out, since files are keyed by their path string.
fn read_candidate_sources(files: &[PathBuf], targets: &[String]) -> HashMap<String, String> {
    files
        .par_iter()
        .filter_map(|path| {
            let Some(filename) = path.to_str() else {
                warn!("Skipping {}: path is not valid UTF-8", path.display());
                return None;
            };
            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    return None;
                }
            };
            if !targets.iter().any(|target| mentions_package(&text, target)) {
                trace!("No target package imported by {}", path.display());
                return None;
            }
            Some((filename.to_string(), text))
        })
        .collect()
}
