use debarrel_core::ResolutionError;
use std::{fmt, path::PathBuf};

use thiserror::Error;

/// Options for one [`rewrite`](crate::rewrite) call.
#[derive(Debug, Clone)]
pub struct RewriteOptions {
    /// Name of the file being rewritten; its extension picks the parser
    /// dialect and it labels diagnostics.
    pub filename: String,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self { filename: "module.tsx".to_string() }
    }
}

impl RewriteOptions {
    pub fn new(filename: impl Into<String>) -> Self {
        Self { filename: filename.into() }
    }
}

/// Why an import from a target package was left as it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    Namespace,
    SideEffect,
    ImportAttributes,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::Namespace => "namespace import",
            SkipReason::SideEffect => "side-effect import",
            SkipReason::ImportAttributes => "import attributes",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedImport {
    pub source: String,
    pub reason: SkipReason,
}

/// One barrel import that was split into direct imports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizedImport {
    pub original_source: String,
    /// `"Button → pkg/Button"` for every binding that now imports directly.
    pub rewrites: Vec<String>,
}

/// Diagnostics raised while rewriting one file. None of them abort the
/// rewrite; the affected import keeps its original form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteWarning {
    #[error("'{name}' could not be resolved in '{specifier}', keeping the original import")]
    UnresolvedExport { name: String, specifier: String },

    #[error("skipping {reason} of '{specifier}'")]
    UnsafePattern { specifier: String, reason: SkipReason },

    #[error("failed to parse {filename}: {message}")]
    ParseFailure { filename: String, message: String },

    #[error("rewritten {filename} does not parse ({message}), keeping the original source")]
    PrintFailure { filename: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub code: String,
    /// Whether `code` differs from the input.
    pub transformed: bool,
    pub skipped: Vec<SkippedImport>,
    pub optimized: Vec<OptimizedImport>,
    pub warnings: Vec<RewriteWarning>,
}

impl TransformResult {
    pub(crate) fn unchanged(source_text: &str) -> Self {
        Self {
            code: source_text.to_string(),
            transformed: false,
            skipped: Vec::new(),
            optimized: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Folds in the result of rewriting `self.code` again.
    pub(crate) fn absorb(&mut self, next: TransformResult) {
        if next.transformed {
            self.code = next.code;
            self.transformed = true;
        }
        self.skipped.extend(next.skipped);
        self.optimized.extend(next.optimized);
        self.warnings.extend(next.warnings);
    }
}

/// Outcome of one file in a project run.
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Relative to the project root.
    pub path: PathBuf,
    pub transformed: bool,
    pub optimized: Vec<OptimizedImport>,
    pub skipped: Vec<SkippedImport>,
    pub warnings: Vec<RewriteWarning>,
    /// Set when the rewritten source could not be written back.
    pub write_error: Option<String>,
}

#[derive(Debug)]
pub struct FailedPackage {
    pub package: String,
    pub error: ResolutionError,
}

#[derive(Debug, Default)]
pub struct RunReport {
    /// Files with anything to report, sorted by path.
    pub files: Vec<FileReport>,
    pub failed_packages: Vec<FailedPackage>,
    /// Names that could not be resolved, most frequent first.
    pub unresolved: Vec<(String, usize)>,
    pub files_scanned: usize,
    pub files_parsed: usize,
    pub exports_resolved: usize,
    pub written: bool,
}

impl RunReport {
    pub fn files_rewritten(&self) -> usize {
        self.files.iter().filter(|f| f.transformed).count()
    }

    pub fn imports_optimized(&self) -> usize {
        self.files.iter().map(|f| f.optimized.len()).sum()
    }

    pub fn imports_skipped(&self) -> usize {
        self.files.iter().map(|f| f.skipped.len()).sum()
    }

    pub fn write_failures(&self) -> usize {
        self.files.iter().filter(|f| f.write_error.is_some()).count()
    }
}
