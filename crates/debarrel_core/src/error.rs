//! Error types for package resolution and export-surface parsing.
//!
//! Only [`ResolutionError`] ever reaches a caller of `resolve`; a
//! [`ParseError`] is logged and the offending file contributes no exports.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The package or its entry point could not be located.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("package '{package}' was not found in any node_modules above {}", .root.display())]
    PackageNotFound { package: String, root: PathBuf },

    #[error("failed to read manifest {}", .path.display())]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("manifest {} is not valid JSON", .path.display())]
    ManifestInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no entry point for package '{package}' exists under {}", .dir.display())]
    EntryNotFound { package: String, dir: PathBuf },

    #[error("resolution of package '{package}' was cancelled")]
    Cancelled { package: String },
}

/// A source file could not be parsed.
#[derive(Debug, Clone, Error)]
#[error("failed to parse {}: {message}", .path.display())]
pub struct ParseError {
    pub path: PathBuf,
    pub message: String,
}
