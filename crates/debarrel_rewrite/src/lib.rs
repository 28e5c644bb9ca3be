//! Barrel import rewriting for JavaScript/TypeScript projects.
//!
//! Imports such as `import { Button, Input } from 'pkg'` pull a package's
//! whole barrel file into the module graph. Given the package's
//! [`ExportMap`](debarrel_core::ExportMap), this crate splits them into one
//! direct import per binding (`import { Button } from 'pkg/Button'`) so
//! bundlers can drop the unused parts.
//!
//! # Examples
//!
//! ```no_run
//! use debarrel_core::{ResolveOptions, resolve};
//! use debarrel_rewrite::{RewriteOptions, rewrite};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let exports = resolve("@acme/ui", Path::new("/path/to/project"), &ResolveOptions::default())?;
//! let result = rewrite(
//!     "import { Button } from '@acme/ui';",
//!     &exports,
//!     &["@acme/ui".to_string()],
//!     &RewriteOptions::new("App.tsx"),
//! );
//! println!("{}", result.code);
//! # Ok(())
//! # }
//! ```

mod builder;
mod classify;
mod config;
mod reporter;
mod rewriter;
mod runner;
mod types;

// Re-export public API
pub use classify::{ImportShape, NamedBinding};
pub use config::Config;
pub use reporter::{print_no_changes_message, print_report};
pub use rewriter::{rewrite, rewrite_many};
pub use runner::run_rewrite;
pub use types::{
    FailedPackage, FileReport, OptimizedImport, RewriteOptions, RewriteWarning, RunReport,
    SkipReason, SkippedImport, TransformResult,
};
