//! Export-graph resolution for JavaScript/TypeScript packages.
//!
//! This crate answers "which file actually declares each export of a
//! package?" for packages installed under `node_modules`:
//! - Locating a package's entry point from its `package.json`
//! - Resolving relative module specifiers to files
//! - Parsing a file's export surface with oxc
//! - Walking the re-export graph into an [`ExportMap`]
//! - Turning a defining file back into a direct import specifier
//! - Collecting project source files and finding the git root

mod canonical;
mod collector;
mod config;
mod constants;
pub mod error;
mod graph;
mod manifest;
mod parser;
mod resolver;
mod types;

// Re-export public API
pub use canonical::{canonical_specifier, package_name_of};
pub use collector::{CollectorConfig, collect_sources};
pub use config::{find_git_root, git_root_from};
pub use constants::{INDEX_FILES, JS_TS_EXTENSIONS, RESOLVE_EXTENSIONS};
pub use error::{ParseError, ResolutionError};
pub use graph::{ResolveOptions, resolve, resolve_many};
pub use manifest::{entry_point, package_dir, pick_condition, root_export_target};
pub use parser::{module_record_from_source, parse_module_record, source_type_for};
pub use resolver::{is_relative_specifier, resolve_relative};
pub use types::{ExportBinding, ExportMap, ModuleRecord, ReExport, ReExportName};
