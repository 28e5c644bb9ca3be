//! Constants for file extensions, resolution order and package layout.
//!
//! Everything that walks, resolves or canonicalizes module paths reads its
//! extension lists from here so the three stay in agreement.

/// File extensions for JavaScript/TypeScript source files
pub const JS_TS_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Extensions to try when resolving module imports (in priority order)
pub const RESOLVE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Index file names to try when resolving directory imports
pub const INDEX_FILES: &[&str] = &[
    "index.ts",
    "index.tsx",
    "index.mts",
    "index.cts",
    "index.js",
    "index.jsx",
    "index.mjs",
    "index.cjs",
];

/// Declaration-file suffixes, stripped whole when canonicalizing.
pub const DECLARATION_SUFFIXES: &[&str] = &[".d.ts", ".d.mts", ".d.cts"];

/// Leading build-output directories dropped from canonical specifiers.
pub const DIST_DIRS: &[&str] = &["dist", "esm", "cjs", "lib", "build", "es", "umd", "module"];

/// Conditional-export keys, in the order they are tried.
pub const CONDITION_PRIORITY: &[&str] = &["import", "module", "default", "require", "node"];

/// Never followed when picking a conditional export.
pub const TYPES_CONDITION: &str = "types";

/// Entry used when a manifest names none.
pub const FALLBACK_ENTRY: &str = "index.js";

pub const NODE_MODULES: &str = "node_modules";

pub const MANIFEST_FILE: &str = "package.json";
