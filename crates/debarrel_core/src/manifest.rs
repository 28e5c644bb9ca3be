//! Package entry-point discovery from `package.json`.
//!
//! Lookup order is the conditional `exports` map's `"."` target, then the
//! `module` field, then `main`, then `index.js`. Each candidate goes through
//! the same file resolution as relative imports and falls through when it
//! does not exist on disk.

use log::{debug, trace};
use path_clean::clean;
use serde_json::Value;
use std::{
    fs, iter,
    path::{Path, PathBuf},
};

use crate::{
    constants::{CONDITION_PRIORITY, FALLBACK_ENTRY, MANIFEST_FILE, NODE_MODULES, TYPES_CONDITION},
    error::ResolutionError,
    resolver::{is_relative_specifier, resolve_file},
};

/// Finds `node_modules/<package_name>` in `root` or the nearest ancestor that has it.
pub fn package_dir(package_name: &str, root: &Path) -> Result<PathBuf, ResolutionError> {
    let not_found = || ResolutionError::PackageNotFound {
        package: package_name.to_string(),
        root: root.to_path_buf(),
    };
    if package_name.is_empty()
        || is_relative_specifier(package_name)
        || Path::new(package_name).is_absolute()
    {
        return Err(not_found());
    }

    for dir in root.ancestors() {
        let candidate = dir.join(NODE_MODULES).join(package_name);
        trace!("Looking for package '{}' at {}", package_name, candidate.display());
        if candidate.is_dir() {
            return Ok(candidate);
        }
    }
    Err(not_found())
}

/// Resolves the module entry file of `package_name` as seen from `root`.
pub fn entry_point(package_name: &str, root: &Path) -> Result<PathBuf, ResolutionError> {
    let dir = package_dir(package_name, root)?;
    let manifest_path = dir.join(MANIFEST_FILE);
    let text = fs::read_to_string(&manifest_path).map_err(|source| {
        ResolutionError::ManifestUnreadable { path: manifest_path.clone(), source }
    })?;
    let manifest: Value = serde_json::from_str(&text)
        .map_err(|source| ResolutionError::ManifestInvalid { path: manifest_path, source })?;

    entry_from_manifest(package_name, &dir, &manifest)
}

fn entry_from_manifest(
    package_name: &str,
    dir: &Path,
    manifest: &Value,
) -> Result<PathBuf, ResolutionError> {
    let candidates = manifest
        .get("exports")
        .and_then(root_export_target)
        .into_iter()
        .chain(["module", "main"].iter().filter_map(|field| manifest.get(*field)?.as_str()))
        .chain(iter::once(FALLBACK_ENTRY));

    for candidate in candidates {
        if let Some(entry) = resolve_file(&clean(dir.join(candidate))) {
            debug!("Entry point of '{}' is {}", package_name, entry.display());
            return Ok(entry);
        }
        trace!("Entry candidate '{}' of '{}' does not exist", candidate, package_name);
    }

    Err(ResolutionError::EntryNotFound { package: package_name.to_string(), dir: dir.to_path_buf() })
}

/// The target of the package root (`"."`) in an `exports` field.
pub fn root_export_target(exports: &Value) -> Option<&str> {
    match exports {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.iter().find_map(root_export_target),
        Value::Object(map) if map.keys().any(|k| k.starts_with('.')) => {
            map.get(".").and_then(pick_condition)
        }
        // Bare condition object: the conditions apply to "."
        Value::Object(_) => pick_condition(exports),
        _ => None,
    }
}

/// First string reachable through priority-ordered condition keys, then the
/// remaining keys in manifest order. The `types` branch is never taken.
pub fn pick_condition(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.iter().find_map(pick_condition),
        Value::Object(map) => {
            let preferred = CONDITION_PRIORITY.iter().filter_map(|key| map.get(*key));
            let others = map
                .iter()
                .filter(|(key, _)| {
                    key.as_str() != TYPES_CONDITION && !CONDITION_PRIORITY.contains(&key.as_str())
                })
                .map(|(_, v)| v);
            preferred.chain(others).find_map(pick_condition)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    fn canonical(p: PathBuf) -> PathBuf {
        p.canonicalize().unwrap()
    }

    #[test]
    fn test_pick_condition_prefers_import_over_require() {
        let value = json!({ "require": "./cjs/index.js", "import": "./esm/index.js" });
        assert_eq!(pick_condition(&value), Some("./esm/index.js"));
    }

    #[test]
    fn test_pick_condition_skips_types_at_every_depth() {
        let value = json!({
            "types": "./index.d.ts",
            "node": { "types": "./node.d.ts", "default": "./node.js" }
        });
        assert_eq!(pick_condition(&value), Some("./node.js"));
    }

    #[test]
    fn test_pick_condition_nested_import_default() {
        let value = json!({
            "import": { "types": "./dist/index.d.mts", "default": "./dist/index.mjs" },
            "require": { "types": "./dist/index.d.ts", "default": "./dist/index.js" }
        });
        assert_eq!(pick_condition(&value), Some("./dist/index.mjs"));
    }

    #[test]
    fn test_pick_condition_only_types() {
        assert_eq!(pick_condition(&json!({ "types": "./index.d.ts" })), None);
        assert_eq!(pick_condition(&json!(null)), None);
    }

    #[test]
    fn test_root_export_target_shapes() {
        assert_eq!(root_export_target(&json!("./main.js")), Some("./main.js"));
        assert_eq!(
            root_export_target(&json!({ ".": "./root.js", "./sub": "./sub.js" })),
            Some("./root.js")
        );
        assert_eq!(
            root_export_target(&json!({ "import": "./a.mjs", "require": "./a.cjs" })),
            Some("./a.mjs")
        );
        assert_eq!(root_export_target(&json!({ "./sub": "./sub.js" })), None);
        assert_eq!(root_export_target(&json!([{ "import": "./x.mjs" }, "./x.js"])), Some("./x.mjs"));
    }

    #[test]
    fn test_entry_from_exports_map() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(
            root,
            "node_modules/pkg/package.json",
            r#"{
  "main": "./cjs/index.js",
  "module": "./esm/legacy.js",
  "exports": { ".": { "types": "./index.d.ts", "import": "./esm/index.js", "require": "./cjs/index.js" } }
}"#,
        );
        let esm = create_test_file(root, "node_modules/pkg/esm/index.js", "");
        create_test_file(root, "node_modules/pkg/esm/legacy.js", "");
        create_test_file(root, "node_modules/pkg/cjs/index.js", "");

        assert_eq!(entry_point("pkg", root).unwrap(), canonical(esm));
    }

    #[test]
    fn test_entry_from_module_field() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(
            root,
            "node_modules/pkg/package.json",
            r#"{ "main": "lib/index.js", "module": "es/index" }"#,
        );
        let es = create_test_file(root, "node_modules/pkg/es/index.js", "");
        create_test_file(root, "node_modules/pkg/lib/index.js", "");

        assert_eq!(entry_point("pkg", root).unwrap(), canonical(es));
    }

    #[test]
    fn test_missing_exports_target_falls_through_to_main() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(
            root,
            "node_modules/pkg/package.json",
            r#"{ "exports": "./gone.js", "main": "main.js" }"#,
        );
        let main = create_test_file(root, "node_modules/pkg/main.js", "");

        assert_eq!(entry_point("pkg", root).unwrap(), canonical(main));
    }

    #[test]
    fn test_index_js_fallback_for_scoped_package() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "node_modules/@acme/ui/package.json", r#"{ "name": "@acme/ui" }"#);
        let index = create_test_file(root, "node_modules/@acme/ui/index.js", "");

        assert_eq!(entry_point("@acme/ui", root).unwrap(), canonical(index));
    }

    #[test]
    fn test_package_found_in_ancestor_node_modules() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        create_test_file(root, "node_modules/pkg/package.json", r#"{ "main": "index.js" }"#);
        let index = create_test_file(root, "node_modules/pkg/index.js", "");
        let app = root.join("apps/web");
        fs::create_dir_all(&app).unwrap();

        assert_eq!(entry_point("pkg", &app).unwrap(), canonical(index));
    }

    #[test]
    fn test_missing_package() {
        let temp_dir = TempDir::new().unwrap();
        let err = entry_point("nope", temp_dir.path()).unwrap_err();
        assert!(matches!(err, ResolutionError::PackageNotFound { .. }));
    }

    #[test]
    fn test_missing_manifest() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(temp_dir.path(), "node_modules/pkg/index.js", "");
        let err = entry_point("pkg", temp_dir.path()).unwrap_err();
        assert!(matches!(err, ResolutionError::ManifestUnreadable { .. }));
    }

    #[test]
    fn test_invalid_manifest() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(temp_dir.path(), "node_modules/pkg/package.json", "{ not json");
        let err = entry_point("pkg", temp_dir.path()).unwrap_err();
        assert!(matches!(err, ResolutionError::ManifestInvalid { .. }));
    }

    #[test]
    fn test_entry_file_does_not_exist() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(temp_dir.path(), "node_modules/pkg/package.json", r#"{ "main": "x.js" }"#);
        let err = entry_point("pkg", temp_dir.path()).unwrap_err();
        assert!(matches!(err, ResolutionError::EntryNotFound { .. }));
    }
}
