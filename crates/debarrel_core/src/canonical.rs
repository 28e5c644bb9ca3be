//! Conversion of a defining file inside `node_modules` into the direct,
//! package-relative specifier that imports it.

use std::path::{Component, Path};

use crate::constants::{DECLARATION_SUFFIXES, DIST_DIRS, JS_TS_EXTENSIONS, NODE_MODULES};

/// `/repo/node_modules/@acme/ui/dist/Button/Button.js` → `@acme/ui/Button`.
///
/// The last `node_modules` segment is the boundary, so pnpm's nested store
/// layout maps to the same specifier as a hoisted install. Returns `None`
/// for paths outside any `node_modules` directory.
pub fn canonical_specifier(file: &Path) -> Option<String> {
    let segments: Vec<&str> = file
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    let boundary = segments.iter().rposition(|s| *s == NODE_MODULES)?;
    let rest = &segments[boundary + 1..];

    let (package, mut sub_path) = match rest {
        [scope, name, tail @ ..] if scope.starts_with('@') => (format!("{}/{}", scope, name), tail.to_vec()),
        [scope, ..] if scope.starts_with('@') => return None,
        [name, tail @ ..] => (name.to_string(), tail.to_vec()),
        [] => return None,
    };

    if sub_path.len() > 1 && DIST_DIRS.contains(&sub_path[0]) {
        sub_path.remove(0);
    }

    if let Some(last) = sub_path.pop() {
        let stem = strip_source_extension(last);
        if stem != "index" {
            sub_path.push(stem);
        }
    }

    // `Button/Button` → `Button`
    if let [.., dir, file] = sub_path.as_slice()
        && dir == file
    {
        sub_path.pop();
    }

    Some(
        std::iter::once(package.as_str())
            .chain(sub_path)
            .collect::<Vec<_>>()
            .join("/"),
    )
}

/// The package a bare specifier belongs to: `@acme/ui/Button` → `@acme/ui`,
/// `lodash/merge` → `lodash`.
pub fn package_name_of(specifier: &str) -> &str {
    let mut separators = specifier.match_indices('/').map(|(i, _)| i);
    let end = if specifier.starts_with('@') {
        separators.nth(1)
    } else {
        separators.next()
    };
    end.map_or(specifier, |i| &specifier[..i])
}

fn strip_source_extension(file_name: &str) -> &str {
    if let Some(stem) = DECLARATION_SUFFIXES.iter().find_map(|suffix| file_name.strip_suffix(suffix)) {
        return stem;
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if JS_TS_EXTENSIONS.contains(&ext) => stem,
        _ => file_name,
    }
}
