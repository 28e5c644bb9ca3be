use debarrel_core::{ExportMap, canonical_specifier, package_name_of, source_type_for};
use log::{debug, trace, warn};
use oxc_allocator::Allocator;
use oxc_ast::ast::{ImportDeclaration, Statement};
use oxc_parser::{Parser, ParserReturn};
use oxc_span::{SourceType, Span};
use rayon::prelude::*;
use std::{
    collections::HashMap,
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::{
    builder::{ImportStyle, default_import, named_import},
    classify::{ImportShape, NamedBinding, classify},
    types::{
        OptimizedImport, RewriteOptions, RewriteWarning, SkipReason, SkippedImport, TransformResult,
    },
};

/// Splits imports of `target_packages` into direct imports of the files that
/// declare each binding.
///
/// Only specifiers exactly equal to a target package are considered. Any
/// binding that cannot be resolved keeps importing from the barrel, so the
/// set of local bindings never changes. Malformed input yields the source
/// unchanged with a [`RewriteWarning::ParseFailure`].
pub fn rewrite(
    source_text: &str,
    exports: &ExportMap,
    target_packages: &[String],
    options: &RewriteOptions,
) -> TransformResult {
    let source_type = source_type_for(Path::new(&options.filename));
    let allocator = Allocator::default();
    let ParserReturn { program, errors, panicked, .. } =
        Parser::new(&allocator, source_text, source_type).parse();

    let mut result = TransformResult::unchanged(source_text);
    if panicked || !errors.is_empty() {
        let message =
            errors.first().map(|e| e.to_string()).unwrap_or_else(|| "parser aborted".to_string());
        warn!("Not rewriting {}: {}", options.filename, message);
        result
            .warnings
            .push(RewriteWarning::ParseFailure { filename: options.filename.clone(), message });
        return result;
    }

    let mut edits: Vec<(Span, String)> = Vec::new();
    for stmt in &program.body {
        let Statement::ImportDeclaration(decl) = stmt else { continue };
        let specifier = decl.source.value.as_str();
        if !target_packages.iter().any(|p| p == specifier) {
            continue;
        }
        trace!("Classifying import of '{}' in {}", specifier, options.filename);

        if decl.with_clause.is_some() {
            skip(&mut result, specifier, SkipReason::ImportAttributes);
            continue;
        }

        let (default_local, named) = match classify(decl) {
            ImportShape::Namespace => {
                skip(&mut result, specifier, SkipReason::Namespace);
                continue;
            }
            ImportShape::SideEffect => {
                skip(&mut result, specifier, SkipReason::SideEffect);
                continue;
            }
            ImportShape::DefaultOnly => {
                trace!("Keeping default import of '{}'", specifier);
                continue;
            }
            ImportShape::Named(named) => (None, named),
            ImportShape::DefaultPlusNamed { default_local, named } => (Some(default_local), named),
        };

        if let Some(replacement) =
            split_import(source_text, decl, default_local.as_deref(), &named, exports, &mut result)
        {
            edits.push((decl.span, replacement));
        }
    }

    if edits.is_empty() {
        return result;
    }

    let code = splice(source_text, &edits);
    if let Some(message) = first_parse_error(&code, source_type) {
        warn!("Reverting {}: rewritten source does not parse: {}", options.filename, message);
        result.optimized.clear();
        result
            .warnings
            .push(RewriteWarning::PrintFailure { filename: options.filename.clone(), message });
        return result;
    }

    debug!("Rewrote {} barrel imports in {}", edits.len(), options.filename);
    result.code = code;
    result.transformed = true;
    result
}

/// Rewrites every file in parallel. Files are keyed by name, which also
/// picks their parser dialect.
///
/// `cancel` is checked before each file; files not yet started when it is
/// set are absent from the result.
pub fn rewrite_many(
    files: &HashMap<String, String>,
    exports: &ExportMap,
    target_packages: &[String],
    cancel: Option<&AtomicBool>,
) -> HashMap<String, TransformResult> {
    debug!("Rewriting {} files in parallel", files.len());
    files
        .par_iter()
        .filter_map(|(filename, source_text)| {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                trace!("Cancelled before rewriting {}", filename);
                return None;
            }
            let options = RewriteOptions::new(filename.clone());
            Some((filename.clone(), rewrite(source_text, exports, target_packages, &options)))
        })
        .collect()
}

/// Replacement text for `decl`, or `None` when no binding resolved and the
/// statement keeps its original bytes.
fn split_import(
    source_text: &str,
    decl: &ImportDeclaration<'_>,
    default_local: Option<&str>,
    named: &[NamedBinding],
    exports: &ExportMap,
    result: &mut TransformResult,
) -> Option<String> {
    let specifier = decl.source.value.as_str();
    let style = ImportStyle::detect(source_text, decl.span, decl.source.span);
    let type_only = decl.import_kind.is_type();

    let mut statements = Vec::with_capacity(named.len() + 1);
    if let Some(local) = default_local {
        statements.push(default_import(&style, local, specifier, type_only));
    }

    let mut rewrites = Vec::new();
    for binding in named {
        match direct_target(exports, &binding.imported, specifier) {
            Ok(Some((name, canonical))) => {
                statements.push(named_import(
                    &style,
                    &name,
                    &binding.local,
                    &canonical,
                    type_only,
                    binding.is_type_only,
                ));
                rewrites.push(format!("{} → {}", binding.imported, canonical));
            }
            Ok(None) => {
                trace!("'{}' is declared in the entry of '{}'", binding.imported, specifier);
                statements.push(barrel_import(&style, binding, specifier, type_only));
            }
            Err(warning) => {
                warn!("{}", warning);
                result.warnings.push(warning);
                statements.push(barrel_import(&style, binding, specifier, type_only));
            }
        }
    }

    if rewrites.is_empty() {
        return None;
    }
    result.optimized.push(OptimizedImport { original_source: specifier.to_string(), rewrites });
    Some(statements.join(&style.separator()))
}

/// The direct specifier and in-file export name for `imported`.
///
/// `Ok(None)` means the binding already lives in the file `specifier` points
/// at (the package entry), so importing it from there is already direct.
fn direct_target(
    exports: &ExportMap,
    imported: &str,
    specifier: &str,
) -> Result<Option<(String, String)>, RewriteWarning> {
    let unresolved = || RewriteWarning::UnresolvedExport {
        name: imported.to_string(),
        specifier: specifier.to_string(),
    };

    let binding = exports.binding(imported).ok_or_else(unresolved)?;
    if exports.is_declared_in_entry(imported) {
        trace!("'{}' is declared in the entry of '{}'", imported, specifier);
        return Ok(None);
    }
    let canonical = canonical_specifier(&binding.file).ok_or_else(unresolved)?;
    if canonical == specifier {
        return Ok(None);
    }
    if package_name_of(&canonical) != package_name_of(specifier) {
        debug!("'{}' resolved to '{}' outside '{}'", imported, canonical, specifier);
        return Err(unresolved());
    }
    Ok(Some((binding.name.clone(), canonical)))
}

fn barrel_import(
    style: &ImportStyle,
    binding: &NamedBinding,
    specifier: &str,
    type_only: bool,
) -> String {
    named_import(style, &binding.imported, &binding.local, specifier, type_only, binding.is_type_only)
}

fn skip(result: &mut TransformResult, specifier: &str, reason: SkipReason) {
    let warning = RewriteWarning::UnsafePattern { specifier: specifier.to_string(), reason };
    warn!("{}", warning);
    result.skipped.push(SkippedImport { source: specifier.to_string(), reason });
    result.warnings.push(warning);
}

/// Replaces each span with its text; spans are in source order and disjoint.
fn splice(source_text: &str, edits: &[(Span, String)]) -> String {
    let mut out = String::with_capacity(source_text.len() + edits.len() * 64);
    let mut cursor = 0;
    for (span, replacement) in edits {
        out.push_str(&source_text[cursor..span.start as usize]);
        out.push_str(replacement);
        cursor = span.end as usize;
    }
    out.push_str(&source_text[cursor..]);
    out
}

fn first_parse_error(code: &str, source_type: SourceType) -> Option<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, source_type).parse();
    if ret.panicked {
        return Some("parser aborted".to_string());
    }
    ret.errors.first().map(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use debarrel_core::ExportBinding;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    const PKG: &str = "/repo/node_modules/pkg";

    fn exports(entries: &[(&str, &str, &str)]) -> ExportMap {
        entries
            .iter()
            .map(|(key, file, name)| {
                (key.to_string(), ExportBinding::new(PathBuf::from(PKG).join(file), *name))
            })
            .collect()
    }

    fn button_and_input() -> ExportMap {
        exports(&[("Button", "Button.js", "Button"), ("Input", "Input.js", "Input")])
    }

    fn targets() -> Vec<String> {
        vec!["pkg".to_string()]
    }

    fn run(src: &str, map: &ExportMap) -> TransformResult {
        rewrite(src, map, &targets(), &RewriteOptions::default())
    }

    #[test]
    fn test_named_imports_are_split() {
        let result = run("import { Button, Input } from 'pkg';\n", &button_and_input());
        assert_eq!(
            result.code,
            "import { Button } from 'pkg/Button';\nimport { Input } from 'pkg/Input';\n"
        );
        assert!(result.transformed);
        assert_eq!(
            result.optimized,
            vec![OptimizedImport {
                original_source: "pkg".into(),
                rewrites: vec!["Button → pkg/Button".into(), "Input → pkg/Input".into()],
            }]
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_namespace_import_is_skipped() {
        let src = "import * as Pkg from 'pkg';";
        let result = run(src, &button_and_input());
        assert_eq!(result.code, src);
        assert!(!result.transformed);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].source, "pkg");
        assert!(result.skipped[0].reason.to_string().contains("namespace"));
    }

    #[test]
    fn test_unknown_name_keeps_original_import() {
        let src = "import { Unknown } from 'pkg';";
        let result = run(src, &ExportMap::new());
        assert_eq!(result.code, src);
        assert!(!result.transformed);
        assert!(result.optimized.is_empty());
        assert_eq!(
            result.warnings,
            vec![RewriteWarning::UnresolvedExport { name: "Unknown".into(), specifier: "pkg".into() }]
        );
    }

    #[test]
    fn test_partially_resolved_keeps_unresolved_on_barrel() {
        let result = run("import { Button, Missing as M } from 'pkg';", &button_and_input());
        assert_eq!(
            result.code,
            "import { Button } from 'pkg/Button';\nimport { Missing as M } from 'pkg';"
        );
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_default_plus_named() {
        let result = run("import Pkg, { Button as B } from 'pkg'", &button_and_input());
        assert_eq!(result.code, "import Pkg from 'pkg'\nimport { Button as B } from 'pkg/Button'");
    }

    #[test]
    fn test_default_only_and_side_effect_are_untouched() {
        let src = "import Pkg from 'pkg';\nimport 'pkg';\nimport {} from 'pkg';\n";
        let result = run(src, &button_and_input());
        assert_eq!(result.code, src);
        let reasons: Vec<_> = result.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(reasons, vec![SkipReason::SideEffect, SkipReason::SideEffect]);
    }

    #[test]
    fn test_import_attributes_are_skipped() {
        let src = "import { Button } from 'pkg' with { type: 'json' };";
        let result = run(src, &button_and_input());
        assert_eq!(result.code, src);
        assert_eq!(result.skipped[0].reason, SkipReason::ImportAttributes);
    }

    #[test]
    fn test_subpath_and_other_packages_are_untouched() {
        let src = "import { Button } from 'pkg/Button';\nimport { useState } from 'react';\n";
        let result = run(src, &button_and_input());
        assert_eq!(result.code, src);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_rewriting_is_idempotent() {
        let first = run("import { Button, Input } from 'pkg';", &button_and_input());
        let second = run(&first.code, &button_and_input());
        assert_eq!(second.code, first.code);
        assert!(!second.transformed);
    }

    #[test]
    fn test_renamed_default_export_becomes_default_import() {
        let map = exports(&[("Card", "dist/Card/Card.js", "default")]);
        let result = run("import { Card as MyCard } from 'pkg';", &map);
        assert_eq!(result.code, "import MyCard from 'pkg/Card';");
    }

    #[test]
    fn test_renamed_named_export_uses_inner_name() {
        let map = exports(&[("Foo", "esm/inner.js", "Inner")]);
        let result = run("import { Foo as Bar, Foo } from 'pkg';", &map);
        assert_eq!(
            result.code,
            "import { Inner as Bar } from 'pkg/inner';\nimport { Inner as Foo } from 'pkg/inner';"
        );
    }

    #[test]
    fn test_export_declared_in_barrel_entry_stays() {
        let map = exports(&[("VERSION", "index.js", "VERSION"), ("Button", "Button.js", "Button")]);
        let result = run("import { VERSION, Button } from 'pkg';", &map);
        assert_eq!(result.code, "import { VERSION } from 'pkg';\nimport { Button } from 'pkg/Button';");
        assert!(result.warnings.is_empty());
        assert_eq!(result.optimized[0].rewrites, vec!["Button → pkg/Button".to_string()]);
    }

    #[test]
    fn test_export_declared_in_dist_entry_stays() {
        let map = exports(&[
            ("VERSION", "dist/esm/index.js", "VERSION"),
            ("Button", "dist/esm/Button.js", "Button"),
        ])
        .with_entry(PathBuf::from(PKG).join("dist/esm/index.js"));
        let result = run("import { VERSION, Button } from 'pkg';", &map);
        assert_eq!(result.code, "import { VERSION } from 'pkg';\nimport { Button } from 'pkg/esm/Button';");
        assert!(result.warnings.is_empty());
        assert_eq!(result.optimized[0].rewrites, vec!["Button → pkg/esm/Button".to_string()]);
    }

    #[test]
    fn test_unparsable_output_reverts_whole_file() {
        let map = exports(&[("Button", "Button.js", "Button"), ("Odd", "a\nb.js", "Odd")]);
        let src = "import { Button } from 'pkg';\nimport { Odd } from 'pkg';\n";
        let result = run(src, &map);
        assert_eq!(result.code, src);
        assert!(!result.transformed);
        assert!(result.optimized.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert!(matches!(
            &result.warnings[0],
            RewriteWarning::PrintFailure { filename, .. } if filename == "module.tsx"
        ));
    }

    #[test]
    fn test_binding_in_another_package_is_unresolved() {
        let map: ExportMap = [(
            "Button".to_string(),
            ExportBinding::new("/repo/node_modules/other/Button.js", "Button"),
        )]
        .into_iter()
        .collect();
        let src = "import { Button } from 'pkg';";
        let result = run(src, &map);
        assert_eq!(result.code, src);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_type_only_imports() {
        let map = exports(&[("Props", "types/Props.d.ts", "Props"), ("Button", "Button.js", "Button")]);
        let result = run("import type { Props } from 'pkg';\nimport { type Props as P, Button } from 'pkg';", &map);
        assert_eq!(
            result.code,
            "import type { Props } from 'pkg/types/Props';\nimport { type Props as P } from 'pkg/types/Props';\nimport { Button } from 'pkg/Button';"
        );
    }

    #[test]
    fn test_style_is_preserved() {
        let src = "function setup() {}\n  import { Button, Input } from \"pkg\"\nsetup()\n";
        let result = run(src, &button_and_input());
        assert_eq!(
            result.code,
            "function setup() {}\n  import { Button } from \"pkg/Button\"\n  import { Input } from \"pkg/Input\"\nsetup()\n"
        );
    }

    #[test]
    fn test_other_statements_keep_their_bytes() {
        let src = "// header\nimport React from 'react';\nimport { Button } from 'pkg';\n\nexport const App = () => <Button />;\n";
        let result = run(src, &button_and_input());
        assert_eq!(
            result.code,
            "// header\nimport React from 'react';\nimport { Button } from 'pkg/Button';\n\nexport const App = () => <Button />;\n"
        );
    }

    #[test]
    fn test_parse_failure_is_a_no_op() {
        let src = "import { Button } from 'pkg';\nconst = ;";
        let result = run(src, &button_and_input());
        assert_eq!(result.code, src);
        assert!(!result.transformed);
        assert!(matches!(result.warnings[0], RewriteWarning::ParseFailure { .. }));
    }

    #[test]
    fn test_dialect_follows_filename() {
        let src = "import { Button } from 'pkg';\nconst x = <T,>(v: T) => v;";
        let result = rewrite(src, &button_and_input(), &targets(), &RewriteOptions::new("a.ts"));
        assert!(result.transformed);
    }

    #[test]
    fn test_splice_replaces_spans_in_order() {
        let out = splice("aa BB cc DD ee", &[(Span::new(3, 5), "x".into()), (Span::new(9, 11), "yy".into())]);
        assert_eq!(out, "aa x cc yy ee");
    }

    #[test]
    fn test_rewrite_many() {
        let files: HashMap<String, String> = [
            ("a.tsx".to_string(), "import { Button } from 'pkg';".to_string()),
            ("b.js".to_string(), "import * as P from 'pkg';".to_string()),
        ]
        .into_iter()
        .collect();

        let results = rewrite_many(&files, &button_and_input(), &targets(), None);
        assert_eq!(results.len(), 2);
        assert!(results["a.tsx"].transformed);
        assert_eq!(results["b.js"].skipped.len(), 1);
    }

    #[test]
    fn test_rewrite_many_cancelled() {
        let files: HashMap<String, String> =
            [("a.js".to_string(), "import { Button } from 'pkg';".to_string())].into_iter().collect();
        let cancel = AtomicBool::new(true);
        assert!(rewrite_many(&files, &button_and_input(), &targets(), Some(&cancel)).is_empty());
    }
}
