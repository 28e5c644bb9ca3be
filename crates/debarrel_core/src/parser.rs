use anyhow::{Context, Result};
use log::{debug, trace};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::SourceType;
use std::{collections::HashMap, fs, path::Path};

use crate::{
    constants::DECLARATION_SUFFIXES,
    error::ParseError,
    resolver::is_relative_specifier,
    types::{ModuleRecord, ReExport, ReExportName},
};

/// Reads `file` and parses its export surface.
pub fn parse_module_record(file: &Path) -> Result<ModuleRecord> {
    trace!("Parsing export surface of {}", file.display());
    let src =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let record = module_record_from_source(file, &src)?;
    debug!(
        "{}: {} local exports, {} re-exports, {} star re-exports",
        file.display(),
        record.named_exports.len(),
        record.re_exports.len(),
        record.star_re_exports.len()
    );
    Ok(record)
}

/// Parses the export surface of `src`; `file` picks the dialect and is
/// recorded as the record's path.
pub fn module_record_from_source(file: &Path, src: &str) -> Result<ModuleRecord, ParseError> {
    let allocator = Allocator::default();
    let ParserReturn { program, errors, panicked, .. } =
        OxcParser::new(&allocator, src, source_type_for(file)).parse();

    if panicked || !errors.is_empty() {
        let message = errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "parser aborted".to_string());
        return Err(ParseError { path: file.to_path_buf(), message });
    }

    // Imports are hoisted, so collect them before looking at `export { x }`.
    let imported = relative_imports(&program);

    let mut record = ModuleRecord { path: file.to_path_buf(), ..Default::default() };
    for stmt in &program.body {
        match stmt {
            Statement::ExportNamedDeclaration(decl) => {
                collect_named_export(decl, &imported, &mut record);
            }
            Statement::ExportDefaultDeclaration(_) => {
                record.named_exports.push("default".to_string());
            }
            Statement::ExportAllDeclaration(decl) => match &decl.exported {
                // `export * as ns from` declares `ns` in this file
                Some(ns) => record.named_exports.push(ns.name().to_string()),
                None => record.star_re_exports.push(decl.source.value.to_string()),
            },
            _ => {}
        }
    }

    Ok(record)
}

/// local binding → (imported name, source) for imports from relative modules.
fn relative_imports(program: &Program<'_>) -> HashMap<String, (String, String)> {
    let mut imported = HashMap::new();
    for stmt in &program.body {
        let Statement::ImportDeclaration(decl) = stmt else { continue };
        let source = decl.source.value.as_str();
        if !is_relative_specifier(source) {
            continue;
        }
        let Some(specifiers) = &decl.specifiers else { continue };
        for spec in specifiers {
            match spec {
                ImportDeclarationSpecifier::ImportSpecifier(s) => {
                    imported.insert(
                        s.local.name.to_string(),
                        (s.imported.name().to_string(), source.to_string()),
                    );
                }
                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                    imported
                        .insert(s.local.name.to_string(), ("default".to_string(), source.to_string()));
                }
                // A namespace object is a value of this file, not a forwardable name
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => {}
            }
        }
    }
    imported
}

fn collect_named_export(
    decl: &ExportNamedDeclaration<'_>,
    imported: &HashMap<String, (String, String)>,
    record: &mut ModuleRecord,
) {
    if let Some(source) = &decl.source {
        let names = decl
            .specifiers
            .iter()
            .map(|s| ReExportName {
                imported: s.local.name().to_string(),
                exported: s.exported.name().to_string(),
            })
            .collect();
        record.re_exports.push(ReExport { names, source: source.value.to_string() });
        return;
    }

    if let Some(declaration) = &decl.declaration {
        declared_names(declaration, &mut record.named_exports);
    }

    for spec in &decl.specifiers {
        let local = spec.local.name();
        let exported = spec.exported.name().to_string();
        match imported.get(local.as_str()) {
            Some((name, source)) => record.re_exports.push(ReExport {
                names: vec![ReExportName { imported: name.clone(), exported }],
                source: source.clone(),
            }),
            None => record.named_exports.push(exported),
        }
    }
}

fn declared_names(declaration: &Declaration<'_>, out: &mut Vec<String>) {
    match declaration {
        Declaration::VariableDeclaration(var) => {
            for declarator in &var.declarations {
                for ident in declarator.id.get_binding_identifiers() {
                    out.push(ident.name.to_string());
                }
            }
        }
        Declaration::FunctionDeclaration(func) => {
            if let Some(id) = &func.id {
                out.push(id.name.to_string());
            }
        }
        Declaration::ClassDeclaration(class) => {
            if let Some(id) = &class.id {
                out.push(id.name.to_string());
            }
        }
        Declaration::TSTypeAliasDeclaration(alias) => out.push(alias.id.name.to_string()),
        Declaration::TSInterfaceDeclaration(interface) => out.push(interface.id.name.to_string()),
        Declaration::TSEnumDeclaration(en) => out.push(en.id.name.to_string()),
        Declaration::TSModuleDeclaration(module) => {
            if let TSModuleDeclarationName::Identifier(id) = &module.id {
                out.push(id.name.to_string());
            }
        }
        Declaration::TSImportEqualsDeclaration(import_equals) => {
            out.push(import_equals.id.name.to_string());
        }
        #[allow(unreachable_patterns)]
        _ => {}
    }
}

/// Parser dialect for a file name. JSX is enabled for every JavaScript
/// flavour since published packages ship JSX in plain `.js` files.
pub fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();

    let typescript = matches!(ext, Some("ts" | "tsx" | "mts" | "cts"));
    let jsx = match ext {
        Some("tsx") => true,
        Some("ts" | "mts" | "cts") => false,
        _ => true,
    };
    let definition = DECLARATION_SUFFIXES.iter().any(|suffix| file_name.ends_with(suffix));

    SourceType::default()
        .with_module(true)
        .with_typescript(typescript)
        .with_jsx(jsx)
        .with_typescript_definition(definition)
}
