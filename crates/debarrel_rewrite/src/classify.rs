use oxc_ast::ast::{ImportDeclaration, ImportDeclarationSpecifier};

/// `import { imported as local }`, with inline `type` marking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBinding {
    pub imported: String,
    pub local: String,
    pub is_type_only: bool,
}

/// The shape of an import declaration, which decides whether it can be split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportShape {
    /// `import * as X from` (with or without a default binding)
    Namespace,
    /// `import 'x'` and `import {} from 'x'`
    SideEffect,
    DefaultOnly,
    Named(Vec<NamedBinding>),
    DefaultPlusNamed { default_local: String, named: Vec<NamedBinding> },
}

pub fn classify(decl: &ImportDeclaration<'_>) -> ImportShape {
    let Some(specifiers) = &decl.specifiers else { return ImportShape::SideEffect };

    let mut default_local = None;
    let mut named = Vec::new();
    for spec in specifiers {
        match spec {
            ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => return ImportShape::Namespace,
            ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                default_local = Some(s.local.name.to_string());
            }
            ImportDeclarationSpecifier::ImportSpecifier(s) => named.push(NamedBinding {
                imported: s.imported.name().to_string(),
                local: s.local.name.to_string(),
                is_type_only: s.import_kind.is_type(),
            }),
        }
    }

    match (default_local, named.is_empty()) {
        (None, true) => ImportShape::SideEffect,
        (Some(_), true) => ImportShape::DefaultOnly,
        (None, false) => ImportShape::Named(named),
        (Some(default_local), false) => ImportShape::DefaultPlusNamed { default_local, named },
    }
}
