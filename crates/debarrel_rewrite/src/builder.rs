//! Text of the import statements emitted in place of a barrel import.
//!
//! Emitted statements follow the formatting of the statement they replace:
//! its quote character, whether it ends in a semicolon and its indentation.

use oxc_span::Span;
use oxc_syntax::identifier::is_identifier_name;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportStyle {
    pub quote: char,
    pub semicolon: bool,
    /// Leading whitespace of the replaced statement's line.
    pub indent: String,
}

impl Default for ImportStyle {
    fn default() -> Self {
        Self { quote: '\'', semicolon: true, indent: String::new() }
    }
}

impl ImportStyle {
    /// `statement` is the span of the whole declaration, `specifier` the span
    /// of its source string literal (quotes included).
    pub fn detect(source_text: &str, statement: Span, specifier: Span) -> Self {
        let quote = match source_text.as_bytes().get(specifier.start as usize) {
            Some(b'"') => '"',
            _ => '\'',
        };
        let semicolon = source_text
            .get(statement.start as usize..statement.end as usize)
            .is_some_and(|text| text.trim_end().ends_with(';'));

        let start = statement.start as usize;
        let line_start = source_text[..start].rfind('\n').map_or(0, |i| i + 1);
        let prefix = &source_text[line_start..start];
        let indent = if prefix.chars().all(char::is_whitespace) { prefix.to_string() } else { String::new() };

        Self { quote, semicolon, indent }
    }

    /// Separator placed between statements that replace one declaration.
    pub fn separator(&self) -> String {
        format!("\n{}", self.indent)
    }

    fn finish(&self, statement: String) -> String {
        if self.semicolon { statement + ";" } else { statement }
    }

    fn string_literal(&self, value: &str) -> String {
        let mut literal = String::with_capacity(value.len() + 2);
        literal.push(self.quote);
        for c in value.chars() {
            if c == self.quote || c == '\\' {
                literal.push('\\');
            }
            literal.push(c);
        }
        literal.push(self.quote);
        literal
    }
}

/// `import Local from 'specifier'`.
pub fn default_import(style: &ImportStyle, local: &str, specifier: &str, type_only: bool) -> String {
    let keyword = if type_only { "import type" } else { "import" };
    style.finish(format!("{} {} from {}", keyword, local, style.string_literal(specifier)))
}

/// `import { name as local } from 'specifier'`, or a default import when
/// `name` is `default`.
///
/// `declaration_type_only` is set for `import type { … }`; an inline
/// `{ type X }` binding keeps the inline form.
pub fn named_import(
    style: &ImportStyle,
    name: &str,
    local: &str,
    specifier: &str,
    declaration_type_only: bool,
    inline_type_only: bool,
) -> String {
    if name == "default" {
        return default_import(style, local, specifier, declaration_type_only || inline_type_only);
    }

    let exported = if is_identifier_name(name) { name.to_string() } else { style.string_literal(name) };
    let mut binding = if exported == local { exported } else { format!("{} as {}", exported, local) };
    if inline_type_only && !declaration_type_only {
        binding = format!("type {}", binding);
    }

    let keyword = if declaration_type_only { "import type" } else { "import" };
    style.finish(format!("{} {{ {} }} from {}", keyword, binding, style.string_literal(specifier)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn span_of(text: &str, needle: &str) -> Span {
        let start = text.find(needle).unwrap() as u32;
        Span::new(start, start + needle.len() as u32)
    }

    #[test]
    fn test_detect_style() {
        let src = "function f() {}\n  import { A } from \"pkg\"\n";
        let style = ImportStyle::detect(src, span_of(src, "import { A } from \"pkg\""), span_of(src, "\"pkg\""));
        assert_eq!(style, ImportStyle { quote: '"', semicolon: false, indent: "  ".into() });
    }

    #[test]
    fn test_detect_style_statement_sharing_a_line() {
        let src = "f(); import { A } from 'pkg';";
        let style = ImportStyle::detect(src, span_of(src, "import { A } from 'pkg';"), span_of(src, "'pkg'"));
        assert_eq!(style, ImportStyle { quote: '\'', semicolon: true, indent: String::new() });
    }

    #[test]
    fn test_named_import_forms() {
        let style = ImportStyle::default();
        assert_eq!(
            named_import(&style, "Button", "Button", "pkg/Button", false, false),
            "import { Button } from 'pkg/Button';"
        );
        assert_eq!(
            named_import(&style, "Input", "TextInput", "pkg/Input", false, false),
            "import { Input as TextInput } from 'pkg/Input';"
        );
        assert_eq!(
            named_import(&style, "default", "Card", "pkg/Card", false, false),
            "import Card from 'pkg/Card';"
        );
    }

    #[test]
    fn test_type_only_forms() {
        let style = ImportStyle { quote: '"', semicolon: false, indent: String::new() };
        assert_eq!(
            named_import(&style, "Props", "Props", "pkg/Props", true, false),
            "import type { Props } from \"pkg/Props\""
        );
        assert_eq!(
            named_import(&style, "Props", "P", "pkg/Props", false, true),
            "import { type Props as P } from \"pkg/Props\""
        );
        assert_eq!(
            named_import(&style, "default", "Theme", "pkg/theme", false, true),
            "import type Theme from \"pkg/theme\""
        );
    }

    #[test]
    fn test_non_identifier_name_is_quoted() {
        let style = ImportStyle::default();
        assert_eq!(
            named_import(&style, "kebab-name", "kebab", "pkg/kebab", false, false),
            "import { 'kebab-name' as kebab } from 'pkg/kebab';"
        );
        assert_eq!(
            named_import(&style, "it's", "its", "pkg", false, false),
            "import { 'it\\'s' as its } from 'pkg';"
        );
    }

    #[test]
    fn test_default_import() {
        let style = ImportStyle::default();
        assert_eq!(default_import(&style, "Pkg", "pkg", false), "import Pkg from 'pkg';");
    }
}
