//! Java parsing via tree-sitter.
//!
//! Only the outline is kept: package, imports and top-level type
//! declarations. Any syntax error fails the file.

use tree_sitter::{Node, Parser};

use super::SourceParser;
use crate::model::{Import, Syntax};

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

pub struct JavaParser;

impl SourceParser for JavaParser {
    fn parse(&self, text: &str) -> Result<Syntax, String> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| format!("java grammar unavailable: {e}"))?;
        let tree = parser
            .parse(text, None)
            .ok_or_else(|| "parser returned no tree".to_string())?;
        let root = tree.root_node();
        if root.has_error() {
            let at = first_error(root)
                .map(|n| {
                    let p = n.start_position();
                    format!(" at {}:{}", p.row + 1, p.column + 1)
                })
                .unwrap_or_default();
            return Err(format!("syntax error{at}"));
        }

        let src = text.as_bytes();
        let mut package = None;
        let mut imports = Vec::new();
        let mut declared = Vec::new();

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "package_declaration" => {
                    package = last_name_node(child)
                        .and_then(|n| n.utf8_text(src).ok())
                        .map(str::to_string);
                }
                "import_declaration" => {
                    if let Ok(raw) = child.utf8_text(src) {
                        imports.push(parse_import(raw));
                    }
                }
                kind if TYPE_DECLARATIONS.contains(&kind) => {
                    if let Some(name) = child
                        .child_by_field_name("name")
                        .and_then(|n| n.utf8_text(src).ok())
                    {
                        declared.push(match &package {
                            Some(p) => format!("{p}.{name}"),
                            None => name.to_string(),
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(Syntax::Compiled {
            package,
            imports,
            declared_types: declared,
            missing_types: Vec::new(),
        })
    }
}

fn last_name_node(package: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = package.walk();
    package
        .named_children(&mut cursor)
        .filter(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))
        .last()
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// `import static a.b.C.*;` -> `Import { name: "a.b.C", wildcard, is_static }`.
pub(crate) fn parse_import(raw: &str) -> Import {
    let body = raw
        .trim()
        .trim_start_matches("import")
        .trim_end_matches(';')
        .trim();
    let (is_static, body) = match body.strip_prefix("static") {
        Some(rest) if rest.starts_with(char::is_whitespace) => (true, rest.trim()),
        _ => (false, body),
    };
    let body: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    match body.strip_suffix(".*") {
        Some(name) => Import {
            name: name.to_string(),
            wildcard: true,
            is_static,
        },
        None => Import {
            name: body,
            wildcard: false,
            is_static,
        },
    }
}
