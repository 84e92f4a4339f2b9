//! Grammar-backed syntax checks.

use tree_sitter::{Node, Parser};

use super::{SyntaxChecker, SyntaxError};
use crate::language::Language;

/// Parses content with a tree-sitter grammar and reports the first error node.
pub struct TreeSitterChecker {
    name: &'static str,
    language: tree_sitter::Language,
}

impl TreeSitterChecker {
    /// Checker for a language with a bundled grammar.
    pub fn for_language(language: Language) -> Option<Self> {
        let (name, grammar): (&'static str, tree_sitter::Language) = match language {
            Language::Python => ("tree-sitter-python", tree_sitter_python::LANGUAGE.into()),
            Language::Rust => ("tree-sitter-rust", tree_sitter_rust::LANGUAGE.into()),
            Language::JavaScript => (
                "tree-sitter-javascript",
                tree_sitter_javascript::LANGUAGE.into(),
            ),
            Language::TypeScript => (
                "tree-sitter-typescript",
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            ),
            Language::Tsx => ("tree-sitter-tsx", tree_sitter_typescript::LANGUAGE_TSX.into()),
            Language::Go => ("tree-sitter-go", tree_sitter_go::LANGUAGE.into()),
            Language::Java => ("tree-sitter-java", tree_sitter_java::LANGUAGE.into()),
            _ => return None,
        };
        Some(Self {
            name,
            language: grammar,
        })
    }
}

impl SyntaxChecker for TreeSitterChecker {
    fn name(&self) -> &'static str {
        self.name
    }

    fn check(&self, content: &str) -> Option<SyntaxError> {
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&self.language) {
            return Some(SyntaxError {
                message: format!("{} grammar could not be loaded: {e}", self.name),
                line: None,
                column: None,
            });
        }
        let Some(tree) = parser.parse(content, None) else {
            return Some(SyntaxError {
                message: "parser gave up on this content".to_string(),
                line: None,
                column: None,
            });
        };

        let node = first_error(tree.root_node())?;
        let position = node.start_position();
        let message = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            let snippet: String = content
                .get(node.byte_range())
                .and_then(|text| text.lines().next())
                .unwrap_or("")
                .chars()
                .take(40)
                .collect();
            if snippet.trim().is_empty() {
                "syntax error".to_string()
            } else {
                format!("syntax error near '{}'", snippet.trim())
            }
        };

        Some(SyntaxError {
            message,
            line: Some(position.row + 1),
            column: Some(position.column + 1),
        })
    }
}

/// First ERROR or MISSING node in document order.
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}
