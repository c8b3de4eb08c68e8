use crate::chunk::{Chunk, CommentLine};
use crate::error::{Error, Result};
use std::path::Path;
use tree_sitter::{Node, Parser};

/// AST-based chunker for Python source files.
///
/// Walks the syntax tree depth-first, emitting one chunk per function and
/// class definition plus a single aggregated comment block per file. Chunk
/// order follows tree traversal (outer scopes before nested scopes), not
/// lexical order across unit kinds.
pub(crate) struct PythonChunker {
    parser: Parser,
}

impl PythonChunker {
    /// Creates a new chunker with the Python grammar loaded.
    pub(crate) fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| Error::config(format!("Failed to load Python grammar: {e}")))?;

        Ok(Self { parser })
    }

    /// Parses `content` and returns its semantic chunks.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the source contains syntax errors. A valid
    /// file with no functions, classes or comments yields an empty list.
    pub(crate) fn chunk(&mut self, path: &Path, content: &str) -> Result<Vec<Chunk>> {
        if content.is_empty() {
            return Ok(Vec::new());
        }

        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| Error::parse(path, "parser produced no syntax tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(Error::parse(path, "source contains syntax errors"));
        }

        let lines: Vec<&str> = content.lines().collect();

        let mut chunks = Vec::new();
        collect_units(root, content, &lines, &mut chunks);

        let mut comments = Vec::new();
        collect_comments(root, content, &mut comments);
        if !comments.is_empty() {
            chunks.push(Chunk::Comments(comments));
        }

        Ok(chunks)
    }
}

/// Depth-first collection of function and class units.
///
/// Methods (function definitions directly inside a class body) are captured
/// in their class's method list and not emitted as standalone function
/// chunks; functions nested inside other functions are emitted.
fn collect_units(node: Node<'_>, content: &str, lines: &[&str], chunks: &mut Vec<Chunk>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" if !is_direct_method(child) => {
                if let Some(name) = symbol_name(content, child) {
                    chunks.push(Chunk::Function {
                        name,
                        code: node_span(lines, child),
                    });
                }
            }
            "class_definition" => {
                if let Some(name) = symbol_name(content, child) {
                    chunks.push(Chunk::Class {
                        name,
                        methods: direct_method_names(content, child),
                        code: node_span(lines, child),
                    });
                }
            }
            _ => {}
        }

        collect_units(child, content, lines, chunks);
    }
}

/// Collects every comment node as a (line, text) pair, marker stripped.
fn collect_comments(node: Node<'_>, content: &str, comments: &mut Vec<CommentLine>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "comment" {
            let raw = &content[child.start_byte()..child.end_byte()];
            comments.push(CommentLine {
                line: child.start_position().row + 1,
                text: raw.trim_start_matches('#').trim().to_string(),
            });
        }

        collect_comments(child, content, comments);
    }
}

/// Returns true for a function definition that is a direct member of a class
/// body, including one wrapped in decorators.
fn is_direct_method(node: Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };

    let member = if parent.kind() == "decorated_definition" {
        parent
    } else {
        node
    };

    matches!(
        member.parent(),
        Some(body) if body.kind() == "block"
            && matches!(body.parent(), Some(class) if class.kind() == "class_definition")
    )
}

/// Names of a class's immediate methods, in declaration order.
fn direct_method_names(content: &str, class_node: Node<'_>) -> Vec<String> {
    let mut methods = Vec::new();

    let mut cursor = class_node.walk();
    for child in class_node.children(&mut cursor) {
        if child.kind() != "block" {
            continue;
        }

        let mut body_cursor = child.walk();
        for member in child.children(&mut body_cursor) {
            let function = match member.kind() {
                "function_definition" => Some(member),
                // Decorators wrap the definition in a separate node
                "decorated_definition" => find_child(member, "function_definition"),
                _ => None,
            };

            if let Some(function) = function {
                if let Some(name) = symbol_name(content, function) {
                    methods.push(name);
                }
            }
        }
    }

    methods
}

/// Extracts the identifier naming a definition node.
fn symbol_name(content: &str, node: Node<'_>) -> Option<String> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "identifier" {
            return Some(content[child.start_byte()..child.end_byte()].to_string());
        }
    }
    None
}

fn find_child<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind() == kind)
}

/// Verbatim source lines spanning a node, inclusive on both ends.
fn node_span(lines: &[&str], node: Node<'_>) -> String {
    let start = node.start_position().row;
    let end = node.end_position().row.min(lines.len().saturating_sub(1));
    lines[start..=end].join("\n")
}
