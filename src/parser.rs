use std::path::Path;

use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::ScaffoldError;

/// tree-sitter grammar for Go sources.
pub fn go_language() -> Language {
    tree_sitter_go::LANGUAGE.into()
}

/// Parse Go source text into a tree-sitter tree.
pub fn parse_source(source: &str) -> Result<Tree, ScaffoldError> {
    let mut parser = Parser::new();
    parser
        .set_language(&go_language())
        .map_err(|e| ScaffoldError::ParseFailed(e.to_string()))?;

    parser
        .parse(source, None)
        .ok_or_else(|| ScaffoldError::ParseFailed("parser returned no tree".to_string()))
}

/// Read and parse a Go file, returning the tree-sitter tree and source text.
///
/// Trees containing ERROR or MISSING nodes are rejected: the rest of the
/// pipeline assumes a package that compiles.
pub fn parse_file(path: &Path) -> Result<(Tree, String), ScaffoldError> {
    let source = std::fs::read_to_string(path).map_err(|e| ScaffoldError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let tree = parse_source(&source)?;
    if let Some(line) = first_error_line(tree.root_node()) {
        return Err(ScaffoldError::SyntaxError {
            file: path.display().to_string(),
            line,
        });
    }

    Ok((tree, source))
}

/// 1-based line of the first ERROR or MISSING node, if any.
pub fn first_error_line(root: Node) -> Option<usize> {
    if !root.has_error() {
        return None;
    }
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        if !node.has_error() {
            continue;
        }
        // Reverse so the leftmost child is visited first.
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    Some(root.start_position().row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_source_without_errors() {
        let tree = parse_source("package p\n\nfunc add(a, b int) int { return a + b }\n").unwrap();
        assert_eq!(tree.root_node().kind(), "source_file");
        assert_eq!(first_error_line(tree.root_node()), None);
    }

    #[test]
    fn reports_line_of_syntax_error() {
        let tree = parse_source("package p\n\nfunc ok() {}\n\nfunc broken( {\n").unwrap();
        let line = first_error_line(tree.root_node());
        assert!(line.is_some_and(|l| l >= 1));
    }

    #[test]
    fn parse_file_rejects_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.go");
        std::fs::write(&path, "package p\nfunc (\n").unwrap();
        let err = parse_file(&path).unwrap_err();
        assert!(matches!(err, ScaffoldError::SyntaxError { .. }), "{err}");
    }

    #[test]
    fn parse_file_reports_missing_file() {
        let err = parse_file(Path::new("/nonexistent/goscaf/missing.go")).unwrap_err();
        assert!(matches!(err, ScaffoldError::Io { .. }));
    }
}
