use crate::error::{Error, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// Syntax parser for TypeScript route handler files.
///
/// The `SourceParser` uses the `tree-sitter-typescript` grammar to parse a
/// handler file into a concrete syntax tree, which the analyzer then walks to
/// find exported handler declarations, response-construction calls and
/// documentation comments.
///
/// # Example
///
/// ```no_run
/// use openapi_from_routes::parser::SourceParser;
/// use std::path::Path;
///
/// let parsed = SourceParser::parse_file(Path::new("src/routes/+server.ts")).unwrap();
/// println!("Root node kind: {}", parsed.root().kind());
/// ```
pub struct SourceParser;

/// A successfully parsed route handler file.
///
/// Owns both the source text and the syntax tree; node text is resolved
/// against the owned source via [`ParsedSource::text`].
pub struct ParsedSource {
    /// Path to the source file
    pub path: PathBuf,
    /// The full source text
    pub source: String,
    /// The parsed syntax tree
    pub tree: Tree,
}

impl ParsedSource {
    /// The root node of the syntax tree.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// The source text covered by `node`.
    pub fn text(&self, node: Node<'_>) -> &str {
        node_text(node, &self.source)
    }
}

impl SourceParser {
    /// Parses a single route handler file into a syntax tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] if the file cannot be read or is not valid
    /// UTF-8, [`Error::Grammar`] if the TypeScript grammar cannot be loaded,
    /// and [`Error::Parse`] if the file contains a syntax error anywhere in
    /// its tree. Handler files are presumed syntactically valid by the
    /// calling convention, so a parse failure propagates instead of being
    /// silently dropped.
    pub fn parse_file(path: &Path) -> Result<ParsedSource> {
        debug!("Parsing file: {}", path.display());

        let source = fs::read_to_string(path).map_err(|e| Error::Read {
            file: path.to_path_buf(),
            source: e,
        })?;

        Self::parse_source(path, source)
    }

    /// Parses already-loaded source text on behalf of `path`.
    pub fn parse_source(path: &Path, source: String) -> Result<ParsedSource> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())?;

        let tree = parser.parse(&source, None).ok_or_else(|| Error::Parse {
            file: path.to_path_buf(),
        })?;

        if tree.root_node().has_error() {
            return Err(Error::Parse {
                file: path.to_path_buf(),
            });
        }

        debug!("Successfully parsed file: {}", path.display());

        Ok(ParsedSource {
            path: path.to_path_buf(),
            source,
            tree,
        })
    }
}

/// The source text covered by `node`, or `""` when the span is not valid
/// UTF-8 (cannot happen for trees produced from a `String`).
pub fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}
