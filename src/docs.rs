use crate::analyzer::descendants;
use crate::parser::node_text;
use regex::Regex;
use std::sync::OnceLock;
use tree_sitter::Node;

/// Documentation tag carrying a request-body type override.
const BODY_TAG: &str = "@body";

fn body_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"@body\s*\{[^}]*\}").expect("body tag pattern is a valid literal")
    })
}

/// A JSDoc comment block (`/** … */`) with its end position.
///
/// Position is what associates a block with a declaration: a block documents
/// the declaration whose export statement starts on the line immediately
/// after the block ends. Association is by line number, not parse-tree
/// proximity, which is an approximation that can mis-associate comments
/// under unusual formatting.
#[derive(Debug, Clone)]
pub struct DocBlock {
    /// Raw comment text, including delimiters
    pub text: String,
    /// 1-based line on which the block ends
    pub end_line: usize,
}

/// Collects every JSDoc block in the file, in source order. Line comments
/// and plain block comments are not documentation and are ignored.
pub fn collect_doc_blocks(root: Node<'_>, source: &str) -> Vec<DocBlock> {
    descendants(root)
        .into_iter()
        .filter(|node| node.kind() == "comment")
        .filter_map(|node| {
            let text = node_text(node, source);
            text.starts_with("/**").then(|| DocBlock {
                text: text.to_string(),
                end_line: node.end_position().row + 1,
            })
        })
        .collect()
}

/// Selects the blocks documenting a declaration that starts on
/// `declaration_start_line`: exactly those whose end line is the line
/// immediately preceding it.
pub fn blocks_for_declaration(
    blocks: &[DocBlock],
    declaration_start_line: usize,
) -> Vec<&DocBlock> {
    blocks
        .iter()
        .filter(|block| block.end_line + 1 == declaration_start_line)
        .collect()
}

/// Extracts the `@body` type override from the selected blocks, if any.
/// When several blocks or tags match, the last one wins.
pub fn body_type_from_blocks(blocks: &[&DocBlock]) -> Option<String> {
    let mut body_type = None;

    for block in blocks {
        if let Some(comment) = body_tag_comment(&block.text) {
            body_type = Some(comment);
        }
    }

    body_type
}

/// The text following the first `@body` tag in a block, up to the next tag
/// or the end of the block, with comment markers stripped.
fn body_tag_comment(block: &str) -> Option<String> {
    let start = block.find(BODY_TAG)? + BODY_TAG.len();
    let rest = &block[start..];
    let tag_comment = match rest.find('@') {
        Some(next_tag) => &rest[..next_tag],
        None => rest,
    };

    let cleaned = tag_comment
        .trim_end_matches("*/")
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    (!cleaned.is_empty()).then_some(cleaned)
}

/// Concatenates the selected blocks into free-text documentation: raw texts
/// joined by newlines, comment-delimiter syntax stripped, and any embedded
/// `@body { … }` tag block removed. Absent iff no blocks were selected.
pub fn documentation_text(blocks: &[&DocBlock]) -> Option<String> {
    if blocks.is_empty() {
        return None;
    }

    let raw = blocks
        .iter()
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    Some(strip_comment_syntax(&raw))
}

/// Removes JS comment syntax (`//`, `/*`, `*/`, `*`) and `@body { … }` tag
/// blocks from a comment, returning the trimmed free text.
pub fn strip_comment_syntax(comment: &str) -> String {
    let without_markers = comment
        .replace("//", "")
        .replace("/*", "")
        .replace("*/", "")
        .replace('*', "");

    body_tag_pattern()
        .replace_all(&without_markers, "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SourceParser;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn blocks_in(code: &str) -> Vec<DocBlock> {
        let parsed = SourceParser::parse_source(Path::new("+server.ts"), code.to_string()).unwrap();
        collect_doc_blocks(parsed.root(), &parsed.source)
    }

    #[test]
    fn test_collects_only_jsdoc_blocks() {
        let code = r#"
// line comment
/* plain block */
/** Creates a user. */
export function POST() {}
"#;
        let blocks = blocks_in(code);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "/** Creates a user. */");
        assert_eq!(blocks[0].end_line, 4);
    }

    #[test]
    fn test_adjacent_block_is_selected() {
        let code = "/** Lists users. */\nexport function GET() {}\n";
        let blocks = blocks_in(code);

        let selected = blocks_for_declaration(&blocks, 2);
        assert_eq!(selected.len(), 1);

        let detached = blocks_for_declaration(&blocks, 4);
        assert!(detached.is_empty());
    }

    #[test]
    fn test_block_separated_by_blank_line_is_not_selected() {
        let code = "/** Lists users. */\n\nexport function GET() {}\n";
        let blocks = blocks_in(code);

        let selected = blocks_for_declaration(&blocks, 3);
        assert!(selected.is_empty());
    }

    #[test]
    fn test_body_tag_with_inline_braces() {
        let code = "/**\n * Creates a user.\n * @body { id: string }\n */\nexport function POST() {}\n";
        let blocks = blocks_in(code);
        let selected = blocks_for_declaration(&blocks, 5);

        assert_eq!(
            body_type_from_blocks(&selected),
            Some("{ id: string }".to_string())
        );
    }

    #[test]
    fn test_body_tag_is_removed_from_free_text() {
        let code = "/**\n * Creates a user.\n * @body { id: string }\n */\nexport function POST() {}\n";
        let blocks = blocks_in(code);
        let selected = blocks_for_declaration(&blocks, 5);

        assert_eq!(
            documentation_text(&selected),
            Some("Creates a user.".to_string())
        );
    }

    #[test]
    fn test_last_body_tag_wins() {
        let code =
            "/** @body { a: number } */ /** @body { b: string } */\nexport function PUT() {}\n";
        let blocks = blocks_in(code);
        let selected = blocks_for_declaration(&blocks, 2);

        assert_eq!(selected.len(), 2);
        assert_eq!(
            body_type_from_blocks(&selected),
            Some("{ b: string }".to_string())
        );
    }

    #[test]
    fn test_multiple_blocks_on_adjacent_line_concatenate() {
        let code = "/** First. */ /** Second. */\nexport function GET() {}\n";
        let blocks = blocks_in(code);
        let selected = blocks_for_declaration(&blocks, 2);

        assert_eq!(selected.len(), 2);
        assert_eq!(
            documentation_text(&selected),
            Some("First. \n Second.".to_string())
        );
    }

    #[test]
    fn test_documentation_absent_without_blocks() {
        assert_eq!(documentation_text(&[]), None);
    }

    #[test]
    fn test_strip_comment_syntax() {
        let comment = "/**\n * Does a thing.\n * Carefully.\n */";
        assert_eq!(strip_comment_syntax(comment), "Does a thing.\n  Carefully.");
    }
}
