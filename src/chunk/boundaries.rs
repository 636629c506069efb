//! Boundary kinds and fenced-block detection for chunking

use serde::{Deserialize, Serialize};

/// Where a chunk was cut, recorded in `metadata.boundary_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryType {
    /// Line window (fallback for code)
    Line,
    /// Sentence group inside an oversized paragraph
    Sentence,
    /// Blank-line delimited paragraph
    Paragraph,
    /// Markdown heading
    Heading,
    /// Whole function/class body matched by a code pattern
    Pattern,
    /// Definition node from a parsed syntax tree
    SyntaxNode,
    /// Fixed word window produced when re-splitting an oversized chunk
    Window,
}

impl BoundaryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryType::Line => "line",
            BoundaryType::Sentence => "sentence",
            BoundaryType::Paragraph => "paragraph",
            BoundaryType::Heading => "heading",
            BoundaryType::Pattern => "pattern",
            BoundaryType::SyntaxNode => "syntax_node",
            BoundaryType::Window => "window",
        }
    }
}

impl std::fmt::Display for BoundaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mark which lines sit inside a fenced code block (``` or ~~~)
///
/// Fence lines themselves are marked as inside, so a `# comment` in an
/// embedded snippet is never taken for a heading.
pub fn fenced_line_mask(lines: &[&str]) -> Vec<bool> {
    let mut mask = Vec::with_capacity(lines.len());
    let mut in_block = false;

    for line in lines {
        let trimmed = line.trim_start();
        let is_fence = trimmed.starts_with("```") || trimmed.starts_with("~~~");

        if is_fence {
            mask.push(true);
            in_block = !in_block;
        } else {
            mask.push(in_block);
        }
    }

    mask
}

/// 1-based line number of a byte offset
pub fn line_at(text: &str, byte_offset: usize) -> usize {
    let end = byte_offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}
