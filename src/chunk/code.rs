//! Code chunking strategies
//!
//! Python is split on definitions from a tree-sitter syntax tree. Other
//! languages use per-family regex tables matching whole brace- or
//! colon-delimited bodies. Both fall back to overlapping line windows.

use super::{count_tokens, line_at, BoundaryType, ChunkKind, Language, Segment};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};
use tree_sitter::{Node, Parser};

struct CodePattern {
    regex: Regex,
    kind: ChunkKind,
}

fn table(entries: &[(&str, ChunkKind)]) -> Vec<CodePattern> {
    entries
        .iter()
        .map(|(pattern, kind)| CodePattern {
            regex: Regex::new(pattern).expect("built-in code pattern must compile"),
            kind: *kind,
        })
        .collect()
}

static JS_PATTERNS: LazyLock<Vec<CodePattern>> = LazyLock::new(|| {
    table(&[
        (r"function\s+\w+\s*\([^)]*\)\s*\{[^}]*\}", ChunkKind::CodeFunction),
        (r"const\s+\w+\s*=\s*\([^)]*\)\s*=>\s*\{[^}]*\}", ChunkKind::CodeFunction),
        (r"class\s+\w+\s*\{[^}]*\}", ChunkKind::CodeClass),
    ])
});

static C_FAMILY_PATTERNS: LazyLock<Vec<CodePattern>> = LazyLock::new(|| {
    table(&[
        (r"public\s+class\s+\w+\s*\{[^}]*\}", ChunkKind::CodeClass),
        (r"private\s+\w+\s+\w+\s*\([^)]*\)\s*\{[^}]*\}", ChunkKind::CodeFunction),
        (r"public\s+\w+\s+\w+\s*\([^)]*\)\s*\{[^}]*\}", ChunkKind::CodeFunction),
    ])
});

static GO_PATTERNS: LazyLock<Vec<CodePattern>> = LazyLock::new(|| {
    table(&[
        (r"func\s+(?:\([^)]*\)\s*)?\w+\s*\([^)]*\)[^{]*\{[^}]*\}", ChunkKind::CodeFunction),
        (r"type\s+\w+\s+(?:struct|interface)\s*\{[^}]*\}", ChunkKind::CodeClass),
    ])
});

static RUST_PATTERNS: LazyLock<Vec<CodePattern>> = LazyLock::new(|| {
    table(&[
        (r"(?:pub(?:\([^)]*\))?\s+)?fn\s+\w+[^{;]*\{[^}]*\}", ChunkKind::CodeFunction),
        (
            r"(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum|trait)\s+\w+[^{;]*\{[^}]*\}",
            ChunkKind::CodeClass,
        ),
    ])
});

static GENERIC_PATTERNS: LazyLock<Vec<CodePattern>> = LazyLock::new(|| {
    table(&[
        (r"def\s+\w+\s*\([^)]*\)\s*:[^:]*:", ChunkKind::CodeFunction),
        (r"class\s+\w+\s*:[^:]*:", ChunkKind::CodeClass),
        (r"function\s+\w+\s*\([^)]*\)\s*\{[^}]*\}", ChunkKind::CodeFunction),
    ])
});

fn patterns_for(language: Option<&Language>) -> &'static [CodePattern] {
    match language {
        Some(Language::JavaScript | Language::TypeScript) => &JS_PATTERNS,
        Some(Language::Java | Language::Cpp | Language::C) => &C_FAMILY_PATTERNS,
        Some(Language::Go) => &GO_PATTERNS,
        Some(Language::Rust) => &RUST_PATTERNS,
        _ => &GENERIC_PATTERNS,
    }
}

/// One segment per pattern match, in document order
///
/// Returns an empty vec when nothing matched; the caller falls back to lines.
pub(crate) fn chunk_with_patterns(content: &str, language: Option<&Language>) -> Vec<Segment> {
    let mut matches: Vec<(usize, usize, ChunkKind)> = patterns_for(language)
        .iter()
        .flat_map(|pattern| {
            pattern
                .regex
                .find_iter(content)
                .map(move |m| (m.start(), m.end(), pattern.kind))
        })
        .collect();

    matches.sort_by_key(|(start, end, _)| (*start, *end));

    matches
        .into_iter()
        .map(|(start, end, kind)| {
            Segment::new(&content[start..end], kind, BoundaryType::Pattern)
                .with_language(language)
                .with_lines(line_at(content, start), line_at(content, end))
                .with_meta("pattern_matched", true)
        })
        .collect()
}

/// A definition found in a Python syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
struct Definition {
    node_type: &'static str,
    name: String,
    start_line: usize,
    end_line: usize,
    has_docstring: bool,
}

/// Split Python source on function, async function and class definitions
///
/// Nested definitions get their own segment too, so a method also appears
/// inside its class's segment. Returns `None` on a syntax error or when the
/// source holds no definitions.
pub(crate) fn chunk_python(content: &str) -> Option<Vec<Segment>> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&tree_sitter_python::LANGUAGE.into()) {
        warn!("Failed to load Python grammar: {}", e);
        return None;
    }

    let tree = parser.parse(content, None)?;
    let root = tree.root_node();
    if root.has_error() {
        warn!("Python syntax error, falling back to line-based chunking");
        return None;
    }

    let mut definitions = Vec::new();
    collect_definitions(&root, content.as_bytes(), &mut definitions);

    if definitions.is_empty() {
        debug!("No Python definitions found, falling back to line-based chunking");
        return None;
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let language = Language::Python;

    Some(
        definitions
            .into_iter()
            .map(|def| {
                let body = lines[def.start_line - 1..def.end_line.min(lines.len())].join("\n");
                let kind = if def.node_type == "class" {
                    ChunkKind::CodeClass
                } else {
                    ChunkKind::CodeFunction
                };

                Segment::new(body, kind, BoundaryType::SyntaxNode)
                    .with_language(Some(&language))
                    .with_lines(def.start_line, def.end_line)
                    .with_meta("node_type", def.node_type)
                    .with_meta("node_name", def.name)
                    .with_meta("has_docstring", def.has_docstring)
            })
            .collect(),
    )
}

// Pre-order walk, so definitions come out in document order
fn collect_definitions(node: &Node, source: &[u8], out: &mut Vec<Definition>) {
    let node_type = match node.kind() {
        "function_definition" if is_async(node) => Some("async_function"),
        "function_definition" => Some("function"),
        "class_definition" => Some("class"),
        _ => None,
    };

    if let Some(node_type) = node_type {
        let name = node
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok())
            .unwrap_or_default()
            .to_string();

        out.push(Definition {
            node_type,
            name,
            start_line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
            has_docstring: has_docstring(node),
        });
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_definitions(&child, source, out);
    }
}

fn is_async(node: &Node) -> bool {
    node.child(0).is_some_and(|first| first.kind() == "async")
}

fn has_docstring(node: &Node) -> bool {
    let Some(body) = node.child_by_field_name("body") else {
        return false;
    };

    let mut cursor = body.walk();
    let first_statement = body
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");

    first_statement.is_some_and(|stmt| {
        stmt.kind() == "expression_statement"
            && stmt.named_child(0).is_some_and(|expr| expr.kind() == "string")
    })
}

/// Accumulate lines up to `chunk_size` tokens, carrying `overlap` lines forward
///
/// A window shorter than `overlap` is carried whole.
pub(crate) fn chunk_by_lines(
    content: &str,
    language: Option<&Language>,
    chunk_size: usize,
    overlap: usize,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    // (1-based line number, text, tokens)
    let mut window: Vec<(usize, &str, usize)> = Vec::new();
    let mut window_tokens = 0;

    let emit = |window: &[(usize, &str, usize)], segments: &mut Vec<Segment>| {
        let (Some(first), Some(last)) = (window.first(), window.last()) else {
            return;
        };
        let body = window.iter().map(|(_, text, _)| *text).collect::<Vec<_>>().join("\n");
        segments.push(
            Segment::new(body, ChunkKind::CodeLines, BoundaryType::Line)
                .with_language(language)
                .with_lines(first.0, last.0),
        );
    };

    for (i, line) in content.split('\n').enumerate() {
        let tokens = count_tokens(line);

        if window_tokens + tokens > chunk_size && !window.is_empty() {
            emit(&window, &mut segments);

            let carry = overlap.min(window.len());
            window.drain(..window.len() - carry);
            window_tokens = window.iter().map(|(_, _, t)| t).sum();
        }

        window.push((i + 1, line, tokens));
        window_tokens += tokens;
    }

    emit(&window, &mut segments);
    segments
}
