//! Heading-based markdown splitting

use super::{fenced_line_mask, BoundaryType, ChunkKind, Segment};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("heading pattern must compile"));

struct Section<'a> {
    header: Option<&'a str>,
    level: usize,
    start_line: usize,
    lines: Vec<&'a str>,
}

impl Section<'_> {
    fn into_segment(self) -> Option<Segment> {
        let body = self.lines.join("\n");
        // A blank preamble before the first heading is not a section
        if self.header.is_none() && body.trim().is_empty() {
            return None;
        }

        let end_line = self.start_line + self.lines.len() - 1;
        Some(
            Segment::new(body, ChunkKind::MarkdownSection, BoundaryType::Heading)
                .with_lines(self.start_line, end_line)
                .with_meta("header", self.header.map_or(Value::Null, Value::from))
                .with_meta("header_level", self.level),
        )
    }
}

/// Split on `#`..`######` headings; each section runs to the next heading
///
/// Headings inside fenced code blocks do not start sections. Text before the
/// first heading becomes a section with a null header and level 0.
pub(crate) fn chunk_markdown(content: &str) -> Vec<Segment> {
    let lines: Vec<&str> = content.split('\n').collect();
    let fenced = fenced_line_mask(&lines);

    let mut segments = Vec::new();
    let mut current = Section {
        header: None,
        level: 0,
        start_line: 1,
        lines: Vec::new(),
    };

    for (i, line) in lines.iter().copied().enumerate() {
        let heading = if fenced[i] { None } else { HEADING.captures(line) };

        match heading {
            Some(caps) => {
                let previous = std::mem::replace(
                    &mut current,
                    Section {
                        header: Some(line),
                        level: caps[1].len(),
                        start_line: i + 1,
                        lines: vec![line],
                    },
                );
                if !previous.lines.is_empty() {
                    segments.extend(previous.into_segment());
                }
            }
            None => current.lines.push(line),
        }
    }

    if !current.lines.is_empty() {
        segments.extend(current.into_segment());
    }

    segments
}
