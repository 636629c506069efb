//! Paragraph and sentence splitting for prose

use super::{count_tokens, BoundaryType, ChunkKind, Segment};
use regex::Regex;
use std::sync::LazyLock;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph pattern must compile"));

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]*").expect("sentence pattern must compile"));

/// Split text into sentences, keeping terminal punctuation
pub fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Blank-line paragraphs; oversized paragraphs become overlapping sentence groups
pub(crate) fn chunk_text(content: &str, chunk_size: usize, overlap: usize) -> Vec<Segment> {
    let mut segments = Vec::new();

    for paragraph in PARAGRAPH_BREAK.split(content) {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        if count_tokens(paragraph) > chunk_size {
            segments.extend(group_sentences(paragraph, chunk_size, overlap));
        } else {
            segments.push(Segment::new(
                paragraph,
                ChunkKind::TextParagraph,
                BoundaryType::Paragraph,
            ));
        }
    }

    segments
}

fn group_sentences(paragraph: &str, chunk_size: usize, overlap: usize) -> Vec<Segment> {
    let emit = |group: &[(&str, usize)]| {
        let body = group.iter().map(|(s, _)| *s).collect::<Vec<_>>().join(" ");
        Segment::new(body, ChunkKind::TextSemantic, BoundaryType::Sentence)
    };

    let mut segments = Vec::new();
    let mut group: Vec<(&str, usize)> = Vec::new();
    let mut group_tokens = 0;

    for sentence in split_sentences(paragraph) {
        let tokens = count_tokens(sentence);

        if group_tokens + tokens > chunk_size && !group.is_empty() {
            segments.push(emit(&group));

            // A group shorter than the overlap is carried whole
            let carry = overlap.min(group.len());
            group.drain(..group.len() - carry);
            group_tokens = group.iter().map(|(_, t)| t).sum();
        }

        group.push((sentence, tokens));
        group_tokens += tokens;
    }

    if !group.is_empty() {
        segments.push(emit(&group));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences() {
        assert_eq!(
            split_sentences("One two. Three?! Four"),
            vec!["One two.", "Three?!", "Four"]
        );
        assert!(split_sentences("  ").is_empty());
    }

    #[test]
    fn test_paragraphs() {
        let segments = chunk_text("First para.\n\n  \nSecond para\nstill second.", 50, 2);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].content, "Second para\nstill second.");
        assert!(segments.iter().all(|s| s.kind == ChunkKind::TextParagraph));
    }

    #[test]
    fn test_sentence_groups_overlap() {
        let text = "A b. C d. E f. G h.";
        let segments = chunk_text(text, 5, 1);

        let bodies: Vec<_> = segments.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(bodies, vec!["A b. C d.", "C d. E f.", "E f. G h."]);
        assert!(segments.iter().all(|s| s.kind == ChunkKind::TextSemantic));
        assert!(segments.iter().all(|s| s.boundary == BoundaryType::Sentence));
    }

    #[test]
    fn test_short_group_carried_whole() {
        let segments = chunk_text("A b c d e f. G h.", 5, 2);

        let bodies: Vec<_> = segments.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(bodies, vec!["A b c d e f.", "A b c d e f. G h."]);
    }

    #[test]
    fn test_overlap_carries_last_two() {
        let text = "S1 a. S2 b. S3 c. S4 d.";
        let segments = chunk_text(text, 7, 2);

        assert_eq!(segments[0].content, "S1 a. S2 b. S3 c.");
        assert_eq!(segments[1].content, "S2 b. S3 c. S4 d.");
    }
}
