//! Structure-aware document chunking
//!
//! This module handles splitting documents into chunks while:
//! - Inferring content type (code, markdown, text) and language
//! - Cutting code at definition boundaries (syntax tree or patterns)
//! - Cutting markdown at headings and text at paragraphs/sentences
//! - Carrying sentence/line overlap across strategy-internal splits
//! - Enforcing token bounds in a final validation pass

mod boundaries;
mod code;
mod detect;
mod markdown;
mod text;

pub use boundaries::*;
pub use detect::*;

use crate::config::ChunkConfig;
use crate::document::Element;
use crate::error::Result;
use blake3::Hasher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

/// Open key-value map carried by chunks and documents
pub type Metadata = serde_json::Map<String, Value>;

/// Count whitespace-separated tokens
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Base chunk categories produced by the strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    CodeFunction,
    CodeClass,
    CodeLines,
    MarkdownSection,
    TextParagraph,
    TextSemantic,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::CodeFunction => "code_function",
            ChunkKind::CodeClass => "code_class",
            ChunkKind::CodeLines => "code_lines",
            ChunkKind::MarkdownSection => "markdown_section",
            ChunkKind::TextParagraph => "text_paragraph",
            ChunkKind::TextSemantic => "text_semantic",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "code_function" => Some(ChunkKind::CodeFunction),
            "code_class" => Some(ChunkKind::CodeClass),
            "code_lines" => Some(ChunkKind::CodeLines),
            "markdown_section" => Some(ChunkKind::MarkdownSection),
            "text_paragraph" => Some(ChunkKind::TextParagraph),
            "text_semantic" => Some(ChunkKind::TextSemantic),
            _ => None,
        }
    }
}

/// Chunk type tag, e.g. `code_function` or `code_function_sub`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChunkType {
    pub kind: ChunkKind,
    /// Produced by re-splitting an oversized chunk
    pub sub: bool,
}

impl ChunkType {
    pub fn new(kind: ChunkKind) -> Self {
        Self { kind, sub: false }
    }

    pub fn as_sub(self) -> Self {
        Self { sub: true, ..self }
    }
}

impl std::fmt::Display for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.sub {
            write!(f, "{}_sub", self.kind.as_str())
        } else {
            f.write_str(self.kind.as_str())
        }
    }
}

impl TryFrom<String> for ChunkType {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        let (base, sub) = match value.strip_suffix("_sub") {
            Some(base) => (base, true),
            None => (value.as_str(), false),
        };
        ChunkKind::parse(base)
            .map(|kind| ChunkType { kind, sub })
            .ok_or_else(|| format!("unknown chunk type: {}", value))
    }
}

impl From<ChunkType> for String {
    fn from(chunk_type: ChunkType) -> Self {
        chunk_type.to_string()
    }
}

impl PartialEq<&str> for ChunkType {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

/// A bounded slice of a document, the unit of embedding and retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier generated at creation
    pub id: String,

    /// Owning document
    pub document_id: String,

    /// The text slice
    pub content: String,

    /// 0-based position among sibling chunks (sub-chunks share their parent's)
    pub index: usize,

    pub chunk_type: ChunkType,

    /// Set only for code chunks
    pub language: Option<Language>,

    /// 1-based inclusive line span, for line-oriented input
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,

    /// Whitespace token count of `content`
    pub token_count: usize,

    pub metadata: Metadata,

    pub created_at: DateTime<Utc>,
}

impl Chunk {
    /// Compute the hash for a chunk's content
    pub fn compute_hash(text: &str, document_id: &str) -> String {
        let mut hasher = Hasher::new();
        hasher.update(document_id.as_bytes());
        hasher.update(text.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    fn from_segment(segment: Segment, document_id: &str, index: usize, base: &Metadata) -> Self {
        let mut metadata = base.clone();
        metadata.extend(segment.metadata);
        metadata.insert(
            "boundary_type".to_string(),
            Value::from(segment.boundary.as_str()),
        );
        metadata.insert(
            "content_hash".to_string(),
            Value::from(Self::compute_hash(&segment.content, document_id)),
        );

        let (start_line, end_line) = match segment.lines {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        };

        Self {
            id: Uuid::new_v4().to_string(),
            document_id: document_id.to_string(),
            token_count: count_tokens(&segment.content),
            content: segment.content,
            index,
            chunk_type: ChunkType::new(segment.kind),
            language: segment.language,
            start_line,
            end_line,
            metadata,
            created_at: Utc::now(),
        }
    }
}

/// A strategy's output before ids and positions are assigned
#[derive(Debug, Clone)]
pub(crate) struct Segment {
    pub content: String,
    pub kind: ChunkKind,
    pub boundary: BoundaryType,
    pub language: Option<Language>,
    pub lines: Option<(usize, usize)>,
    pub metadata: Metadata,
}

impl Segment {
    pub fn new(content: impl Into<String>, kind: ChunkKind, boundary: BoundaryType) -> Self {
        Self {
            content: content.into(),
            kind,
            boundary,
            language: None,
            lines: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_language(mut self, language: Option<&Language>) -> Self {
        self.language = language.cloned();
        self
    }

    pub fn with_lines(mut self, start: usize, end: usize) -> Self {
        self.lines = Some((start, end));
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// What a chunking call decided and how validation changed its output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingSummary {
    pub total_chunks: usize,
    pub content_type: ContentType,
    pub language: Option<Language>,
    /// Strategy chunks dropped for being under `min_chunk_size`
    pub dropped_chunks: usize,
    /// Chunks replaced by sub-chunks for being over `max_chunk_size`
    pub split_chunks: usize,
    pub chunk_size: usize,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
}

/// Splits documents into validated chunks
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    /// Create a chunker, rejecting bounds no chunk could satisfy
    pub fn new(config: ChunkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Chunk a document
    ///
    /// Empty (or whitespace-only) content yields no chunks.
    pub fn chunk(
        &self,
        content: &str,
        document_id: &str,
        content_type: ContentType,
        language_hint: Option<Language>,
    ) -> Vec<Chunk> {
        let base = Metadata::new();
        self.chunk_with_summary(content, document_id, content_type, language_hint, &base)
            .0
    }

    /// Chunk a document built from tagged elements
    ///
    /// Text elements are joined with blank lines; metadata elements are
    /// merged (later keys win) into every chunk's metadata.
    pub fn chunk_elements(
        &self,
        elements: &[Element],
        document_id: &str,
        content_type: ContentType,
        language_hint: Option<Language>,
    ) -> Vec<Chunk> {
        let mut texts: Vec<&str> = Vec::new();
        let mut base = Metadata::new();

        for element in elements {
            match element {
                Element::Text { text } => texts.push(text),
                Element::Metadata { values } => {
                    base.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }

        let content = texts.join("\n\n");
        self.chunk_with_summary(&content, document_id, content_type, language_hint, &base)
            .0
    }

    /// Chunk a document, also reporting the decisions taken
    pub fn chunk_with_summary(
        &self,
        content: &str,
        document_id: &str,
        content_type: ContentType,
        language_hint: Option<Language>,
        base_metadata: &Metadata,
    ) -> (Vec<Chunk>, ChunkingSummary) {
        let content_type = match content_type {
            ContentType::Auto => detect_content_type(content),
            other => other,
        };

        let language = if content_type == ContentType::Code {
            language_hint.or_else(|| {
                if self.config.language_detection {
                    detect_language(content)
                } else {
                    None
                }
            })
        } else {
            None
        };

        let mut summary = ChunkingSummary {
            total_chunks: 0,
            content_type,
            language: language.clone(),
            dropped_chunks: 0,
            split_chunks: 0,
            chunk_size: self.config.chunk_size,
            min_chunk_size: self.config.min_chunk_size,
            max_chunk_size: self.config.max_chunk_size,
        };

        if content.trim().is_empty() {
            return (Vec::new(), summary);
        }

        let segments = self.dispatch(content, content_type, language.as_ref());
        let chunks: Vec<Chunk> = segments
            .into_iter()
            .enumerate()
            .map(|(index, segment)| Chunk::from_segment(segment, document_id, index, base_metadata))
            .collect();

        let chunks = self.validate_chunks(chunks, &mut summary);
        summary.total_chunks = chunks.len();

        info!(
            "Chunked document {} as {} into {} chunks ({} dropped, {} split)",
            document_id,
            content_type,
            summary.total_chunks,
            summary.dropped_chunks,
            summary.split_chunks
        );

        (chunks, summary)
    }

    fn dispatch(
        &self,
        content: &str,
        content_type: ContentType,
        language: Option<&Language>,
    ) -> Vec<Segment> {
        match content_type {
            ContentType::Code => self.chunk_code(content, language),
            ContentType::Markdown if self.config.semantic_boundaries => {
                markdown::chunk_markdown(content)
            }
            _ => text::chunk_text(
                content,
                self.config.chunk_size,
                self.config.overlap_sentences,
            ),
        }
    }

    fn chunk_code(&self, content: &str, language: Option<&Language>) -> Vec<Segment> {
        let by_lines = || {
            code::chunk_by_lines(
                content,
                language,
                self.config.chunk_size,
                self.config.overlap_lines,
            )
        };

        if !self.config.semantic_boundaries {
            return by_lines();
        }

        if language == Some(&Language::Python) {
            return code::chunk_python(content).unwrap_or_else(by_lines);
        }

        let segments = code::chunk_with_patterns(content, language);
        if segments.is_empty() {
            debug!("No code patterns matched, falling back to line-based chunking");
            return by_lines();
        }
        segments
    }

    /// Drop undersized chunks and re-split oversized ones
    ///
    /// Sub-chunks are never dropped, so a trailing window may fall under
    /// `min_chunk_size`.
    fn validate_chunks(&self, chunks: Vec<Chunk>, summary: &mut ChunkingSummary) -> Vec<Chunk> {
        let mut valid = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            if chunk.token_count < self.config.min_chunk_size {
                summary.dropped_chunks += 1;
                continue;
            }

            if chunk.token_count > self.config.max_chunk_size {
                summary.split_chunks += 1;
                // Every window is kept, a short trailing one included
                valid.extend(self.split_large_chunk(&chunk));
            } else {
                valid.push(chunk);
            }
        }

        valid
    }

    /// Slice an oversized chunk into fixed `chunk_size` word windows
    fn split_large_chunk(&self, chunk: &Chunk) -> Vec<Chunk> {
        let words: Vec<&str> = chunk.content.split_whitespace().collect();

        words
            .chunks(self.config.chunk_size)
            .enumerate()
            .map(|(sub_index, window)| {
                let content = window.join(" ");
                let mut metadata = chunk.metadata.clone();
                metadata.insert("original_chunk_id".to_string(), Value::from(chunk.id.clone()));
                metadata.insert("is_sub_chunk".to_string(), Value::from(true));
                metadata.insert("sub_chunk_index".to_string(), Value::from(sub_index));
                metadata.insert(
                    "boundary_type".to_string(),
                    Value::from(BoundaryType::Window.as_str()),
                );
                metadata.insert(
                    "content_hash".to_string(),
                    Value::from(Chunk::compute_hash(&content, &chunk.document_id)),
                );

                Chunk {
                    id: Uuid::new_v4().to_string(),
                    document_id: chunk.document_id.clone(),
                    token_count: window.len(),
                    content,
                    index: chunk.index,
                    chunk_type: chunk.chunk_type.as_sub(),
                    language: chunk.language.clone(),
                    start_line: chunk.start_line,
                    end_line: chunk.end_line,
                    metadata,
                    created_at: Utc::now(),
                }
            })
            .collect()
    }
}
