//! Chunk command implementation

use crate::chunk::{Chunk, Chunker, ChunkingSummary, ContentType, Language, Metadata};
use crate::config::Config;
use crate::error::{Error, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct ChunkOptions {
    pub content_type: ContentType,
    pub language: Option<Language>,
    /// Defaults to the file name
    pub document_id: Option<String>,
}

/// Chunks of one file plus the decisions behind them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkReport {
    pub source: String,
    pub summary: ChunkingSummary,
    pub chunks: Vec<Chunk>,
}

/// Content type implied by a file's extension, if the caller left it on auto
fn content_type_for(
    path: &Path,
    requested: ContentType,
    language: Option<&Language>,
) -> ContentType {
    if requested != ContentType::Auto {
        return requested;
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match (ext.as_deref(), language) {
        (Some("md" | "markdown"), _) => ContentType::Markdown,
        (Some("txt"), _) => ContentType::Text,
        (_, Some(language)) if !matches!(language, Language::Other(_)) => ContentType::Code,
        _ => ContentType::Auto,
    }
}

/// Chunk a file with the configured chunker
pub fn cmd_chunk(config: &Config, path: &Path, options: ChunkOptions) -> Result<ChunkReport> {
    if !path.is_file() {
        return Err(Error::InvalidInput(format!("Not a file: {}", path.display())));
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let chunker = Chunker::new(config.chunk.clone())?;

    let language = options.language.or_else(|| Language::from_filename(path));
    let content_type = content_type_for(path, options.content_type, language.as_ref());
    let document_id = options.document_id.unwrap_or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    });

    let mut base = Metadata::new();
    base.insert("source_path".to_string(), path.display().to_string().into());

    let (chunks, summary) =
        chunker.chunk_with_summary(&content, &document_id, content_type, language, &base);

    info!(
        "Chunked {} into {} chunks ({} dropped, {} split)",
        path.display(),
        summary.total_chunks,
        summary.dropped_chunks,
        summary.split_chunks
    );

    Ok(ChunkReport {
        source: path.display().to_string(),
        summary,
        chunks,
    })
}

/// Print chunks to console
pub fn print_chunks(report: &ChunkReport) {
    let summary = &report.summary;
    println!("\n✂ {}\n", report.source);
    println!("Content type: {}", summary.content_type);
    if let Some(language) = &summary.language {
        println!("Language: {}", language);
    }
    println!(
        "Chunks: {} ({} dropped, {} split)",
        summary.total_chunks, summary.dropped_chunks, summary.split_chunks
    );
    println!();

    for chunk in &report.chunks {
        let lines = match (chunk.start_line, chunk.end_line) {
            (Some(start), Some(end)) => format!(" lines {}-{}", start, end),
            _ => String::new(),
        };
        println!(
            "[{}] {} · {} tokens{}",
            chunk.index, chunk.chunk_type, chunk.token_count, lines
        );

        let preview: String = chunk.content.chars().take(80).collect();
        println!("  {}", preview.replace('\n', " "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.chunk.min_chunk_size = 2;
        config
    }

    #[test]
    fn test_chunk_python_file_infers_language() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tools.py");
        std::fs::write(
            &path,
            concat!(
                "def load(path):\n    return open(path).read()\n\n",
                "def save(path, data):\n    open(path, 'w').write(data)\n",
            ),
        )
        .unwrap();

        let report = cmd_chunk(&small_config(), &path, ChunkOptions::default()).unwrap();

        assert_eq!(report.summary.content_type, ContentType::Code);
        assert_eq!(report.summary.language, Some(Language::Python));
        assert_eq!(report.chunks.len(), 2);
        assert_eq!(report.chunks[0].document_id, "tools.py");
        assert_eq!(report.chunks[0].metadata["node_name"], "load");
        assert!(report.chunks[0].metadata.contains_key("source_path"));
    }

    #[test]
    fn test_chunk_markdown_file_with_document_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# One\nfirst section body\n\n# Two\nsecond section body\n").unwrap();

        let options = ChunkOptions {
            document_id: Some("doc-7".to_string()),
            ..Default::default()
        };
        let report = cmd_chunk(&small_config(), &path, options).unwrap();

        assert_eq!(report.summary.content_type, ContentType::Markdown);
        assert_eq!(report.chunks.len(), 2);
        assert!(report.chunks.iter().all(|c| c.document_id == "doc-7"));
    }

    #[test]
    fn test_chunk_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = cmd_chunk(
            &Config::default(),
            &dir.path().join("absent.txt"),
            ChunkOptions::default(),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_content_type_for_extension() {
        let rust = Language::Rust;
        let yaml = Language::parse("yaml");
        assert_eq!(
            content_type_for(Path::new("a.md"), ContentType::Auto, None),
            ContentType::Markdown
        );
        assert_eq!(
            content_type_for(Path::new("a.rs"), ContentType::Auto, Some(&rust)),
            ContentType::Code
        );
        assert_eq!(
            content_type_for(Path::new("a.yml"), ContentType::Auto, Some(&yaml)),
            ContentType::Auto
        );
        assert_eq!(
            content_type_for(Path::new("a.md"), ContentType::Text, None),
            ContentType::Text
        );
    }
}
