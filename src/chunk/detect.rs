//! Content type and programming language detection
//!
//! Detection is driven by ordered rule tables:
//! - a code battery (any single hit classifies content as code)
//! - a per-line markdown battery (more than 10% of lines must hit)
//! - weighted language rules, scored by match count
//!
//! Language ties go to the language declared first in [`LANGUAGE_RULES`].
//! That order is arbitrary but stable.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Content types the chunker dispatches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Infer from the content itself
    #[default]
    Auto,
    Code,
    Markdown,
    Text,
}

impl ContentType {
    /// Parse a content type name; unrecognized names fall back to `Text`
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "auto" => ContentType::Auto,
            "code" => ContentType::Code,
            "markdown" | "md" => ContentType::Markdown,
            _ => ContentType::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Auto => "auto",
            ContentType::Code => "code",
            ContentType::Markdown => "markdown",
            ContentType::Text => "text",
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ContentType::parse(s))
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Programming language tag attached to code chunks
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Cpp,
    C,
    Go,
    Rust,
    /// Any other tag (from a hint or a file extension)
    Other(String),
}

impl Language {
    pub fn as_str(&self) -> &str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Other(tag) => tag,
        }
    }

    /// Parse a language tag (case-insensitive, common aliases accepted)
    pub fn parse(tag: &str) -> Self {
        let lower = tag.trim().to_lowercase();
        match lower.as_str() {
            "python" | "py" => Language::Python,
            "javascript" | "js" => Language::JavaScript,
            "typescript" | "ts" => Language::TypeScript,
            "java" => Language::Java,
            "cpp" | "c++" => Language::Cpp,
            "c" => Language::C,
            "go" | "golang" => Language::Go,
            "rust" | "rs" => Language::Rust,
            _ => Language::Other(lower),
        }
    }

    /// Detect language from a file name's extension
    pub fn from_filename(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        let tag = match ext.to_lowercase().as_str() {
            "py" | "pyw" | "pyx" | "pxd" => "python",
            "js" | "jsx" | "mjs" => "javascript",
            "ts" | "tsx" => "typescript",
            "java" => "java",
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => "cpp",
            "c" | "h" => "c",
            "go" => "go",
            "rs" => "rust",
            "php" => "php",
            "rb" => "ruby",
            "swift" => "swift",
            "kt" | "kts" => "kotlin",
            "scala" => "scala",
            "r" => "r",
            "m" => "matlab",
            "sql" => "sql",
            "sh" | "bash" | "zsh" | "fish" => "shell",
            "yaml" | "yml" => "yaml",
            "json" => "json",
            "xml" => "xml",
            "html" | "htm" => "html",
            "css" | "scss" | "sass" | "less" => "css",
            _ => return None,
        };
        Some(Language::parse(tag))
    }
}

impl From<String> for Language {
    fn from(tag: String) -> Self {
        Language::parse(&tag)
    }
}

impl From<Language> for String {
    fn from(language: Language) -> Self {
        language.as_str().to_string()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weighted language indicator
struct LanguageRule {
    language: Language,
    pattern: Regex,
    weight: usize,
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("built-in detection pattern must compile"))
        .collect()
}

static CODE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"(?m)\bdef\s+\w+\s*\(",
        r"(?m)\bclass\s+\w+",
        r"(?m)\bimport\s+\w+",
        r"(?m)\bfrom\s+\w+\s+import\b",
        r"(?m)\bfunction\s+\w+",
        r"(?m)\bconst\s+\w+",
        r"(?m)\blet\s+\w+",
        r"(?m)\bvar\s+\w+",
        r"(?m)\bpublic\s+class\b",
        r"(?m)\bprivate\s+\w+",
        r"(?m)#include\s*<",
        r"(?m)\bpackage\s+\w+",
    ])
});

// Matched against single lines, anchored at the line start
static MARKDOWN_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"^#{1,6}\s+",
        r"^\*\*.*\*\*$",
        r"^\*.*\*$",
        r"^```",
        r"^\[.*\]\(.*\)",
        r"^>\s+",
        r"^\|\s+.*\s+\|",
    ])
});

static LANGUAGE_RULES: LazyLock<Vec<LanguageRule>> = LazyLock::new(|| {
    let table: &[(Language, &str, usize)] = &[
        (Language::Python, r"(?m)\bdef\s+\w+\s*\(", 1),
        (Language::Python, r"(?m)\bimport\s+\w+", 1),
        (Language::Python, r"(?m)\bfrom\s+\w+\s+import\b", 1),
        (Language::Python, r"(?m)\bclass\s+\w+.*:\s*$", 1),
        (Language::Python, r#"(?m)if\s+__name__\s*==\s*['"]__main__['"]"#, 1),
        (Language::JavaScript, r"(?m)\bfunction\s+\w+", 1),
        (Language::JavaScript, r"(?m)\bconst\s+\w+", 1),
        (Language::JavaScript, r"(?m)\blet\s+\w+", 1),
        (Language::JavaScript, r"(?m)\bvar\s+\w+", 1),
        (Language::JavaScript, r"console\.log", 1),
        (Language::JavaScript, r"(?m)\bexport\s+default\b", 1),
        (Language::TypeScript, r"(?m)\binterface\s+\w+", 1),
        (Language::TypeScript, r"(?m)\btype\s+\w+\s*=", 1),
        (Language::TypeScript, r":\s*\w+\[\]", 1),
        (Language::TypeScript, r"Promise<\w+>", 1),
        (Language::Java, r"(?m)\bpublic\s+class\b", 1),
        (Language::Java, r"(?m)\bprivate\s+\w+", 1),
        (Language::Java, r"public\s+static\s+void\s+main", 1),
        (Language::Java, r"(?m)\bimport\s+java\.", 1),
        (Language::Cpp, r"#include\s*<", 1),
        (Language::Cpp, r"std::", 1),
        (Language::Cpp, r"(?m)\bnamespace\s+\w+", 1),
        (Language::Cpp, r"(?m)\bclass\s+\w+\s*\{", 1),
        (Language::C, r"#include\s*<", 1),
        (Language::C, r"\bint\s+main\s*\(", 1),
        (Language::C, r"\bprintf\s*\(", 1),
        (Language::C, r"(?m)\bstruct\s+\w+", 1),
        (Language::Go, r"(?m)^\s*package\s+\w+", 1),
        (Language::Go, r"(?m)\bfunc\s+", 1),
        (Language::Go, r"(?m)\bimport\s*\(", 1),
        (Language::Go, r"\bfmt\.", 1),
        (Language::Rust, r"(?m)\bfn\s+\w+", 1),
        (Language::Rust, r"(?m)\buse\s+\w+(::|;)", 1),
        (Language::Rust, r"(?m)\bpub\s+fn\b", 1),
        (Language::Rust, r"(?m)\blet\s+mut\s+\w+", 1),
    ];

    table
        .iter()
        .map(|(language, pattern, weight)| LanguageRule {
            language: language.clone(),
            pattern: Regex::new(pattern).expect("built-in language pattern must compile"),
            weight: *weight,
        })
        .collect()
});

/// Check if content looks like source code
pub fn is_code_content(content: &str) -> bool {
    CODE_PATTERNS.iter().any(|re| re.is_match(content))
}

/// Check if more than 10% of lines carry markdown syntax
pub fn is_markdown_content(content: &str) -> bool {
    let lines: Vec<&str> = content.split('\n').collect();
    let markdown_lines = lines
        .iter()
        .filter(|line| MARKDOWN_PATTERNS.iter().any(|re| re.is_match(line)))
        .count();

    markdown_lines as f64 > lines.len() as f64 * 0.1
}

/// Infer the content type: code, then markdown, then plain text
pub fn detect_content_type(content: &str) -> ContentType {
    if is_code_content(content) {
        ContentType::Code
    } else if is_markdown_content(content) {
        ContentType::Markdown
    } else {
        ContentType::Text
    }
}

/// Per-language scores in declaration order
pub fn language_scores(content: &str) -> Vec<(Language, usize)> {
    let mut scores: Vec<(Language, usize)> = Vec::new();

    for rule in LANGUAGE_RULES.iter() {
        let hits = rule.pattern.find_iter(content).count() * rule.weight;
        match scores.iter_mut().find(|(lang, _)| *lang == rule.language) {
            Some((_, score)) => *score += hits,
            None => scores.push((rule.language.clone(), hits)),
        }
    }

    scores
}

/// Pick the highest-scoring language; `None` when nothing matched
pub fn detect_language(content: &str) -> Option<Language> {
    let scores = language_scores(content);
    let mut best: Option<(Language, usize)> = None;

    for (language, score) in scores {
        if score == 0 {
            continue;
        }
        // Strictly greater: earlier declarations win ties
        if best.as_ref().map_or(true, |(_, top)| score > *top) {
            best = Some((language, score));
        }
    }

    debug!("Detected language: {:?}", best);
    best.map(|(language, _)| language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parse() {
        assert_eq!(ContentType::parse("code"), ContentType::Code);
        assert_eq!(ContentType::parse("Markdown"), ContentType::Markdown);
        assert_eq!(ContentType::parse("auto"), ContentType::Auto);
        assert_eq!(ContentType::parse("spreadsheet"), ContentType::Text);
        assert_eq!("text".parse::<ContentType>().unwrap(), ContentType::Text);
    }

    #[test]
    fn test_detect_code() {
        assert_eq!(detect_content_type("def main():\n    pass\n"), ContentType::Code);
        assert_eq!(detect_content_type("#include <stdio.h>\n"), ContentType::Code);
    }

    #[test]
    fn test_detect_markdown() {
        let text = "# Title\n\nSome words here.\n\n## Section\n\nMore words.";
        assert_eq!(detect_content_type(text), ContentType::Markdown);
    }

    #[test]
    fn test_detect_plain_text() {
        let text = "The weather was calm.\nBirds sang in the morning.\nNothing else happened.";
        assert_eq!(detect_content_type(text), ContentType::Text);
    }

    #[test]
    fn test_markdown_threshold() {
        // 1 of 10 lines is exactly 10%, which is not enough
        let mut lines = vec!["> quoted"];
        lines.extend(std::iter::repeat("plain line").take(9));
        assert!(!is_markdown_content(&lines.join("\n")));

        lines.push("> another quote");
        assert!(is_markdown_content(&lines.join("\n")));
    }

    #[test]
    fn test_detect_python() {
        let code = "import os\n\ndef run():\n    pass\n\nif __name__ == '__main__':\n    run()\n";
        assert_eq!(detect_language(code), Some(Language::Python));
    }

    #[test]
    fn test_detect_go() {
        let code = "package main\n\nimport \"fmt\"\n\nfunc main() {\n    fmt.Println(\"hi\")\n}\n";
        assert_eq!(detect_language(code), Some(Language::Go));
    }

    #[test]
    fn test_detect_rust() {
        let code = "use std::io;\n\npub fn run() {\n    let mut x = 1;\n    x += 1;\n}\n";
        assert_eq!(detect_language(code), Some(Language::Rust));
    }

    #[test]
    fn test_tie_goes_to_first_declared() {
        // `#include <` scores one point for both cpp and c; cpp is declared first
        assert_eq!(detect_language("#include <x>"), Some(Language::Cpp));
    }

    #[test]
    fn test_no_language() {
        assert_eq!(detect_language("nothing to see"), None);
    }

    #[test]
    fn test_language_from_filename() {
        assert_eq!(Language::from_filename(Path::new("a/b.py")), Some(Language::Python));
        assert_eq!(Language::from_filename(Path::new("main.RS")), Some(Language::Rust));
        assert_eq!(
            Language::from_filename(Path::new("deploy.sh")),
            Some(Language::Other("shell".to_string()))
        );
        assert_eq!(Language::from_filename(Path::new("README")), None);
    }

    #[test]
    fn test_language_serde_as_string() {
        let json = serde_json::to_string(&Language::TypeScript).unwrap();
        assert_eq!(json, "\"typescript\"");
        let parsed: Language = serde_json::from_str("\"ruby\"").unwrap();
        assert_eq!(parsed, Language::Other("ruby".to_string()));
    }
}
