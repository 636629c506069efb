//! Configuration management for ragcore
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! A `Config` is built once at startup and handed to the chunker and
//! evaluator by reference.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Evaluation configuration
    #[serde(default)]
    pub eval: EvalConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Chunking configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Target chunk size in whitespace tokens
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Chunks with fewer tokens are dropped
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,

    /// Chunks with more tokens are re-split into `chunk_size` windows
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Sentences carried forward when a paragraph is split
    #[serde(default = "default_overlap_sentences")]
    pub overlap_sentences: usize,

    /// Lines carried forward by the line-window fallback
    #[serde(default = "default_overlap_lines")]
    pub overlap_lines: usize,

    /// Score code content to pick a language when no hint is given
    #[serde(default = "default_language_detection")]
    pub language_detection: bool,

    /// Split on syntax-tree nodes, code patterns and headings
    #[serde(default = "default_semantic_boundaries")]
    pub semantic_boundaries: bool,
}

/// Evaluation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Cut-off used when an input does not carry its own `k`
    #[serde(default = "default_eval_k")]
    pub default_k: usize,

    /// Criteria scored into `quality_metrics`
    #[serde(default = "default_quality_criteria")]
    pub quality_criteria: Vec<String>,

    /// Thresholds used to derive report recommendations
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

/// Recommendation thresholds (compared against per-metric means)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_precision_threshold")]
    pub precision: f64,

    #[serde(default = "default_recall_threshold")]
    pub recall: f64,

    #[serde(default = "default_consistency_threshold")]
    pub consistency: f64,

    #[serde(default = "default_relevance_threshold")]
    pub relevance: f64,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for ragcore data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            min_chunk_size: default_min_chunk_size(),
            max_chunk_size: default_max_chunk_size(),
            overlap_sentences: default_overlap_sentences(),
            overlap_lines: default_overlap_lines(),
            language_detection: default_language_detection(),
            semantic_boundaries: default_semantic_boundaries(),
        }
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            default_k: default_eval_k(),
            quality_criteria: default_quality_criteria(),
            thresholds: ThresholdConfig::default(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            precision: default_precision_threshold(),
            recall: default_recall_threshold(),
            consistency: default_consistency_threshold(),
            relevance: default_relevance_threshold(),
        }
    }
}

impl ChunkConfig {
    /// Validate chunk bounds
    ///
    /// No chunk can ever satisfy `min_chunk_size > max_chunk_size`, and a
    /// `chunk_size` above the maximum would re-split into oversized windows.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk.chunk_size must be > 0".to_string()));
        }

        if self.max_chunk_size < self.min_chunk_size {
            return Err(Error::Config(
                "chunk.max_chunk_size must be >= chunk.min_chunk_size".to_string(),
            ));
        }

        if self.chunk_size > self.max_chunk_size {
            return Err(Error::Config(
                "chunk.chunk_size must be <= chunk.max_chunk_size".to_string(),
            ));
        }

        Ok(())
    }
}

impl EvalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_k == 0 {
            return Err(Error::Config("eval.default_k must be > 0".to_string()));
        }

        let t = &self.thresholds;
        for (name, value) in [
            ("precision", t.precision),
            ("recall", t.recall),
            ("consistency", t.consistency),
            ("relevance", t.relevance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "eval.thresholds.{} must be between 0.0 and 1.0",
                    name
                )));
            }
        }

        Ok(())
    }
}

impl Config {
    /// Get the default base directory for ragcore (~/.ragcore)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ragcore")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("ragcore.toml")
    }

    fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("ragcore.toml"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Write a default config into `base_dir`
    pub fn init(base_dir: Option<PathBuf>, force: bool) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() && !force {
            return Err(Error::Config(format!(
                "Config already exists at {} (use --force to overwrite)",
                config.paths.config_file.display()
            )));
        }

        config.save()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.chunk.validate()?;
        self.eval.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chunk.chunk_size, 1000);
        assert_eq!(config.chunk.min_chunk_size, 100);
        assert_eq!(config.chunk.max_chunk_size, 2000);
        assert_eq!(config.eval.default_k, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.chunk.chunk_size = 256;
        config.chunk.max_chunk_size = 512;

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(loaded.chunk.chunk_size, 256);
        assert_eq!(loaded.chunk.max_chunk_size, 512);

        let loaded = Config::load(&config.paths.config_file).unwrap();
        assert_eq!(loaded.chunk.chunk_size, 256);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[chunk]\nchunk_size = 300\n").unwrap();
        assert_eq!(config.chunk.chunk_size, 300);
        assert_eq!(config.chunk.overlap_lines, 5);
        assert_eq!(config.eval.quality_criteria.len(), 3);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        // Invalid: min > max
        config.chunk.min_chunk_size = config.chunk.max_chunk_size + 1;
        assert!(config.validate().is_err());

        config.chunk.min_chunk_size = 10;
        assert!(config.validate().is_ok());

        // Invalid: windows larger than the maximum
        config.chunk.chunk_size = config.chunk.max_chunk_size + 1;
        assert!(config.validate().is_err());

        config.chunk.chunk_size = 0;
        assert!(config.validate().is_err());

        config.chunk.chunk_size = 100;
        config.eval.thresholds.recall = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let tmp = TempDir::new().unwrap();
        Config::init(Some(tmp.path().to_path_buf()), false).unwrap();
        assert!(Config::init(Some(tmp.path().to_path_buf()), false).is_err());
        assert!(Config::init(Some(tmp.path().to_path_buf()), true).is_ok());
    }
}
