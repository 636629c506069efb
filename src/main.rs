//! ragcore CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use ragcore::{
    chunk::{ContentType, Language},
    commands::{cmd_chunk, cmd_evaluate, cmd_init, print_batch_report, print_chunks, ChunkOptions},
    config::Config,
    error::Result,
};
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ragcore")]
#[command(version, about = "Chunk documents and evaluate RAG answers", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "RAGCORE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Split a file into chunks
    Chunk {
        /// File to chunk
        file: PathBuf,

        /// Content type: auto, code, markdown or text
        #[arg(short = 't', long = "type", default_value = "auto")]
        content_type: String,

        /// Programming language (inferred from the file name when omitted)
        #[arg(short, long)]
        language: Option<String>,

        /// Document ID recorded on every chunk (defaults to the file name)
        #[arg(long)]
        document_id: Option<String>,
    },

    /// Evaluate a JSON file of query/answer records
    Evaluate {
        /// JSON array (or single object) of evaluation inputs
        file: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "ragcore", &mut std::io::stdout());
        }

        Commands::Init { force } => {
            let base_dir = cli.config.as_deref().map(init_base_dir);
            let config = cmd_init(base_dir, force)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("✓ Wrote {}", config.paths.config_file.display());
            }
        }

        Commands::Chunk {
            file,
            content_type,
            language,
            document_id,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let options = ChunkOptions {
                content_type: ContentType::parse(&content_type),
                language: language.as_deref().map(Language::parse),
                document_id,
            };

            let report = cmd_chunk(&config, &file, options)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_chunks(&report);
            }
        }

        Commands::Evaluate { file } => {
            let config = load_config(cli.config.as_deref())?;
            let batch = cmd_evaluate(&config, &file)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&batch)?);
            } else {
                print_batch_report(&batch);
            }
        }
    }

    Ok(())
}

/// A `.toml` path means its parent directory; anything else is the directory
fn init_base_dir(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|e| e == "toml") {
        path.parent()
            .map(PathBuf::from)
            .unwrap_or_else(Config::default_base_dir)
    } else {
        path.to_path_buf()
    }
}

/// An explicit config must exist; otherwise fall back to ~/.ragcore or defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load_from(None),
    }
}
