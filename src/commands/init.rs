//! Init command implementation

use crate::config::Config;
use crate::error::Result;
use std::path::PathBuf;
use tracing::info;

/// Write a default configuration file
pub fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<Config> {
    let config = Config::init(base_dir, force)?;
    info!("Initialized ragcore at {:?}", config.paths.base_dir);
    Ok(config)
}
