use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

/// The terminal belongs to the UI, so logs go to a file.
pub fn init(level: LevelFilter, path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("unable to open log file {}", path.display()))?;
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Off)
        .build();
    WriteLogger::init(level, config, file).context("unable to install logger")?;
    Ok(())
}

pub fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("aggvol.log")
}
