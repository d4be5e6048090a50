//! Run outputs for downstream CI steps, exported the way the GitHub toolkit
//! does it: `key=value` lines appended to the file named by `GITHUB_ENV`.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

pub struct OutputWriter {
    path: Option<PathBuf>,
}

impl OutputWriter {
    /// Writer backed by `GITHUB_ENV`, or a logging no-op outside CI.
    pub fn from_env() -> Self {
        let path = std::env::var("GITHUB_ENV")
            .ok()
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        if path.is_none() {
            debug!("GITHUB_ENV is not set; run outputs will only be logged");
        }
        Self { path }
    }

    #[cfg(test)]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    #[cfg(test)]
    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// Export a single `key=value` pair. Later writes of the same key win,
    /// since the consumer reads the file top to bottom.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        info!("Output {}={}", key, value);
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open '{}'", path.display()))?;
        writeln!(file, "{}={}", key, value).context("Failed to write run output")?;
        Ok(())
    }
}
