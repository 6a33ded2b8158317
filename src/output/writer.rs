// ABOUTME: Output writers for report destinations (stdout and files)
// ABOUTME: Emits formatted reports, creating parent directories for file targets

use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::config::OutputDestination;
use super::error::{OutputError, Result};

#[async_trait]
pub trait OutputWriter: Send + Sync {
    async fn write(&self, content: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct StdoutWriter;

#[derive(Debug)]
pub struct FileWriter {
    path: std::path::PathBuf,
    create_dirs: bool,
}

/// Writer for a configured destination
pub fn writer_for(destination: &OutputDestination) -> Box<dyn OutputWriter> {
    match destination {
        OutputDestination::Stdout => Box::new(StdoutWriter),
        OutputDestination::File { path, create_dirs } => Box::new(FileWriter {
            path: path.clone(),
            create_dirs: *create_dirs,
        }),
    }
}

#[async_trait]
impl OutputWriter for StdoutWriter {
    async fn write(&self, content: &str) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(content.as_bytes()).await?;
        if !content.ends_with('\n') {
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;

        debug!("Output written to stdout ({} chars)", content.len());
        Ok(())
    }
}

impl FileWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            create_dirs: true,
        }
    }
}

#[async_trait]
impl OutputWriter for FileWriter {
    async fn write(&self, content: &str) -> Result<()> {
        if self.create_dirs {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| OutputError::WriteError {
                        message: format!("Failed to create directory {}: {}", parent.display(), e),
                    })?;
            }
        }

        fs::write(&self.path, content)
            .await
            .map_err(|e| OutputError::WriteError {
                message: format!("Failed to write file {}: {}", self.path.display(), e),
            })?;

        info!(
            "Output written to file: {} ({} bytes)",
            self.path.display(),
            content.len()
        );
        Ok(())
    }
}
