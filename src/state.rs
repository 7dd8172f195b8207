//! Single-slot persistence of the last known public IP.

use crate::error::{MonitorError, Result};
use crate::ip::PublicIp;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// File-backed store for the last known public IP.
///
/// The file holds exactly one dotted-quad address. Writes go through a
/// sibling temp file followed by a rename, so readers never observe a
/// partial value.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the last known IP. `Ok(None)` when nothing has been persisted
    /// yet (the file does not exist).
    pub async fn read(&self) -> Result<Option<PublicIp>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => {
                let ip = PublicIp::parse(content.trim()).map_err(|_| {
                    MonitorError::State(format!(
                        "Stored value in {} is not a valid public IP: {:?}",
                        self.path.display(),
                        content.trim()
                    ))
                })?;
                Ok(Some(ip))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MonitorError::State(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Overwrite the stored IP. Atomic from the caller's point of view.
    pub async fn write(&self, ip: &PublicIp) -> Result<()> {
        let temp_path = self.temp_path();

        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                MonitorError::State(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(ip.as_str().as_bytes()).await.map_err(|e| {
                MonitorError::State(format!(
                    "Failed to write {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                MonitorError::State(format!(
                    "Failed to flush {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            MonitorError::State(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!("Persisted last known IP {} to {}", ip, self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }
}
