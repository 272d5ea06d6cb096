use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::{validate_key, ArchiveError, ReceiptArchive};

/// Receipts stored as files inside one directory
pub struct FsReceiptArchive {
    root: PathBuf,
}

impl FsReceiptArchive {
    /// Open the archive, creating the directory if it does not exist yet
    pub async fn open(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;

        tracing::info!(path = %root.display(), "Receipt archive directory ready");
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ArchiveError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ReceiptArchive for FsReceiptArchive {
    async fn exists(&self, key: &str) -> Result<bool, ArchiveError> {
        let path = self.path_for(key)?;
        fs::try_exists(&path)
            .await
            .map_err(|e| ArchiveError::Backend(format!("Failed to check {}: {}", key, e)))
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        let path = self.path_for(key)?;

        // create_new makes the existence check and the create one atomic step
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ArchiveError::AlreadyExists { key: key.to_string() });
            }
            Err(e) => {
                return Err(ArchiveError::Backend(format!("Failed to create {}: {}", key, e)));
            }
        };

        file.write_all(bytes)
            .await
            .map_err(|e| ArchiveError::Backend(format!("Failed to write {}: {}", key, e)))?;
        file.flush()
            .await
            .map_err(|e| ArchiveError::Backend(format!("Failed to flush {}: {}", key, e)))?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Receipt written");
        Ok(())
    }
}
