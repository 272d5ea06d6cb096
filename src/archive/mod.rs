// ============================================================================
// Receipt Archive - Write-once Blob Storage
// ============================================================================
//
// Receipts are written once per completed order under `<order id>.txt`.
// The core only needs an existence check and a write; there is no read or
// delete path.
//
// Backends:
// - fs     - one file per receipt in a local directory
// - redis  - one key per receipt, written with SETNX
// - memory - process-local map for development and tests
//
// ============================================================================

mod fs;
mod memory;
mod redis;

use async_trait::async_trait;

pub use self::fs::FsReceiptArchive;
pub use self::memory::InMemoryReceiptArchive;
pub use self::redis::RedisReceiptArchive;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArchiveError {
    #[error("The file {key} exists already.")]
    AlreadyExists { key: String },

    #[error("Invalid receipt key: {0}")]
    InvalidKey(String),

    #[error("{0}")]
    Backend(String),
}

#[async_trait]
pub trait ReceiptArchive: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, ArchiveError>;

    /// Store `bytes` under `key`. Never overwrites an existing object.
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), ArchiveError>;
}

/// Keys come from client-supplied order ids, so they must stay a single,
/// plain object name.
pub(crate) fn validate_key(key: &str) -> Result<(), ArchiveError> {
    let invalid = key.is_empty()
        || key.contains(['/', '\\', '\0'])
        || key.starts_with('.');

    if invalid {
        return Err(ArchiveError::InvalidKey(key.to_string()));
    }
    Ok(())
}
