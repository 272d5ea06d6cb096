use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{validate_key, ArchiveError, ReceiptArchive};

/// Prefix grouping every receipt key, the equivalent of a blob container
const CONTAINER: &str = "restaurant";

/// Receipts stored as Redis strings under `restaurant:<key>`
#[derive(Clone)]
pub struct RedisReceiptArchive {
    conn: ConnectionManager,
}

impl RedisReceiptArchive {
    pub async fn connect(redis_url: &str) -> anyhow::Result<Self> {
        tracing::info!("Connecting to Redis receipt archive at {}", redis_url);

        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        tracing::info!("✅ Connected to Redis receipt archive");
        Ok(Self { conn })
    }
}

fn object_name(key: &str) -> Result<String, ArchiveError> {
    validate_key(key)?;
    Ok(format!("{}:{}", CONTAINER, key))
}

#[async_trait]
impl ReceiptArchive for RedisReceiptArchive {
    async fn exists(&self, key: &str) -> Result<bool, ArchiveError> {
        let name = object_name(key)?;
        let mut conn = self.conn.clone();

        conn.exists(&name)
            .await
            .map_err(|e| ArchiveError::Backend(format!("Redis EXISTS failed: {}", e)))
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        let name = object_name(key)?;
        let mut conn = self.conn.clone();

        let written: bool = conn
            .set_nx(&name, bytes)
            .await
            .map_err(|e| ArchiveError::Backend(format!("Redis SETNX failed: {}", e)))?;

        if !written {
            return Err(ArchiveError::AlreadyExists { key: key.to_string() });
        }

        tracing::debug!(key = %name, size = bytes.len(), "Receipt written to Redis");
        Ok(())
    }
}
