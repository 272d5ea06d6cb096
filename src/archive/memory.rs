use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{validate_key, ArchiveError, ReceiptArchive};

#[derive(Default)]
pub struct InMemoryReceiptArchive {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryReceiptArchive {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().await.get(key).cloned()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }
}

#[async_trait]
impl ReceiptArchive for InMemoryReceiptArchive {
    async fn exists(&self, key: &str) -> Result<bool, ArchiveError> {
        validate_key(key)?;
        Ok(self.objects.lock().await.contains_key(key))
    }

    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        validate_key(key)?;
        let mut objects = self.objects.lock().await;

        if objects.contains_key(key) {
            return Err(ArchiveError::AlreadyExists { key: key.to_string() });
        }

        objects.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_once() {
        let archive = InMemoryReceiptArchive::new();

        archive.write("a.txt", b"one").await.unwrap();
        assert!(archive.exists("a.txt").await.unwrap());

        let err = archive.write("a.txt", b"two").await.unwrap_err();
        assert_eq!(err, ArchiveError::AlreadyExists { key: "a.txt".to_string() });
        assert_eq!(archive.get("a.txt").await.unwrap(), b"one".to_vec());
        assert_eq!(archive.len().await, 1);
    }
}
