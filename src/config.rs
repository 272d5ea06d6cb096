use anyhow::{bail, Context};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::order::DEFAULT_PARTITION_KEY;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Read once at startup from the environment (a `.env` file is loaded first
// when present). Every value has a default suitable for a local run.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Scylla,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "scylla" => Ok(StoreBackend::Scylla),
            other => bail!("Unknown order store backend '{}' (expected memory or scylla)", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveBackend {
    None,
    Memory,
    Fs,
    Redis,
}

impl FromStr for ArchiveBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(ArchiveBackend::None),
            "memory" => Ok(ArchiveBackend::Memory),
            "fs" => Ok(ArchiveBackend::Fs),
            "redis" => Ok(ArchiveBackend::Redis),
            other => bail!(
                "Unknown receipt archive backend '{}' (expected none, memory, fs or redis)",
                other
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub store: StoreBackend,
    pub scylla_nodes: Vec<String>,
    pub scylla_keyspace: String,
    pub partition_key: String,
    pub archive: ArchiveBackend,
    pub redis_url: String,
    pub receipt_dir: PathBuf,
    pub heartbeat_interval: Duration,
    pub client_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let secs = |key: &str, default: u64| -> anyhow::Result<Duration> {
            let secs = match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("{} must be a whole number of seconds", key))?,
                None => default,
            };
            if secs == 0 {
                bail!("{} must be at least 1 second", key);
            }
            Ok(Duration::from_secs(secs))
        };

        let config = Self {
            bind_addr: var("BIND_ADDR", "0.0.0.0:8080"),
            store: var("ORDER_STORE", "memory").parse()?,
            scylla_nodes: var("SCYLLA_NODES", "127.0.0.1:9042")
                .split(',')
                .map(str::trim)
                .filter(|node| !node.is_empty())
                .map(String::from)
                .collect(),
            scylla_keyspace: var("SCYLLA_KEYSPACE", "restaurant"),
            partition_key: var("ORDER_PARTITION_KEY", DEFAULT_PARTITION_KEY),
            archive: var("RECEIPT_ARCHIVE", "fs").parse()?,
            redis_url: var("REDIS_URL", "redis://127.0.0.1:6379"),
            receipt_dir: PathBuf::from(var("RECEIPT_DIR", "./receipts")),
            heartbeat_interval: secs("HEARTBEAT_INTERVAL_SECS", 5)?,
            client_timeout: secs("CLIENT_TIMEOUT_SECS", 10)?,
        };

        if config.store == StoreBackend::Scylla && config.scylla_nodes.is_empty() {
            bail!("SCYLLA_NODES must list at least one node");
        }

        Ok(config)
    }
}
