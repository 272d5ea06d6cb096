// ============================================================================
// Order Store - Persistence Contract
// ============================================================================
//
// The reconciler and gateway only see this trait. Backends:
// - memory  - process-local store for development and tests
// - scylla  - ScyllaDB table using lightweight transactions for
//             conditional create/replace
//
// ============================================================================

mod memory;
mod scylladb;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::TryStreamExt;

use crate::domain::order::Order;

pub use memory::InMemoryOrderStore;
pub use scylladb::ScyllaOrderStore;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// Lookup found no record. Callers decide whether that is an error.
    #[error("Order {id} was not found")]
    NotFound { id: String },

    /// Conditional write rejected: the record exists (create) or its version
    /// moved (replace).
    #[error("Order {id} conflicts with the stored record")]
    Conflict { id: String },

    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Lazy, finite, non-restartable sequence of stored orders
pub type OrderStream<'a> = BoxStream<'a, Result<Order, StoreError>>;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Read one record by id within a partition
    async fn get_by_id(&self, id: &str, partition_key: &str) -> Result<Order, StoreError>;

    /// Insert a new record with version 1. Fails with `Conflict` if the id exists.
    async fn create(&self, order: &Order) -> Result<(), StoreError>;

    /// Full replace of the record at `id`, accepted only while the stored
    /// version equals `order.version`. The stored version becomes `order.version + 1`.
    async fn replace(&self, order: &Order, id: &str, partition_key: &str) -> Result<(), StoreError>;

    /// Scan every stored order
    async fn scan_all(&self) -> Result<OrderStream<'_>, StoreError>;
}

/// List capability used by the broadcast path: materializes a full scan
pub async fn list_orders(store: &dyn OrderStore) -> Result<Vec<Order>, StoreError> {
    store.scan_all().await?.try_collect().await
}
