use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{OrderStore, OrderStream, StoreError};
use crate::domain::order::{Order, DEFAULT_PARTITION_KEY};

/// Process-local order store keyed by `(partition_key, id)`. Scans cover
/// the store's own partition only.
pub struct InMemoryOrderStore {
    records: RwLock<BTreeMap<(String, String), Order>>,
    partition_key: String,
}

impl InMemoryOrderStore {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::with_partition_key(DEFAULT_PARTITION_KEY)
    }

    pub fn with_partition_key(partition_key: impl Into<String>) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            partition_key: partition_key.into(),
        }
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get_by_id(&self, id: &str, partition_key: &str) -> Result<Order, StoreError> {
        let records = self.records.read().await;
        records
            .get(&(partition_key.to_string(), id.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let key = (order.partition_key.clone(), order.id.clone());

        if records.contains_key(&key) {
            return Err(StoreError::Conflict { id: order.id.clone() });
        }

        let mut stored = order.clone();
        stored.version = 1;
        records.insert(key, stored);

        tracing::debug!(order_id = %order.id, "Inserted order into memory store");
        Ok(())
    }

    async fn replace(&self, order: &Order, id: &str, partition_key: &str) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let current = records
            .get_mut(&(partition_key.to_string(), id.to_string()))
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        if current.version != order.version {
            tracing::warn!(
                order_id = %id,
                expected_version = order.version,
                current_version = current.version,
                "Rejected stale replace"
            );
            return Err(StoreError::Conflict { id: id.to_string() });
        }

        let mut replacement = order.clone();
        replacement.id = id.to_string();
        replacement.partition_key = partition_key.to_string();
        replacement.version = order.version + 1;
        *current = replacement;

        Ok(())
    }

    async fn scan_all(&self) -> Result<OrderStream<'_>, StoreError> {
        let snapshot: Vec<Order> = self
            .records
            .read()
            .await
            .iter()
            .filter(|((partition_key, _), _)| *partition_key == self.partition_key)
            .map(|(_, order)| order.clone())
            .collect();
        Ok(stream::iter(snapshot.into_iter().map(Ok)).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use crate::store::list_orders;

    fn burger() -> Order {
        Order::new("orders", Some("Burger".to_string()), Some("No onions".to_string()), 2)
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = InMemoryOrderStore::new();
        let err = store.get_by_id("nope", "orders").await.unwrap_err();
        assert_eq!(err, StoreError::NotFound { id: "nope".to_string() });
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = InMemoryOrderStore::new();
        let order = burger();
        store.create(&order).await.unwrap();

        let stored = store.get_by_id(&order.id, "orders").await.unwrap();
        assert_eq!(stored.title.as_deref(), Some("Burger"));
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_partition_scopes_lookup() {
        let store = InMemoryOrderStore::new();
        let order = burger();
        store.create(&order).await.unwrap();

        assert!(matches!(
            store.get_by_id(&order.id, "other").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let store = InMemoryOrderStore::new();
        let order = burger();
        store.create(&order).await.unwrap();

        let err = store.create(&order).await.unwrap_err();
        assert_eq!(err, StoreError::Conflict { id: order.id.clone() });
    }

    #[tokio::test]
    async fn test_replace_bumps_version() {
        let store = InMemoryOrderStore::new();
        let order = burger();
        store.create(&order).await.unwrap();

        let mut stored = store.get_by_id(&order.id, "orders").await.unwrap();
        stored.status = OrderStatus::Completed;
        store.replace(&stored, &order.id, "orders").await.unwrap();

        let reloaded = store.get_by_id(&order.id, "orders").await.unwrap();
        assert_eq!(reloaded.status, OrderStatus::Completed);
        assert_eq!(reloaded.version, 2);
    }

    #[tokio::test]
    async fn test_stale_replace_conflicts() {
        let store = InMemoryOrderStore::new();
        let order = burger();
        store.create(&order).await.unwrap();

        let first = store.get_by_id(&order.id, "orders").await.unwrap();
        let second = first.clone();

        store.replace(&first, &order.id, "orders").await.unwrap();
        let err = store.replace(&second, &order.id, "orders").await.unwrap_err();
        assert_eq!(err, StoreError::Conflict { id: order.id.clone() });
    }

    #[tokio::test]
    async fn test_replace_missing_is_not_found() {
        let store = InMemoryOrderStore::new();
        let order = burger();
        assert!(matches!(
            store.replace(&order, &order.id, "orders").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_scan_returns_everything() {
        let store = InMemoryOrderStore::new();
        for _ in 0..3 {
            store.create(&burger()).await.unwrap();
        }

        let orders = list_orders(&store).await.unwrap();
        assert_eq!(orders.len(), 3);
    }

    #[tokio::test]
    async fn test_scan_stays_in_own_partition() {
        let store = InMemoryOrderStore::with_partition_key("lunch");
        store.create(&Order::new("lunch", Some("Soup".to_string()), None, 1)).await.unwrap();
        store.create(&Order::new("dinner", Some("Steak".to_string()), None, 1)).await.unwrap();

        let orders = list_orders(&store).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].title.as_deref(), Some("Soup"));
    }
}
