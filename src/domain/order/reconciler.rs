use std::sync::Arc;

use crate::archive::{ArchiveError, ReceiptArchive};
use crate::store::{OrderStore, StoreError};

use super::commands::OrderMutation;
use super::entity::Order;
use super::errors::OrderError;
use super::receipt::{receipt_key, render_receipt};
use super::value_objects::OrderStatus;

// ============================================================================
// Order Reconciler
// ============================================================================
//
// Orchestrates: Mutation → Order Store → (Receipt Archive on completion)
//
// Two entry points share the same create and complete paths:
// - `apply`     - explicit create/complete request
// - `reconcile` - id-keyed upsert: an existing record is completed, a missing
//                 one is inserted as given
//
// Failures are never retried here. A receipt conflict is reported after the
// record has already been replaced; nothing is rolled back.
//
// ============================================================================

pub struct OrderReconciler {
    store: Arc<dyn OrderStore>,
    archive: Option<Arc<dyn ReceiptArchive>>,
    partition_key: String,
}

impl OrderReconciler {
    pub fn new(
        store: Arc<dyn OrderStore>,
        archive: Option<Arc<dyn ReceiptArchive>>,
        partition_key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            archive,
            partition_key: partition_key.into(),
        }
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    /// Apply an explicit mutation and return the resulting record
    pub async fn apply(&self, mutation: OrderMutation) -> Result<Order, OrderError> {
        match mutation {
            OrderMutation::Create { title, description, quantity } => {
                let order = Order::new(self.partition_key.as_str(), title, description, quantity);
                self.insert_new(order).await
            }
            OrderMutation::Complete { id } => {
                if id.trim().is_empty() {
                    return Err(OrderError::Validation("order id must not be empty".to_string()));
                }

                let stored = self.store.get_by_id(&id, &self.partition_key).await?;
                self.complete_existing(stored).await
            }
        }
    }

    /// Upsert keyed on the candidate's id.
    ///
    /// An existing record is always completed, whatever the candidate holds.
    /// A missing record is inserted from the candidate's fields with status
    /// `CREATED`, so an unknown id produces a new blank order.
    #[allow(dead_code)]
    pub async fn reconcile(&self, candidate: Order) -> Result<Order, OrderError> {
        match self.store.get_by_id(&candidate.id, &candidate.partition_key).await {
            Ok(stored) => self.complete_existing(stored).await,
            Err(StoreError::NotFound { .. }) => self.insert_new(candidate).await,
            Err(e) => Err(OrderError::Storage(e.to_string())),
        }
    }

    async fn insert_new(&self, mut order: Order) -> Result<Order, OrderError> {
        order.status = OrderStatus::Created;

        self.store.create(&order).await.map_err(|e| match e {
            StoreError::Conflict { id } => OrderError::AlreadyExists(id),
            other => OrderError::from(other),
        })?;
        order.version = 1;

        tracing::info!(
            order_id = %order.id,
            quantity = order.quantity,
            "✅ Order created"
        );

        Ok(order)
    }

    async fn complete_existing(&self, mut stored: Order) -> Result<Order, OrderError> {
        stored.status = OrderStatus::Completed;

        let id = stored.id.clone();
        let partition_key = stored.partition_key.clone();
        self.store.replace(&stored, &id, &partition_key).await?;
        stored.version += 1;

        tracing::info!(
            order_id = %stored.id,
            version = stored.version,
            "✅ Order completed"
        );

        self.archive_receipt(&stored).await?;
        Ok(stored)
    }

    async fn archive_receipt(&self, order: &Order) -> Result<(), OrderError> {
        let Some(archive) = &self.archive else {
            tracing::debug!(order_id = %order.id, "No receipt archive configured, skipping receipt");
            return Ok(());
        };

        let key = receipt_key(&order.id);

        if archive.exists(&key).await? {
            tracing::warn!(order_id = %order.id, key = %key, "Receipt already archived");
            return Err(OrderError::ReceiptConflict(order.id.clone()));
        }

        // The write itself is conditional, so a racing completion still loses here.
        archive
            .write(&key, render_receipt(order).as_bytes())
            .await
            .map_err(|e| match e {
                ArchiveError::AlreadyExists { .. } => OrderError::ReceiptConflict(order.id.clone()),
                other => OrderError::from(other),
            })?;

        tracing::info!(order_id = %order.id, key = %key, "🧾 Receipt archived");
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
