use async_trait::async_trait;
use futures_util::StreamExt;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::response::query_result::QueryResult;
use scylla::value::{CqlValue, Row};
use std::sync::Arc;

use super::{OrderStore, OrderStream, StoreError};
use crate::domain::order::{Order, OrderStatus};

// ============================================================================
// ScyllaDB Order Store
// ============================================================================
//
// Table layout:
//   orders ((partition_key), id) -> title, description, quantity, status, version
//
// Conditional writes use lightweight transactions:
// - create:  INSERT ... IF NOT EXISTS
// - replace: UPDATE ... IF version = ?
//
// ============================================================================

/// Column tuple returned by order selects
type OrderRow = (String, Option<String>, Option<String>, i32, String, i64);

const SELECT_ONE: &str = "SELECT id, title, description, quantity, status, version \
                          FROM orders WHERE partition_key = ? AND id = ?";

const SELECT_PARTITION: &str = "SELECT id, title, description, quantity, status, version \
                                FROM orders WHERE partition_key = ?";

const INSERT_IF_NOT_EXISTS: &str = "INSERT INTO orders \
                                    (partition_key, id, title, description, quantity, status, version) \
                                    VALUES (?, ?, ?, ?, ?, ?, ?) IF NOT EXISTS";

const UPDATE_IF_VERSION: &str = "UPDATE orders \
                                 SET title = ?, description = ?, quantity = ?, status = ?, version = ? \
                                 WHERE partition_key = ? AND id = ? IF version = ?";

pub struct ScyllaOrderStore {
    session: Arc<Session>,
    partition_key: String,
}

impl ScyllaOrderStore {
    pub fn new(session: Arc<Session>, partition_key: impl Into<String>) -> Self {
        Self {
            session,
            partition_key: partition_key.into(),
        }
    }

    /// Connect, make sure the keyspace and table exist, and bind to the keyspace
    pub async fn connect(
        nodes: &[String],
        keyspace: &str,
        partition_key: &str,
    ) -> anyhow::Result<Self> {
        tracing::info!(nodes = ?nodes, keyspace = %keyspace, "Connecting to ScyllaDB...");

        let session: Session = SessionBuilder::new()
            .known_nodes(nodes)
            .build()
            .await?;

        session
            .query_unpaged(
                format!(
                    "CREATE KEYSPACE IF NOT EXISTS {} WITH REPLICATION = \
                     {{'class': 'SimpleStrategy', 'replication_factor': 1}}",
                    keyspace
                ),
                &[],
            )
            .await?;

        session.use_keyspace(keyspace, false).await?;

        session
            .query_unpaged(
                "CREATE TABLE IF NOT EXISTS orders (
                    partition_key text,
                    id text,
                    title text,
                    description text,
                    quantity int,
                    status text,
                    version bigint,
                    PRIMARY KEY ((partition_key), id)
                )",
                &[],
            )
            .await?;

        tracing::info!(keyspace = %keyspace, "✅ ScyllaDB order schema ready");

        Ok(Self::new(Arc::new(session), partition_key))
    }
}

/// Map a selected row back into an order of the given partition
fn row_to_order(row: OrderRow, partition_key: &str) -> Result<Order, StoreError> {
    let (id, title, description, quantity, status, version) = row;
    let status: OrderStatus = status
        .parse()
        .map_err(|e| StoreError::Backend(format!("Malformed order {}: {}", id, e)))?;

    Ok(Order {
        id,
        title,
        description,
        quantity,
        status,
        partition_key: partition_key.to_string(),
        version,
    })
}

/// Read the `[applied]` column of a lightweight transaction result
fn lwt_applied(result: QueryResult) -> Result<bool, StoreError> {
    let rows = result.into_rows_result().map_err(StoreError::backend)?;
    let row: Row = rows.first_row().map_err(StoreError::backend)?;
    Ok(applied_flag(&row))
}

fn applied_flag(row: &Row) -> bool {
    matches!(row.columns.first(), Some(Some(CqlValue::Boolean(true))))
}

#[async_trait]
impl OrderStore for ScyllaOrderStore {
    async fn get_by_id(&self, id: &str, partition_key: &str) -> Result<Order, StoreError> {
        let result = self
            .session
            .query_unpaged(SELECT_ONE, (partition_key, id))
            .await
            .map_err(StoreError::backend)?;

        let rows = result.into_rows_result().map_err(StoreError::backend)?;

        match rows.maybe_first_row::<OrderRow>().map_err(StoreError::backend)? {
            Some(row) => row_to_order(row, partition_key),
            None => Err(StoreError::NotFound { id: id.to_string() }),
        }
    }

    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        let result = self
            .session
            .query_unpaged(
                INSERT_IF_NOT_EXISTS,
                (
                    &order.partition_key,
                    &order.id,
                    &order.title,
                    &order.description,
                    order.quantity,
                    order.status.as_str(),
                    1_i64,
                ),
            )
            .await
            .map_err(StoreError::backend)?;

        if !lwt_applied(result)? {
            return Err(StoreError::Conflict { id: order.id.clone() });
        }

        tracing::debug!(order_id = %order.id, "Inserted order into ScyllaDB");
        Ok(())
    }

    async fn replace(&self, order: &Order, id: &str, partition_key: &str) -> Result<(), StoreError> {
        let result = self
            .session
            .query_unpaged(
                UPDATE_IF_VERSION,
                (
                    &order.title,
                    &order.description,
                    order.quantity,
                    order.status.as_str(),
                    order.version + 1,
                    partition_key,
                    id,
                    order.version,
                ),
            )
            .await
            .map_err(StoreError::backend)?;

        if lwt_applied(result)? {
            return Ok(());
        }

        // A failed `IF version = ?` on a missing row reports no version at all.
        match self.get_by_id(id, partition_key).await {
            Ok(_) => Err(StoreError::Conflict { id: id.to_string() }),
            Err(e) => Err(e),
        }
    }

    async fn scan_all(&self) -> Result<OrderStream<'_>, StoreError> {
        let pager = self
            .session
            .query_iter(SELECT_PARTITION, (self.partition_key.as_str(),))
            .await
            .map_err(StoreError::backend)?;

        let partition_key = self.partition_key.clone();
        let rows = pager
            .rows_stream::<OrderRow>()
            .map_err(StoreError::backend)?
            .map(move |row| {
                row.map_err(StoreError::backend)
                    .and_then(|row| row_to_order(row, &partition_key))
            });

        Ok(rows.boxed())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
//
// Queries against a live cluster are not covered here; these tests pin the
// row mapping and LWT result handling.
//
// ============================================================================
