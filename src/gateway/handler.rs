use actix::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::hub::{Broadcast, BroadcastHub, ConnectedClients, SendTo};
use super::signals::{ClientCall, ServerSignal};
use crate::domain::order::{orders_payload, OrderError, OrderMutation, OrderReconciler};
use crate::metrics::Metrics;
use crate::store::{list_orders, OrderStore, StoreError};

// ============================================================================
// Order Gateway - Realtime operation handler
// ============================================================================
//
// Stateless and shared by every connection. Each client operation:
//   1. runs its mutation (if any) through the reconciler
//   2. on success, scans all orders and broadcasts ReceiveOrders to everyone
//   3. on any failure, sends Error to the caller only
//
// No failure escapes an operation; the caller always gets either a broadcast
// or an Error signal.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to encode orders: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Broadcast hub unavailable: {0}")]
    Hub(#[from] MailboxError),
}

impl GatewayError {
    fn reason(&self) -> &'static str {
        match self {
            GatewayError::Order(e) => e.reason(),
            GatewayError::Store(_) => "storage",
            GatewayError::Encode(_) => "encode",
            GatewayError::Hub(_) => "hub",
        }
    }
}

pub struct OrderGateway {
    reconciler: OrderReconciler,
    store: Arc<dyn OrderStore>,
    hub: Addr<BroadcastHub>,
    metrics: Arc<Metrics>,
}

impl OrderGateway {
    pub fn new(
        reconciler: OrderReconciler,
        store: Arc<dyn OrderStore>,
        hub: Addr<BroadcastHub>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            reconciler,
            store,
            hub,
            metrics,
        }
    }

    pub fn hub(&self) -> &Addr<BroadcastHub> {
        &self.hub
    }

    pub async fn connected_clients(&self) -> Result<usize, MailboxError> {
        self.hub.send(ConnectedClients).await
    }

    /// Route a decoded client call to its operation
    pub async fn dispatch(&self, caller: Uuid, call: ClientCall) {
        match call {
            ClientCall::OnLoad => self.on_load(caller).await,
            ClientCall::CreateOrder { title, description, quantity } => {
                self.create_order(caller, title, description, quantity).await
            }
            ClientCall::CompleteOrder { order_id } => self.complete_order(caller, order_id).await,
        }
    }

    /// Push the current order list to every client
    pub async fn on_load(&self, caller: Uuid) {
        if let Err(e) = self.broadcast_orders().await {
            self.fail(caller, "OnLoad", e).await;
        }
    }

    pub async fn create_order(
        &self,
        caller: Uuid,
        title: Option<String>,
        description: Option<String>,
        quantity: i32,
    ) {
        self.run_mutation(caller, OrderMutation::Create { title, description, quantity })
            .await;
    }

    pub async fn complete_order(&self, caller: Uuid, order_id: String) {
        self.run_mutation(caller, OrderMutation::Complete { id: order_id }).await;
    }

    async fn run_mutation(&self, caller: Uuid, mutation: OrderMutation) {
        let operation = mutation.operation();
        let counter = match mutation {
            OrderMutation::Create { .. } => &self.metrics.orders_created,
            OrderMutation::Complete { .. } => &self.metrics.orders_completed,
        };

        let result = match self.reconciler.apply(mutation).await {
            Ok(order) => {
                counter.inc();
                tracing::debug!(client_id = %caller, order_id = %order.id, operation, "Mutation applied");
                self.broadcast_orders().await
            }
            Err(e) => Err(GatewayError::from(e)),
        };

        if let Err(e) = result {
            self.fail(caller, operation, e).await;
        }
    }

    /// Scan, project and push the full order list to all clients
    async fn broadcast_orders(&self) -> Result<usize, GatewayError> {
        let started = Instant::now();

        let orders = list_orders(self.store.as_ref()).await?;
        let payload = orders_payload(&orders)?;
        let delivered = self.hub.send(Broadcast(ServerSignal::ReceiveOrders(payload))).await?;

        self.metrics.record_broadcast(started.elapsed().as_secs_f64());
        tracing::debug!(orders = orders.len(), clients = delivered, "📣 Orders broadcast");

        Ok(delivered)
    }

    async fn fail(&self, caller: Uuid, operation: &str, error: GatewayError) {
        self.metrics.record_failure(operation, error.reason());
        tracing::warn!(client_id = %caller, operation, error = %error, "Client operation failed");

        let signal = ServerSignal::Error(error.to_string());
        if let Err(e) = self.hub.send(SendTo { id: caller, signal }).await {
            tracing::error!(client_id = %caller, error = %e, "Failed to deliver error to client");
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{InMemoryReceiptArchive, ReceiptArchive};
    use crate::domain::order::{Order, OrderStatus, OrderView};
    use crate::gateway::hub::recorder::{Received, Recorder};
    use crate::gateway::hub::Connect;
    use crate::store::{InMemoryOrderStore, OrderStream};
    use async_trait::async_trait;

    struct Harness {
        gateway: OrderGateway,
        store: Arc<InMemoryOrderStore>,
        caller: Uuid,
        caller_client: Addr<Recorder>,
        other_client: Addr<Recorder>,
    }

    async fn harness() -> Harness {
        let store = Arc::new(InMemoryOrderStore::new());
        let archive: Arc<dyn ReceiptArchive> = Arc::new(InMemoryReceiptArchive::new());
        let metrics = Arc::new(Metrics::new().unwrap());
        let hub = BroadcastHub::new(Some(metrics.clone())).start();

        let caller = Uuid::new_v4();
        let caller_client = Recorder::default().start();
        let other_client = Recorder::default().start();
        hub.send(Connect { id: caller, client: caller_client.clone().recipient() })
            .await
            .unwrap();
        hub.send(Connect { id: Uuid::new_v4(), client: other_client.clone().recipient() })
            .await
            .unwrap();

        let reconciler = OrderReconciler::new(store.clone(), Some(archive), "orders");
        let gateway = OrderGateway::new(reconciler, store.clone(), hub, metrics);

        Harness { gateway, store, caller, caller_client, other_client }
    }

    fn views(signal: &ServerSignal) -> Vec<OrderView> {
        match signal {
            ServerSignal::ReceiveOrders(json) => serde_json::from_str(json).unwrap(),
            other => panic!("expected ReceiveOrders, got {:?}", other),
        }
    }

    async fn stored_views(store: &InMemoryOrderStore) -> Vec<OrderView> {
        list_orders(store).await.unwrap().iter().map(Order::view).collect()
    }

    #[actix::test]
    async fn test_create_order_broadcasts_to_all_clients() {
        let h = harness().await;

        h.gateway
            .create_order(h.caller, Some("Burger".into()), Some("No onions".into()), 2)
            .await;

        for client in [&h.caller_client, &h.other_client] {
            let received = client.send(Received).await.unwrap();
            assert_eq!(received.len(), 1);

            let orders = views(&received[0]);
            assert_eq!(orders.len(), 1);
            assert_eq!(orders[0].title.as_deref(), Some("Burger"));
            assert_eq!(orders[0].description.as_deref(), Some("No onions"));
            assert_eq!(orders[0].quantity, 2);
            assert_eq!(orders[0].status, OrderStatus::Created);
        }
    }

    #[actix::test]
    async fn test_broadcast_matches_full_scan() {
        let h = harness().await;
        h.gateway.create_order(h.caller, Some("Soup".into()), None, 1).await;
        h.gateway.create_order(h.caller, Some("Fries".into()), None, 3).await;

        let received = h.other_client.send(Received).await.unwrap();
        let mut pushed = views(received.last().unwrap());
        let mut scanned = stored_views(&h.store).await;
        pushed.sort_by(|a, b| a.id.cmp(&b.id));
        scanned.sort_by(|a, b| a.id.cmp(&b.id));

        assert_eq!(pushed, scanned);
        assert_eq!(pushed.len(), 2);
    }

    #[actix::test]
    async fn test_complete_then_repeat_only_errors_the_caller() {
        let h = harness().await;
        h.gateway.create_order(h.caller, Some("Burger".into()), Some("No onions".into()), 2).await;
        let id = stored_views(&h.store).await[0].id.clone();

        h.gateway.complete_order(h.caller, id.clone()).await;
        let after_first = h.other_client.send(Received).await.unwrap();
        assert_eq!(after_first.len(), 2);
        assert_eq!(views(&after_first[1])[0].status, OrderStatus::Completed);

        h.gateway.complete_order(h.caller, id.clone()).await;

        let caller_signals = h.caller_client.send(Received).await.unwrap();
        assert_eq!(caller_signals.len(), 3);
        assert_eq!(
            caller_signals[2],
            ServerSignal::Error(format!("The file {} exists already.", id))
        );

        // No broadcast for the failed call.
        assert_eq!(h.other_client.send(Received).await.unwrap().len(), 2);
    }

    #[actix::test]
    async fn test_complete_unknown_order_errors_caller() {
        let h = harness().await;

        h.gateway.complete_order(h.caller, "unknown-id".to_string()).await;

        assert_eq!(
            h.caller_client.send(Received).await.unwrap(),
            vec![ServerSignal::Error("Order unknown-id was not found".to_string())]
        );
        assert!(h.other_client.send(Received).await.unwrap().is_empty());
        assert!(list_orders(h.store.as_ref()).await.unwrap().is_empty());
    }

    #[actix::test]
    async fn test_on_load_broadcasts_snapshot_to_everyone() {
        let h = harness().await;
        h.store.create(&Order::new("orders", Some("Pizza".into()), None, 1)).await.unwrap();

        h.gateway.on_load(h.caller).await;

        for client in [&h.caller_client, &h.other_client] {
            let received = client.send(Received).await.unwrap();
            assert_eq!(received.len(), 1);
            assert_eq!(views(&received[0])[0].title.as_deref(), Some("Pizza"));
        }
    }

    #[actix::test]
    async fn test_dispatch_routes_client_calls() {
        let h = harness().await;

        h.gateway
            .dispatch(h.caller, ClientCall::CreateOrder { title: None, description: None, quantity: 4 })
            .await;

        let stored = stored_views(&h.store).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].quantity, 4);
        assert_eq!(h.gateway.connected_clients().await.unwrap(), 2);
    }

    struct BrokenScanStore;

    #[async_trait]
    impl OrderStore for BrokenScanStore {
        async fn get_by_id(&self, id: &str, _: &str) -> Result<Order, StoreError> {
            Err(StoreError::NotFound { id: id.to_string() })
        }
        async fn create(&self, _: &Order) -> Result<(), StoreError> {
            Ok(())
        }
        async fn replace(&self, _: &Order, _: &str, _: &str) -> Result<(), StoreError> {
            Ok(())
        }
        async fn scan_all(&self) -> Result<OrderStream<'_>, StoreError> {
            Err(StoreError::Backend("query timed out".to_string()))
        }
    }

    #[actix::test]
    async fn test_failed_scan_errors_caller_on_load() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let hub = BroadcastHub::new(None).start();
        let caller = Uuid::new_v4();
        let client = Recorder::default().start();
        hub.send(Connect { id: caller, client: client.clone().recipient() }).await.unwrap();

        let store: Arc<dyn OrderStore> = Arc::new(BrokenScanStore);
        let reconciler = OrderReconciler::new(store.clone(), None, "orders");
        let gateway = OrderGateway::new(reconciler, store, hub, metrics.clone());

        gateway.on_load(caller).await;

        assert_eq!(
            client.send(Received).await.unwrap(),
            vec![ServerSignal::Error("query timed out".to_string())]
        );
        assert_eq!(
            metrics.mutation_failures.with_label_values(&["OnLoad", "storage"]).get(),
            1
        );
    }
}
