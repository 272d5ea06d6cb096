use actix::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::signals::ServerSignal;
use crate::metrics::Metrics;

// ============================================================================
// Broadcast Hub Actor - Tracks connected realtime clients
// ============================================================================
//
// One hub per process. Sessions register on connect and deregister when they
// stop. Pushes are fire-and-forget: no acknowledgment, no retry. Delivery
// bypasses the session mailbox capacity so a burst of mutations never drops
// the newest order list. A client whose mailbox is closed is dropped from the
// hub.
//
// ============================================================================

pub struct BroadcastHub {
    sessions: HashMap<Uuid, Recipient<ServerSignal>>,
    metrics: Option<Arc<Metrics>>,
}

impl BroadcastHub {
    pub fn new(metrics: Option<Arc<Metrics>>) -> Self {
        Self {
            sessions: HashMap::new(),
            metrics,
        }
    }

    fn publish_client_count(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.set_connected_clients(self.sessions.len());
        }
    }

    /// Push one signal to one session. Returns false if it could not be queued.
    fn push(&mut self, id: Uuid, signal: ServerSignal) -> bool {
        let Some(recipient) = self.sessions.get(&id) else {
            tracing::debug!(client_id = %id, "Dropping signal for unknown client");
            return false;
        };

        if !recipient.connected() {
            tracing::debug!(client_id = %id, "Client mailbox closed, removing session");
            self.sessions.remove(&id);
            self.publish_client_count();
            return false;
        }

        recipient.do_send(signal);
        true
    }
}

impl Actor for BroadcastHub {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("BroadcastHub started");
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub id: Uuid,
    pub client: Recipient<ServerSignal>,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub id: Uuid,
}

/// Push to every connected client; replies with the number of clients reached
#[derive(Message)]
#[rtype(result = "usize")]
pub struct Broadcast(pub ServerSignal);

/// Push to one client only; replies whether it was queued
#[derive(Message)]
#[rtype(result = "bool")]
pub struct SendTo {
    pub id: Uuid,
    pub signal: ServerSignal,
}

#[derive(Message)]
#[rtype(result = "usize")]
pub struct ConnectedClients;

// ============================================================================
// Handlers
// ============================================================================

impl Handler<Connect> for BroadcastHub {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Self::Context) {
        self.sessions.insert(msg.id, msg.client);
        self.publish_client_count();

        tracing::info!(client_id = %msg.id, clients = self.sessions.len(), "Client connected");
    }
}

impl Handler<Disconnect> for BroadcastHub {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Self::Context) {
        if self.sessions.remove(&msg.id).is_some() {
            self.publish_client_count();
            tracing::info!(client_id = %msg.id, clients = self.sessions.len(), "Client disconnected");
        }
    }
}

impl Handler<Broadcast> for BroadcastHub {
    type Result = MessageResult<Broadcast>;

    fn handle(&mut self, msg: Broadcast, _: &mut Self::Context) -> Self::Result {
        let ids: Vec<Uuid> = self.sessions.keys().copied().collect();
        let delivered = ids
            .into_iter()
            .filter(|id| self.push(*id, msg.0.clone()))
            .count();

        tracing::debug!(
            signal = msg.0.target(),
            delivered = delivered,
            "Broadcast pushed"
        );

        MessageResult(delivered)
    }
}

impl Handler<SendTo> for BroadcastHub {
    type Result = MessageResult<SendTo>;

    fn handle(&mut self, msg: SendTo, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.push(msg.id, msg.signal))
    }
}

impl Handler<ConnectedClients> for BroadcastHub {
    type Result = MessageResult<ConnectedClients>;

    fn handle(&mut self, _: ConnectedClients, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.sessions.len())
    }
}

// ============================================================================
// Test Support
// ============================================================================


#[cfg(test)]
mod tests {
    use super::recorder::{Received, Recorder};
    use super::*;

    async fn connect(hub: &Addr<BroadcastHub>) -> (Uuid, Addr<Recorder>) {
        let id = Uuid::new_v4();
        let client = Recorder::default().start();
        hub.send(Connect { id, client: client.clone().recipient() }).await.unwrap();
        (id, client)
    }

    #[actix::test]
    async fn test_broadcast_reaches_every_client() {
        let hub = BroadcastHub::new(None).start();
        let (_, a) = connect(&hub).await;
        let (_, b) = connect(&hub).await;

        let delivered = hub
            .send(Broadcast(ServerSignal::ReceiveOrders("[]".to_string())))
            .await
            .unwrap();

        assert_eq!(delivered, 2);
        for client in [a, b] {
            assert_eq!(
                client.send(Received).await.unwrap(),
                vec![ServerSignal::ReceiveOrders("[]".to_string())]
            );
        }
    }

    #[actix::test]
    async fn test_send_to_targets_one_client() {
        let hub = BroadcastHub::new(None).start();
        let (caller, a) = connect(&hub).await;
        let (_, b) = connect(&hub).await;

        let queued = hub
            .send(SendTo { id: caller, signal: ServerSignal::Error("nope".to_string()) })
            .await
            .unwrap();

        assert!(queued);
        assert_eq!(a.send(Received).await.unwrap(), vec![ServerSignal::Error("nope".to_string())]);
        assert!(b.send(Received).await.unwrap().is_empty());
    }

    #[actix::test]
    async fn test_disconnect_removes_client() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let hub = BroadcastHub::new(Some(metrics.clone())).start();
        let (id, client) = connect(&hub).await;
        assert_eq!(hub.send(ConnectedClients).await.unwrap(), 1);
        assert_eq!(metrics.connected_clients.get(), 1);

        hub.send(Disconnect { id }).await.unwrap();
        let delivered = hub
            .send(Broadcast(ServerSignal::ReceiveOrders("[]".to_string())))
            .await
            .unwrap();

        assert_eq!(delivered, 0);
        assert_eq!(hub.send(ConnectedClients).await.unwrap(), 0);
        assert_eq!(metrics.connected_clients.get(), 0);
        assert!(client.send(Received).await.unwrap().is_empty());
    }

    #[actix::test]
    async fn test_burst_delivers_every_snapshot_in_order() {
        let hub = BroadcastHub::new(None).start();
        let (id, client) = connect(&hub).await;

        for i in 0..40 {
            let delivered = hub
                .send(Broadcast(ServerSignal::ReceiveOrders(format!("[{}]", i))))
                .await
                .unwrap();
            assert_eq!(delivered, 1);
        }
        let queued = hub
            .send(SendTo { id, signal: ServerSignal::Error("late".to_string()) })
            .await
            .unwrap();
        assert!(queued);

        let received = client.send(Received).await.unwrap();
        assert_eq!(received.len(), 41);
        assert_eq!(received[39], ServerSignal::ReceiveOrders("[39]".to_string()));
        assert_eq!(received[40], ServerSignal::Error("late".to_string()));
        assert_eq!(hub.send(ConnectedClients).await.unwrap(), 1);
    }

    #[actix::test]
    async fn test_send_to_unknown_client() {
        let hub = BroadcastHub::new(None).start();
        let queued = hub
            .send(SendTo { id: Uuid::new_v4(), signal: ServerSignal::Error("x".to_string()) })
            .await
            .unwrap();
        assert!(!queued);
    }
}
