use actix::prelude::*;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::handler::OrderGateway;
use super::hub::{Connect, Disconnect};
use super::signals::{ClientCall, ServerSignal};
use crate::config::AppConfig;

// ============================================================================
// Client Session Actor - One per WebSocket connection
// ============================================================================
//
// Holds only connection state (id, heartbeat). Storage handles live in the
// shared OrderGateway. Invocations run detached from the session, so a client
// that disconnects mid-call does not abort the store write.
//
// ============================================================================

pub struct ClientSession {
    id: Uuid,
    last_heartbeat: Instant,
    heartbeat_interval: Duration,
    client_timeout: Duration,
    gateway: web::Data<OrderGateway>,
}

impl ClientSession {
    pub fn new(gateway: web::Data<OrderGateway>, heartbeat_interval: Duration, client_timeout: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            last_heartbeat: Instant::now(),
            heartbeat_interval,
            client_timeout,
            gateway,
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(self.heartbeat_interval, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > act.client_timeout {
                tracing::info!(client_id = %act.id, "Client heartbeat timed out, closing session");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn invoke(&self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        match ClientCall::parse(text) {
            Ok(call) => {
                tracing::debug!(client_id = %self.id, operation = call.operation(), "Client invocation");

                let gateway = self.gateway.clone();
                let caller = self.id;
                actix::spawn(async move {
                    gateway.dispatch(caller, call).await;
                });
            }
            Err(e) => {
                tracing::warn!(client_id = %self.id, error = %e, "Rejected client invocation");
                self.push(ServerSignal::Error(e.to_string()), ctx);
            }
        }
    }

    fn push(&self, signal: ServerSignal, ctx: &mut ws::WebsocketContext<Self>) {
        match signal.to_frame() {
            Ok(frame) => ctx.text(frame),
            Err(e) => {
                tracing::error!(client_id = %self.id, error = %e, "Failed to encode signal");
            }
        }
    }
}

impl Actor for ClientSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.start_heartbeat(ctx);

        self.gateway.hub().do_send(Connect {
            id: self.id,
            client: ctx.address().recipient(),
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.gateway.hub().do_send(Disconnect { id: self.id });
        Running::Stop
    }
}

impl Handler<ServerSignal> for ClientSession {
    type Result = ();

    fn handle(&mut self, msg: ServerSignal, ctx: &mut Self::Context) {
        self.push(msg, ctx);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ClientSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(client_id = %self.id, error = %e, "WebSocket protocol error");
                ctx.stop();
                return;
            }
        };

        match msg {
            ws::Message::Ping(bytes) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&bytes);
            }
            ws::Message::Pong(_) => {
                self.last_heartbeat = Instant::now();
            }
            ws::Message::Text(text) => {
                self.last_heartbeat = Instant::now();
                self.invoke(&text, ctx);
            }
            ws::Message::Binary(_) => {
                self.push(ServerSignal::Error("Binary frames are not supported".to_string()), ctx);
            }
            ws::Message::Close(reason) => {
                ctx.close(reason);
                ctx.stop();
            }
            ws::Message::Continuation(_) => {
                ctx.stop();
            }
            ws::Message::Nop => {}
        }
    }
}

/// `GET /orderHub` - upgrade to a realtime session
pub async fn order_hub(
    req: HttpRequest,
    stream: web::Payload,
    gateway: web::Data<OrderGateway>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, actix_web::Error> {
    let session = ClientSession::new(
        gateway,
        config.heartbeat_interval,
        config.client_timeout,
    );
    ws::start(session, &req, stream)
}

// ============================================================================
// Socket Tests - real server, two websocket clients
// ============================================================================
