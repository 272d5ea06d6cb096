// ============================================================================
// Broadcast Gateway
// ============================================================================
//
// Structure:
// - signals - realtime wire protocol (client calls, server signals)
// - hub     - process-wide actor tracking connected sessions
// - handler - stateless operation handler shared by every session
// - session - per-connection WebSocket actor
//
// ============================================================================

mod handler;
mod hub;
mod session;
mod signals;

pub use handler::OrderGateway;
pub use hub::BroadcastHub;
pub use session::order_hub;
