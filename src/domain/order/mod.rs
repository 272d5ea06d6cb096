// ============================================================================
// Order Domain
// ============================================================================
//
// - Value objects (OrderStatus)
// - Entity and client projection (Order, OrderView)
// - Commands (OrderMutation)
// - Errors (OrderError)
// - Receipt rendering
// - Reconciler (OrderReconciler)
//
// ============================================================================

pub mod value_objects;
pub mod entity;
pub mod commands;
pub mod errors;
pub mod receipt;
pub mod reconciler;

pub use value_objects::*;
pub use entity::*;
pub use commands::*;
pub use errors::*;
pub use reconciler::*;
