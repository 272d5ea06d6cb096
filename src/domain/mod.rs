// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Storage and transport live outside this layer and are reached through the
// `OrderStore` and `ReceiptArchive` traits.
//
// ============================================================================

pub mod order;
