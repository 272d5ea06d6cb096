use crate::archive::ArchiveError;
use crate::store::StoreError;

// ============================================================================
// Order Mutation Errors
// ============================================================================
//
// Messages are sent to the calling client as-is, so storage faults keep the
// backend's own text.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Order {0} was not found")]
    NotFound(String),

    #[error("Order {0} already exists")]
    AlreadyExists(String),

    #[error("The file {0} exists already.")]
    ReceiptConflict(String),

    #[error("Order {0} was modified concurrently")]
    ConcurrentModification(String),

    #[error("Invalid order request: {0}")]
    Validation(String),

    #[error("{0}")]
    Storage(String),

    #[error("{0}")]
    Archive(String),
}

impl OrderError {
    /// Short label used for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            OrderError::NotFound(_) => "not_found",
            OrderError::AlreadyExists(_) => "already_exists",
            OrderError::ReceiptConflict(_) => "receipt_conflict",
            OrderError::ConcurrentModification(_) => "concurrent_modification",
            OrderError::Validation(_) => "validation",
            OrderError::Storage(_) => "storage",
            OrderError::Archive(_) => "archive",
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => OrderError::NotFound(id),
            StoreError::Conflict { id } => OrderError::ConcurrentModification(id),
            StoreError::Backend(msg) => OrderError::Storage(msg),
        }
    }
}

impl From<ArchiveError> for OrderError {
    fn from(err: ArchiveError) -> Self {
        OrderError::Archive(err.to_string())
    }
}
