// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

/// An explicit mutation request. Create and complete are distinct intents and
/// are never inferred from whether an id happens to exist in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderMutation {
    Create {
        title: Option<String>,
        description: Option<String>,
        quantity: i32,
    },
    Complete {
        id: String,
    },
}

impl OrderMutation {
    /// Operation name as exposed on the realtime channel
    pub fn operation(&self) -> &'static str {
        match self {
            OrderMutation::Create { .. } => "CreateOrder",
            OrderMutation::Complete { .. } => "CompleteOrder",
        }
    }
}
