use uuid::Uuid;

use super::value_objects::OrderStatus;

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================
//
// Both entry points (HTTP and push channel) translate their payloads into one
// of these before anything reaches the OrderService.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum OrderCommand {
    Create {
        content: String,
    },
    UpdateStatus {
        id: Uuid,
        status: OrderStatus,
    },
}

impl OrderCommand {
    pub fn name(&self) -> &'static str {
        match self {
            OrderCommand::Create { .. } => "create",
            OrderCommand::UpdateStatus { .. } => "update_status",
        }
    }
}
