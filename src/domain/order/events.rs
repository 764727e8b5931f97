use serde::{Deserialize, Serialize};

use super::value_objects::Order;

// ============================================================================
// Order Events - Frames delivered over the push channel
// ============================================================================

/// Push-channel frame. Serializes as `{"type": "...", "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Full ordered snapshot, sent once to a newly joined connection.
    #[serde(rename = "initial")]
    Initial(Vec<Order>),

    #[serde(rename = "newOrder")]
    OrderCreated(Order),

    #[serde(rename = "updateOrder")]
    OrderUpdated(Order),
}

impl OrderEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Initial(_) => "initial",
            OrderEvent::OrderCreated(_) => "newOrder",
            OrderEvent::OrderUpdated(_) => "updateOrder",
        }
    }

    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
