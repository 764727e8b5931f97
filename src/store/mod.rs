use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus};

mod memory;
mod scylla_store;

pub use memory::InMemoryOrderStore;
pub use scylla_store::ScyllaOrderStore;

// ============================================================================
// Order Store - Durable persistence and ordered retrieval
// ============================================================================
//
// Contract shared by every backend:
// - `create` returns only once the record is durable
// - `list` is a snapshot sorted by (created_at, insertion order)
// - `update_status` returns Ok(None) for an unknown id and writes nothing
// - records are never deleted, so an id seen once stays valid
// - failures surface as StoreError; nothing here retries
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub(crate) fn unavailable(err: impl std::fmt::Display) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new `pending` order and return the stored record.
    async fn create(&self, content: String) -> Result<Order, StoreError>;

    /// All orders, optionally restricted to one status, in listing order.
    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError>;

    /// Set the status of an existing order.
    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError>;
}

/// Apply the listing order to a batch of records.
///
/// Ids are UUIDv7, monotonic within the process, so records sharing a
/// `created_at` (millisecond precision once stored) fall back to creation
/// order.
pub(crate) fn sort_for_listing(orders: &mut [Order]) {
    orders.sort_by_key(Order::sort_key);
}
