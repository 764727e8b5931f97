use uuid::Uuid;

use crate::store::StoreError;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order content cannot be empty")]
    EmptyContent,

    #[error("Order content is {len} bytes, limit is {max}")]
    ContentTooLong { len: usize, max: usize },

    #[error("Unrecognized order status: {0}")]
    InvalidStatus(String),

    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl OrderError {
    /// Label used for the failed-mutation metric.
    pub fn reason(&self) -> &'static str {
        match self {
            OrderError::EmptyContent
            | OrderError::ContentTooLong { .. }
            | OrderError::InvalidStatus(_) => "validation",
            OrderError::NotFound(_) => "not_found",
            OrderError::Storage(_) => "storage",
        }
    }
}
