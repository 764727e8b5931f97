use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::domain::order::OrderError;

// ============================================================================
// API Errors - HTTP mapping of domain failures
// ============================================================================
//
// Storage failures never leak details to the caller; the cause is logged by
// the OrderService before it reaches this layer.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Order not found")]
    NotFound,

    #[error("Internal server error")]
    Internal,
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EmptyContent
            | OrderError::ContentTooLong { .. }
            | OrderError::InvalidStatus(_) => ApiError::BadRequest(err.to_string()),
            OrderError::NotFound(_) => ApiError::NotFound,
            OrderError::Storage(_) => ApiError::Internal,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use uuid::Uuid;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::from(OrderError::InvalidStatus("lost".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::from(OrderError::EmptyContent).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(OrderError::NotFound(Uuid::new_v4())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(OrderError::Storage(StoreError::unavailable("down"))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_failure_message_is_generic() {
        let corrupt = StoreError::Corrupt("order 42 is bad".into());
        let err = ApiError::from(OrderError::Storage(corrupt));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
