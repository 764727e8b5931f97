use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::error::ApiError;
use super::AppState;
use crate::domain::order::{OrderCommand, OrderStatus};

// ============================================================================
// Request/Response Routes
// ============================================================================
//
//   GET  /                 all orders
//   POST /                 create {content}
//   GET  /operations       pending orders
//   PUT  /operations/{id}  update {status}
//
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::BadRequest(err.to_string()).into()
    }))
    .service(
        web::resource("/")
            .route(web::get().to(list_orders))
            .route(web::post().to(create_order)),
    )
    .route("/operations", web::get().to(list_pending))
    .route("/operations/{id}", web::put().to(update_status));
}

async fn list_orders(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let orders = state.service.list(None).await?;
    Ok(HttpResponse::Ok().json(orders))
}

async fn list_pending(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let orders = state.service.list(Some(OrderStatus::Pending)).await?;
    Ok(HttpResponse::Ok().json(orders))
}

async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ApiError> {
    let command = OrderCommand::Create {
        content: body.into_inner().content,
    };
    let order = state.service.handle(command).await?;
    Ok(HttpResponse::Created().json(order))
}

async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<StatusUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    // No order can carry an id that is not a UUID.
    let id = Uuid::parse_str(&path).map_err(|_| ApiError::NotFound)?;

    let order = state.service.update_status(id, &body.status).await?;
    Ok(HttpResponse::Ok().json(order))
}

// ============================================================================
// Unit Tests
// ============================================================================
