use actix_web::{web, HttpResponse, Responder};
use prometheus::{Encoder, TextEncoder};

use crate::actors::GetActiveConnections;
use crate::gateway::AppState;

/// Mount `/metrics` and `/health` next to the gateway routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics_handler))
        .route("/health", web::get().to(health_handler));
}

async fn metrics_handler(state: web::Data<AppState>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler(state: web::Data<AppState>) -> impl Responder {
    match state.hub.send(GetActiveConnections).await {
        Ok(connections) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "service": "order-board",
            "connections": connections.len()
        })),
        Err(e) => {
            tracing::error!(error = %e, "BroadcastHub not responding");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": "order-board"
            }))
        }
    }
}
