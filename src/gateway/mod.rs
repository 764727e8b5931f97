// ============================================================================
// Gateway - HTTP and push-channel adapters
// ============================================================================
//
// Translates inbound requests and push messages into OrderService calls.
// Nothing in here touches the store or the hub's fan-out directly; the hub is
// only used to join and leave push connections.
//
// ============================================================================

mod error;
mod http;
mod ws;

use actix::Addr;
use actix_web::web;
use std::sync::Arc;

use crate::actors::BroadcastHub;
use crate::domain::order::OrderService;
use crate::metrics::Metrics;

/// Shared application state.
pub struct AppState {
    pub service: Arc<OrderService>,
    pub hub: Addr<BroadcastHub>,
    pub metrics: Arc<Metrics>,
    pub connection_buffer: usize,
}

impl AppState {
    pub fn new(
        service: Arc<OrderService>,
        hub: Addr<BroadcastHub>,
        metrics: Arc<Metrics>,
        connection_buffer: usize,
    ) -> Self {
        Self {
            service,
            hub,
            metrics,
            connection_buffer,
        }
    }
}

/// Mount every gateway route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(ws::push_channel));
    http::configure(cfg);
}
