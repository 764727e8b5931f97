use actix::prelude::*;
use std::sync::Arc;

use super::registry::{Connection, ConnectionId, ConnectionRegistry, DeliveryFailure};
use crate::domain::order::OrderEvent;
use crate::metrics::Metrics;

// ============================================================================
// Broadcast Hub Actor - Fans order events out to push connections
// ============================================================================
//
// Responsibilities:
// - Owns the ConnectionRegistry (join / leave / enumerate)
// - Serializes each published event once and enqueues it on every live
//   connection without waiting on any of them
// - Evicts a connection whose queue overflowed: it has missed a frame, so it
//   is dropped from the registry, its queue closes once drained, and the
//   gateway ends the socket so the client reconnects to a fresh snapshot
//
// The mailbox is FIFO, so events sent from one caller reach every connection
// in the order they were published.
//
// ============================================================================

pub struct BroadcastHub {
    registry: ConnectionRegistry,
    metrics: Arc<Metrics>,
}

impl BroadcastHub {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            metrics,
        }
    }

    fn publish(&mut self, event: &OrderEvent) {
        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    event_type = event.event_type(),
                    "Failed to serialize event"
                );
                return;
            }
        };

        let (mut sent, mut closed) = (0u64, 0u64);
        let mut overflowed = Vec::new();

        for connection in self.registry.active_connections() {
            match connection.try_deliver(frame.clone()) {
                Ok(()) => sent += 1,
                Err(DeliveryFailure::Full) => overflowed.push(connection.id),
                Err(DeliveryFailure::Closed) => {
                    closed += 1;
                    tracing::debug!(
                        connection_id = %connection.id,
                        "Connection closed, skipping frame"
                    );
                }
            }
        }

        let full = overflowed.len() as u64;
        for id in overflowed {
            self.registry.leave(&id);
            tracing::warn!(
                connection_id = %id,
                event_type = event.event_type(),
                "Outbound queue full, evicting connection"
            );
        }
        if full > 0 {
            self.metrics.active_connections.set(self.registry.len() as i64);
        }

        self.metrics.record_fanout(event.event_type(), sent, full, closed);

        tracing::debug!(
            event_type = event.event_type(),
            sent = sent,
            dropped = full + closed,
            "Published event"
        );
    }
}

impl Actor for BroadcastHub {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("BroadcastHub started");
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "()")]
pub struct Join(pub Connection);

#[derive(Message)]
#[rtype(result = "()")]
pub struct Leave(pub ConnectionId);

#[derive(Message)]
#[rtype(result = "()")]
pub struct Publish(pub OrderEvent);

#[derive(Message)]
#[rtype(result = "Vec<ConnectionId>")]
pub struct GetActiveConnections;

// ============================================================================
// Handlers
// ============================================================================

impl Handler<Join> for BroadcastHub {
    type Result = ();

    fn handle(&mut self, msg: Join, _: &mut Self::Context) {
        let id = msg.0.id;
        self.registry.join(msg.0);
        self.metrics.active_connections.set(self.registry.len() as i64);

        tracing::info!(
            connection_id = %id,
            active = self.registry.len(),
            "Connection joined"
        );
    }
}

impl Handler<Leave> for BroadcastHub {
    type Result = ();

    fn handle(&mut self, msg: Leave, _: &mut Self::Context) {
        if self.registry.leave(&msg.0) {
            self.metrics.active_connections.set(self.registry.len() as i64);
            tracing::info!(
                connection_id = %msg.0,
                active = self.registry.len(),
                "Connection left"
            );
        }
    }
}

impl Handler<Publish> for BroadcastHub {
    type Result = ();

    fn handle(&mut self, msg: Publish, _: &mut Self::Context) {
        self.publish(&msg.0);
    }
}

impl Handler<GetActiveConnections> for BroadcastHub {
    type Result = MessageResult<GetActiveConnections>;

    fn handle(&mut self, _: GetActiveConnections, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.registry.active_connections().map(|c| c.id).collect())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
