use actix::Addr;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::actors::{BroadcastHub, Publish};
use crate::metrics::Metrics;
use crate::store::OrderStore;

use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::OrderEvent;
use super::value_objects::{Order, OrderStatus};

// ============================================================================
// Order Service
// ============================================================================
//
// Orchestrates: Command → Validation → OrderStore commit → BroadcastHub
//
// The only mutation path. Broadcast is queued strictly after the store
// commit returns and is fire-and-forget, so a delivery problem can never fail
// or roll back a committed mutation.
//
// Commits are serialized by `commit_lock`, held from the store call until the
// Publish is in the hub's mailbox: events leave in the same order the store
// applied them, whichever worker or entry point issued the mutation.
//
// ============================================================================

pub const DEFAULT_MAX_CONTENT_LEN: usize = 4096;

pub struct OrderService {
    store: Arc<dyn OrderStore>,
    hub: Addr<BroadcastHub>,
    metrics: Arc<Metrics>,
    max_content_len: usize,
    commit_lock: Mutex<()>,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        hub: Addr<BroadcastHub>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            hub,
            metrics,
            max_content_len: DEFAULT_MAX_CONTENT_LEN,
            commit_lock: Mutex::new(()),
        }
    }

    pub fn with_max_content_len(mut self, max_content_len: usize) -> Self {
        self.max_content_len = max_content_len;
        self
    }

    /// Handle a validated command from either entry point.
    pub async fn handle(&self, command: OrderCommand) -> Result<Order, OrderError> {
        let operation = command.name();

        let result = match command {
            OrderCommand::Create { content } => self.commit_create(content).await,
            OrderCommand::UpdateStatus { id, status } => self.commit_status(id, status).await,
        };

        if let Err(ref e) = result {
            self.record_failure(operation, e);
        }

        result
    }

    pub async fn create(&self, content: String) -> Result<Order, OrderError> {
        self.handle(OrderCommand::Create { content }).await
    }

    /// Parse `status` against the recognized set, then commit. Nothing is
    /// read or written for an unrecognized status.
    pub async fn update_status(&self, id: Uuid, status: &str) -> Result<Order, OrderError> {
        let status = match status.parse::<OrderStatus>() {
            Ok(status) => status,
            Err(e) => {
                self.record_failure("update_status", &e);
                return Err(e);
            }
        };

        self.handle(OrderCommand::UpdateStatus { id, status }).await
    }

    /// Ordered snapshot of the board, optionally filtered by status.
    pub async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, OrderError> {
        self.store.list(status).await.map_err(|e| {
            tracing::error!(error = %e, filter = ?status, "Failed to list orders");
            OrderError::from(e)
        })
    }

    async fn commit_create(&self, content: String) -> Result<Order, OrderError> {
        self.validate_content(&content)?;

        let _commit = self.commit_lock.lock().await;
        let order = self.store.create(content).await?;
        self.hub.do_send(Publish(OrderEvent::OrderCreated(order.clone())));

        self.metrics.orders_created.inc();
        tracing::info!(order_id = %order.id, "✅ Order created");
        Ok(order)
    }

    async fn commit_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, OrderError> {
        let _commit = self.commit_lock.lock().await;
        let order = self
            .store
            .update_status(id, status)
            .await?
            .ok_or(OrderError::NotFound(id))?;
        self.hub.do_send(Publish(OrderEvent::OrderUpdated(order.clone())));

        self.metrics.status_updates.with_label_values(&[status.as_str()]).inc();
        tracing::info!(order_id = %order.id, status = %order.status, "✅ Order status updated");
        Ok(order)
    }

    fn validate_content(&self, content: &str) -> Result<(), OrderError> {
        if content.trim().is_empty() {
            return Err(OrderError::EmptyContent);
        }
        if content.len() > self.max_content_len {
            return Err(OrderError::ContentTooLong {
                len: content.len(),
                max: self.max_content_len,
            });
        }
        Ok(())
    }

    fn record_failure(&self, operation: &str, error: &OrderError) {
        self.metrics.record_failure(operation, error.reason());

        match error {
            OrderError::Storage(e) => {
                tracing::error!(
                    operation = operation,
                    error = %e,
                    "Order mutation failed in storage"
                );
            }
            other => {
                tracing::warn!(operation = operation, error = %other, "Order mutation rejected");
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
