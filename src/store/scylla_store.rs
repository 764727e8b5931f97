use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use std::sync::Arc;
use uuid::Uuid;

use super::{sort_for_listing, OrderStore, StoreError};
use crate::domain::order::{Order, OrderStatus};

// ============================================================================
// Scylla Order Store - Durable backend
// ============================================================================
//
// Table layout:
//   orders(id uuid PRIMARY KEY, content text, status text, created_at timestamp)
//
// The table is small and read whole for listing, so ordering happens client
// side on (created_at, id). Ids are UUIDv7, which makes the id tie-break equal
// to insertion order.
//
// ============================================================================

type OrderRow = (Uuid, String, String, DateTime<Utc>);

const SELECT_ALL: &str = "SELECT id, content, status, created_at FROM orders";
const SELECT_ONE: &str = "SELECT id, content, status, created_at FROM orders WHERE id = ?";
const INSERT: &str = "INSERT INTO orders (id, content, status, created_at) VALUES (?, ?, ?, ?)";
const UPDATE_STATUS: &str = "UPDATE orders SET status = ? WHERE id = ?";

pub struct ScyllaOrderStore {
    session: Arc<Session>,
}

impl ScyllaOrderStore {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Open a session against `node` and make sure keyspace and table exist.
    pub async fn connect(node: &str, keyspace: &str) -> anyhow::Result<Self> {
        tracing::info!(node = %node, keyspace = %keyspace, "Connecting to ScyllaDB...");

        let session: Session = SessionBuilder::new().known_node(node).build().await?;

        session
            .query_unpaged(
                format!(
                    "CREATE KEYSPACE IF NOT EXISTS {keyspace} WITH REPLICATION = \
                     {{'class': 'SimpleStrategy', 'replication_factor': 1}}"
                ),
                &[],
            )
            .await?;

        session.use_keyspace(keyspace, false).await?;

        session
            .query_unpaged(
                "CREATE TABLE IF NOT EXISTS orders (
                    id uuid PRIMARY KEY,
                    content text,
                    status text,
                    created_at timestamp
                )",
                &[],
            )
            .await?;

        tracing::info!(keyspace = %keyspace, "✅ ScyllaDB order table ready");

        Ok(Self::new(Arc::new(session)))
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let result = self
            .session
            .query_unpaged(SELECT_ONE, (id,))
            .await
            .map_err(StoreError::unavailable)?;

        let rows_result = result.into_rows_result().map_err(StoreError::unavailable)?;
        let row = rows_result
            .maybe_first_row::<OrderRow>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        row.map(row_to_order).transpose()
    }
}

fn row_to_order((id, content, status, created_at): OrderRow) -> Result<Order, StoreError> {
    let status = status
        .parse::<OrderStatus>()
        .map_err(|_| StoreError::Corrupt(format!("order {id} has unknown status {status:?}")))?;

    Ok(Order {
        id,
        content,
        status,
        created_at,
    })
}

#[async_trait]
impl OrderStore for ScyllaOrderStore {
    async fn create(&self, content: String) -> Result<Order, StoreError> {
        let mut order = Order::new(content);
        // timestamp columns hold milliseconds
        order.created_at = order.created_at.trunc_subsecs(3);

        self.session
            .query_unpaged(
                INSERT,
                (order.id, &order.content, order.status.as_str(), order.created_at),
            )
            .await
            .map_err(StoreError::unavailable)?;

        tracing::debug!(order_id = %order.id, "Persisted order to ScyllaDB");

        Ok(order)
    }

    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError> {
        let result = self
            .session
            .query_unpaged(SELECT_ALL, &[])
            .await
            .map_err(StoreError::unavailable)?;

        let rows_result = result.into_rows_result().map_err(StoreError::unavailable)?;

        let mut orders = Vec::new();
        for row in rows_result
            .rows::<OrderRow>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?
        {
            let order = row_to_order(row.map_err(|e| StoreError::Corrupt(e.to_string()))?)?;
            if status.is_none_or(|s| order.status == s) {
                orders.push(order);
            }
        }

        sort_for_listing(&mut orders);

        tracing::debug!(count = orders.len(), filter = ?status, "Loaded orders from ScyllaDB");
        Ok(orders)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let Some(mut order) = self.fetch(id).await? else {
            return Ok(None);
        };

        self.session
            .query_unpaged(UPDATE_STATUS, (status.as_str(), id))
            .await
            .map_err(StoreError::unavailable)?;

        order.status = status;
        Ok(Some(order))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
//
// Queries against a live cluster belong in integration tests; these cover the
// row mapping.
//
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_order() {
        let id = Uuid::now_v7();
        let created_at = Utc::now().trunc_subsecs(3);

        let row = (id, "order A".to_string(), "shipped".to_string(), created_at);
        let order = row_to_order(row).unwrap();

        assert_eq!(order.id, id);
        assert_eq!(order.content, "order A");
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.created_at, created_at);
    }

    #[test]
    fn test_row_with_unknown_status_is_corrupt() {
        let row = (Uuid::now_v7(), "x".to_string(), "lost".to_string(), Utc::now());

        assert!(matches!(row_to_order(row), Err(StoreError::Corrupt(_))));
    }
}
