use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{sort_for_listing, OrderStore, StoreError};
use crate::domain::order::{Order, OrderStatus};

// ============================================================================
// In-Memory Order Store
// ============================================================================
//
// Process-local backend. Records are kept in insertion order with an id
// index, so a status update is O(1) and listing needs only a stable sort.
//
// ============================================================================

#[derive(Default)]
pub struct InMemoryOrderStore {
    inner: RwLock<Records>,
}

#[derive(Default)]
struct Records {
    orders: Vec<Order>,
    index: HashMap<Uuid, usize>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, content: String) -> Result<Order, StoreError> {
        let order = Order::new(content);

        let mut records = self.inner.write().await;
        let position = records.orders.len();
        records.index.insert(order.id, position);
        records.orders.push(order.clone());

        tracing::debug!(
            order_id = %order.id,
            total = records.orders.len(),
            "Stored order in memory"
        );

        Ok(order)
    }

    async fn list(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, StoreError> {
        let records = self.inner.read().await;

        let mut orders: Vec<Order> = records
            .orders
            .iter()
            .filter(|order| status.is_none_or(|s| order.status == s))
            .cloned()
            .collect();
        sort_for_listing(&mut orders);

        Ok(orders)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, StoreError> {
        let mut records = self.inner.write().await;

        let Some(&position) = records.index.get(&id) else {
            return Ok(None);
        };

        let order = &mut records.orders[position];
        order.status = status;

        Ok(Some(order.clone()))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_create_assigns_defaults() {
        let store = InMemoryOrderStore::new();

        let order = store.create("order A".to_string()).await.unwrap();

        assert_eq!(order.content, "order A");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(store.list(None).await.unwrap(), vec![order]);
    }

    #[tokio::test]
    async fn test_list_is_in_creation_order() {
        let store = InMemoryOrderStore::new();

        let mut created = Vec::new();
        for i in 0..20 {
            created.push(store.create(format!("order {i}")).await.unwrap());
        }

        let listed = store.list(None).await.unwrap();
        assert_eq!(listed, created);

        let ids: HashSet<Uuid> = listed.iter().map(|o| o.id).collect();
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let store = InMemoryOrderStore::new();
        let a = store.create("a".to_string()).await.unwrap();
        let b = store.create("b".to_string()).await.unwrap();
        let c = store.create("c".to_string()).await.unwrap();

        store.update_status(b.id, OrderStatus::Shipped).await.unwrap();

        let pending: Vec<Uuid> = store
            .list(Some(OrderStatus::Pending))
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(pending, vec![a.id, c.id]);

        let shipped = store.list(Some(OrderStatus::Shipped)).await.unwrap();
        assert_eq!(shipped.len(), 1);
        assert_eq!(shipped[0].id, b.id);
    }

    #[tokio::test]
    async fn test_list_is_a_snapshot() {
        let store = InMemoryOrderStore::new();
        let order = store.create("a".to_string()).await.unwrap();

        let snapshot = store.list(None).await.unwrap();
        store.update_status(order.id, OrderStatus::Completed).await.unwrap();
        store.create("b".to_string()).await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_update_status_unknown_id() {
        let store = InMemoryOrderStore::new();
        store.create("a".to_string()).await.unwrap();

        let result = store.update_status(Uuid::new_v4(), OrderStatus::Shipped).await.unwrap();

        assert!(result.is_none());
        assert!(store
            .list(None)
            .await
            .unwrap()
            .iter()
            .all(|o| o.status == OrderStatus::Pending));
    }

    #[tokio::test]
    async fn test_update_status_keeps_immutable_fields() {
        let store = InMemoryOrderStore::new();
        let order = store.create("a".to_string()).await.unwrap();

        let updated = store
            .update_status(order.id, OrderStatus::Shipped)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, order.id);
        assert_eq!(updated.content, order.content);
        assert_eq!(updated.created_at, order.created_at);
        assert_eq!(updated.status, OrderStatus::Shipped);
    }
}
