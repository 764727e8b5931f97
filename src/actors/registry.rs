use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

// ============================================================================
// Connection Registry - Live push-channel connections
// ============================================================================
//
// Owned by the BroadcastHub actor, so every join/leave/fan-out is applied in
// mailbox order and no lock is needed around the map.
//
// ============================================================================

pub type ConnectionId = Uuid;

/// Write side of one push-channel connection.
///
/// Frames are pre-serialized JSON text. The queue is bounded; the socket task
/// that owns the receiver drains it onto the wire.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    tx: mpsc::Sender<String>,
}

/// Why a frame did not reach a connection's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// Queue is at capacity (slow consumer).
    Full,
    /// Receiver is gone (transport already broken).
    Closed,
}

impl Connection {
    /// New connection with an outbound queue of `capacity` frames.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { id: Uuid::new_v4(), tx }, rx)
    }

    /// Non-blocking enqueue.
    pub fn try_deliver(&self, frame: String) -> Result<(), DeliveryFailure> {
        self.tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryFailure::Full,
            TrySendError::Closed(_) => DeliveryFailure::Closed,
        })
    }
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, connection: Connection) {
        self.connections.insert(connection.id, connection);
    }

    /// Returns whether the connection was registered. Unknown ids are a no-op.
    pub fn leave(&mut self, id: &ConnectionId) -> bool {
        self.connections.remove(id).is_some()
    }

    pub fn active_connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_leave() {
        let mut registry = ConnectionRegistry::new();
        let (a, _rx_a) = Connection::channel(4);
        let (b, _rx_b) = Connection::channel(4);
        let a_id = a.id;

        registry.join(a);
        registry.join(b);
        assert_eq!(registry.len(), 2);

        assert!(registry.leave(&a_id));
        assert_eq!(registry.len(), 1);
        assert!(registry.active_connections().all(|c| c.id != a_id));
    }

    #[test]
    fn test_leave_is_idempotent() {
        let mut registry = ConnectionRegistry::new();
        let (conn, _rx) = Connection::channel(4);
        let id = conn.id;
        registry.join(conn);

        assert!(registry.leave(&id));
        assert!(!registry.leave(&id));
        assert!(!registry.leave(&Uuid::new_v4()));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_try_deliver_reports_full_and_closed() {
        let (conn, mut rx) = Connection::channel(1);

        assert_eq!(conn.try_deliver("one".to_string()), Ok(()));
        assert_eq!(conn.try_deliver("two".to_string()), Err(DeliveryFailure::Full));
        assert_eq!(rx.try_recv().unwrap(), "one");

        drop(rx);
        assert_eq!(conn.try_deliver("three".to_string()), Err(DeliveryFailure::Closed));
    }
}
