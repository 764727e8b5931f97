use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::{AggregatedMessage, AggregatedMessageStream, CloseCode, CloseReason, Session};
use futures_util::StreamExt;
use tokio::sync::mpsc;

use super::AppState;
use crate::actors::{Connection, ConnectionId, Join, Leave};
use crate::domain::order::{OrderCommand, OrderEvent};

// ============================================================================
// Push Channel - WebSocket listener
// ============================================================================
//
// Per connection:
//   1. join the hub (live frames start queueing on the connection)
//   2. read the snapshot and write the `initial` frame straight to the socket
//   3. drain queued live frames and handle inbound messages until close
//   4. leave the hub
//
// Inbound text is the content of a new order; there is no reply frame, the
// sender sees its order through the regular `newOrder` broadcast. Fragmented
// messages are reassembled before they are handled.
//
// If the hub evicts the connection for falling behind, its queue closes after
// the buffered frames and the socket is closed with `Again` (1013) so the
// client reconnects and starts over from a fresh snapshot.
//
// ============================================================================

pub async fn push_channel(
    req: HttpRequest,
    body: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, session, stream) = actix_ws::handle(&req, body)?;

    actix_web::rt::spawn(run_connection(state, session, stream.aggregate_continuations()));

    Ok(response)
}

/// A connection that has joined the hub but not yet started draining.
pub(crate) struct Joined {
    pub id: ConnectionId,
    pub outbound: mpsc::Receiver<String>,
    /// `initial` frame, absent when the snapshot could not be read
    pub initial: Option<String>,
}

/// What the connection loop does after one inbound message.
#[derive(Debug, PartialEq)]
pub(crate) enum Inbound {
    Continue,
    Pong(Vec<u8>),
    Close(Option<CloseReason>),
}

/// Register a new connection and build its snapshot frame.
///
/// The join completes before the snapshot is read, so every mutation is either
/// in the snapshot, queued on the connection, or both.
pub(crate) async fn join(state: &AppState) -> Option<Joined> {
    let (connection, outbound) = Connection::channel(state.connection_buffer);
    let id = connection.id;

    if let Err(e) = state.hub.send(Join(connection)).await {
        tracing::error!(
            connection_id = %id,
            error = %e,
            "BroadcastHub unavailable, refusing connection"
        );
        return None;
    }

    let initial = match state.service.list(None).await {
        Ok(orders) => match OrderEvent::Initial(orders).to_frame() {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::error!(connection_id = %id, error = %e, "Failed to serialize snapshot");
                None
            }
        },
        // already logged by the service
        Err(_) => None,
    };

    Some(Joined { id, outbound, initial })
}

/// Apply one inbound push-channel message.
pub(crate) async fn handle_inbound(
    state: &AppState,
    id: ConnectionId,
    msg: AggregatedMessage,
) -> Inbound {
    match msg {
        AggregatedMessage::Text(text) => {
            create_from_push(state, id, text.to_string()).await;
            Inbound::Continue
        }
        AggregatedMessage::Binary(bytes) => {
            match String::from_utf8(bytes.to_vec()) {
                Ok(content) => create_from_push(state, id, content).await,
                Err(_) => tracing::warn!(connection_id = %id, "Ignoring non UTF-8 binary frame"),
            }
            Inbound::Continue
        }
        AggregatedMessage::Ping(bytes) => Inbound::Pong(bytes.to_vec()),
        AggregatedMessage::Close(reason) => Inbound::Close(reason),
        AggregatedMessage::Pong(_) => Inbound::Continue,
    }
}

async fn create_from_push(state: &AppState, id: ConnectionId, content: String) {
    tracing::info!(connection_id = %id, "Received order over push channel");

    // No caller to answer: failures are logged by the service and dropped here.
    if let Err(e) = state.service.handle(OrderCommand::Create { content }).await {
        tracing::debug!(connection_id = %id, error = %e, "Dropped push-channel order");
    }
}

async fn run_connection(
    state: web::Data<AppState>,
    mut session: Session,
    mut stream: AggregatedMessageStream,
) {
    let Some(Joined { id, mut outbound, initial }) = join(&state).await else {
        let _ = session.close(None).await;
        return;
    };

    let mut close_reason = None;
    let mut open = match initial {
        Some(frame) => session.text(frame).await.is_ok(),
        None => true,
    };

    while open {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(frame) => open = session.text(frame).await.is_ok(),
                None => {
                    tracing::warn!(connection_id = %id, "Evicted by hub, closing push connection");
                    close_reason = Some((CloseCode::Again, "outbound queue overflow").into());
                    open = false;
                }
            },
            msg = stream.next() => match msg {
                Some(Ok(msg)) => match handle_inbound(&state, id, msg).await {
                    Inbound::Continue => {}
                    Inbound::Pong(bytes) => open = session.pong(&bytes).await.is_ok(),
                    Inbound::Close(reason) => {
                        close_reason = reason;
                        open = false;
                    }
                },
                Some(Err(e)) => {
                    tracing::warn!(connection_id = %id, error = %e, "WebSocket protocol error");
                    open = false;
                }
                None => open = false,
            },
        }
    }

    state.hub.do_send(Leave(id));
    let _ = session.close(close_reason).await;

    tracing::debug!(connection_id = %id, "Push connection closed");
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::{BroadcastHub, GetActiveConnections};
    use crate::domain::order::{Order, OrderService, OrderStatus};
    use crate::metrics::Metrics;
    use crate::store::InMemoryOrderStore;
    use actix::Actor;
    use actix_web::test::TestRequest;
    use actix_web::FromRequest;
    use std::sync::Arc;

    fn state() -> AppState {
        let metrics = Arc::new(Metrics::new().unwrap());
        let hub = BroadcastHub::new(metrics.clone()).start();
        let store = Arc::new(InMemoryOrderStore::new());
        let service = OrderService::new(store, hub.clone(), metrics.clone());
        AppState::new(Arc::new(service), hub, metrics, 16)
    }

    async fn drain(
        state: &AppState,
        rx: &mut mpsc::Receiver<String>,
    ) -> Vec<serde_json::Value> {
        state.hub.send(GetActiveConnections).await.unwrap();
        let mut out = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            out.push(serde_json::from_str(&frame).unwrap());
        }
        out
    }

    fn parse(frame: &str) -> serde_json::Value {
        serde_json::from_str(frame).unwrap()
    }

    #[actix::test]
    async fn test_snapshot_then_live_events() {
        let state = state();
        let a = state.service.create("order A".to_string()).await.unwrap();
        let b = state.service.create("order B".to_string()).await.unwrap();

        let mut joined = join(&state).await.unwrap();

        let initial = parse(joined.initial.as_deref().unwrap());
        assert_eq!(initial["type"], "initial");
        let snapshot: Vec<Order> = serde_json::from_value(initial["data"].clone()).unwrap();
        assert_eq!(snapshot, vec![a.clone(), b]);

        let c = state.service.create("order C".to_string()).await.unwrap();
        state.service.update_status(a.id, "completed").await.unwrap();

        let live = drain(&state, &mut joined.outbound).await;
        assert_eq!(live.len(), 2);
        assert_eq!(live[0]["type"], "newOrder");
        assert_eq!(live[0]["data"]["id"], c.id.to_string());
        assert_eq!(live[1]["type"], "updateOrder");
        assert_eq!(live[1]["data"]["status"], "completed");
    }

    #[actix::test]
    async fn test_observer_scenario() {
        let state = state();
        let mut joined = join(&state).await.unwrap();
        assert_eq!(joined.initial.as_deref(), Some(r#"{"type":"initial","data":[]}"#));

        let order = state.service.create("order A".to_string()).await.unwrap();
        state.service.update_status(order.id, "shipped").await.unwrap();

        let live = drain(&state, &mut joined.outbound).await;
        assert_eq!(live.len(), 2);
        assert_eq!(live[0]["type"], "newOrder");
        assert_eq!(live[0]["data"]["content"], "order A");
        assert_eq!(live[0]["data"]["status"], "pending");
        assert_eq!(live[1]["type"], "updateOrder");
        assert_eq!(live[1]["data"]["status"], "shipped");
    }

    #[actix::test]
    async fn test_push_message_creates_order_for_everyone() {
        let state = state();
        let mut sender = join(&state).await.unwrap();
        let mut other = join(&state).await.unwrap();

        let push = AggregatedMessage::Text("order B".into());
        let next = handle_inbound(&state, sender.id, push).await;
        assert_eq!(next, Inbound::Continue);

        let orders = state.service.list(None).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].content, "order B");
        assert_eq!(orders[0].status, OrderStatus::Pending);

        for joined in [&mut sender, &mut other] {
            let live = drain(&state, &mut joined.outbound).await;
            assert_eq!(live.len(), 1);
            assert_eq!(live[0]["type"], "newOrder");
            assert_eq!(live[0]["data"]["content"], "order B");
        }
    }

    #[actix::test]
    async fn test_invalid_push_message_is_dropped() {
        let state = state();
        let mut joined = join(&state).await.unwrap();

        let next = handle_inbound(&state, joined.id, AggregatedMessage::Text("   ".into())).await;
        assert_eq!(next, Inbound::Continue);
        let binary = AggregatedMessage::Binary(vec![0xff, 0xfe].into());
        let next = handle_inbound(&state, joined.id, binary).await;
        assert_eq!(next, Inbound::Continue);

        assert!(state.service.list(None).await.unwrap().is_empty());
        assert!(drain(&state, &mut joined.outbound).await.is_empty());
    }

    #[actix::test]
    async fn test_control_frames() {
        let state = state();
        let joined = join(&state).await.unwrap();

        let ping = AggregatedMessage::Ping(b"hi".to_vec().into());
        let next = handle_inbound(&state, joined.id, ping).await;
        assert_eq!(next, Inbound::Pong(b"hi".to_vec()));

        let next = handle_inbound(&state, joined.id, AggregatedMessage::Close(None)).await;
        assert_eq!(next, Inbound::Close(None));
    }

    #[actix::test]
    async fn test_join_registers_connection() {
        let state = state();
        let joined = join(&state).await.unwrap();

        let active = state.hub.send(GetActiveConnections).await.unwrap();
        assert_eq!(active, vec![joined.id]);

        state.hub.send(Leave(joined.id)).await.unwrap();
        assert!(state.hub.send(GetActiveConnections).await.unwrap().is_empty());
    }

    /// One masked client frame (zero mask key, so the payload goes out as-is).
    fn client_frame(first_byte: u8, payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![first_byte, 0x80 | payload.len() as u8, 0, 0, 0, 0];
        frame.extend_from_slice(payload);
        frame
    }

    #[actix::test]
    async fn test_fragmented_text_message_creates_one_order() {
        let state = state();
        let mut joined = join(&state).await.unwrap();

        // text opcode without FIN, then a final continuation frame
        let mut wire = client_frame(0x01, b"order ");
        wire.extend(client_frame(0x80, b"C"));

        let (req, mut payload) = TestRequest::get()
            .insert_header(("upgrade", "websocket"))
            .insert_header(("connection", "upgrade"))
            .insert_header(("sec-websocket-version", "13"))
            .insert_header(("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ=="))
            .set_payload(wire)
            .to_http_parts();
        let body = web::Payload::from_request(&req, &mut payload).await.unwrap();
        let (_response, _session, stream) = actix_ws::handle(&req, body).unwrap();
        let mut stream = stream.aggregate_continuations();

        let mut handled = 0;
        while let Some(Ok(msg)) = stream.next().await {
            assert_eq!(handle_inbound(&state, joined.id, msg).await, Inbound::Continue);
            handled += 1;
        }
        assert_eq!(handled, 1);

        let orders = state.service.list(None).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].content, "order C");

        let live = drain(&state, &mut joined.outbound).await;
        assert_eq!(live.len(), 1);
        assert_eq!(live[0]["data"]["content"], "order C");
    }
}
