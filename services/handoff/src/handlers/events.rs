use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};

use souq_domain::id::OrderId;
use souq_identity::identity::IdentityHeaders;

use crate::domain::types::OrderChangeEvent;
use crate::error::HandoffServiceError;
use crate::handlers::order::OrderStatusResponse;
use crate::infra::notifier::OrderChangeHub;
use crate::state::AppState;
use crate::usecase::status::GetOrderStatusUseCase;

/// First frame on every connection; later frames are [`OrderChangeEvent`]s.
#[derive(Serialize)]
struct SnapshotFrame {
    change: &'static str,
    #[serde(flatten)]
    order: OrderStatusResponse,
}

// ── GET /orders/{order_id}/events ────────────────────────────────────────────

pub async fn order_events(
    State(state): State<AppState>,
    _identity: IdentityHeaders,
    Path(order_id): Path<OrderId>,
    ws: WebSocketUpgrade,
) -> Result<Response, HandoffServiceError> {
    // Subscribe before reading the snapshot so no change falls between the two.
    let rx = state.hub.subscribe(order_id).await;
    let usecase = GetOrderStatusUseCase {
        orders: state.order_repo(),
    };
    let snapshot = match usecase.execute(order_id).await {
        Ok(order) => order,
        Err(e) => {
            drop(rx);
            state.hub.release(order_id).await;
            return Err(e);
        }
    };

    let hub = state.hub.clone();
    Ok(ws.on_upgrade(move |socket| async move {
        stream_changes(socket, &hub, rx, snapshot.into()).await;
        hub.release(order_id).await;
    }))
}

async fn stream_changes(
    socket: WebSocket,
    hub: &OrderChangeHub,
    mut rx: broadcast::Receiver<OrderChangeEvent>,
    snapshot: OrderStatusResponse,
) {
    let order_id = snapshot.order_id;
    let (mut sender, mut receiver) = socket.split();

    let frame = SnapshotFrame {
        change: "snapshot",
        order: snapshot,
    };
    if send_json(&mut sender, &frame).await.is_err() {
        return;
    }
    let watchers = hub.watcher_count(order_id).await;
    tracing::debug!(%order_id, watchers, "watcher connected");

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    if send_json(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%order_id, skipped, "watcher fell behind order changes");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Watchers are read-only; pings are answered by the protocol layer.
                Some(Ok(_)) => {}
            },
        }
    }
}

async fn send_json<T: Serialize>(
    sender: &mut SplitSink<WebSocket, Message>,
    value: &T,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(value).map_err(axum::Error::new)?;
    sender.send(Message::Text(text.into())).await
}
