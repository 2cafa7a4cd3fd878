//! WebSocket observers.
//!
//! Each connection gets a [`SubscriberHandle`]; hub messages are forwarded
//! as text frames until either side closes.

use super::{ApiError, AppState};
use crate::hub::SubscriberHandle;
use crate::snapshot::Snapshot;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, instrument};

#[instrument(skip(state, ws))]
pub(super) async fn observe_session(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    state.service.get_session(&game_id)?;
    Ok(ws.on_upgrade(move |socket| forward(socket, state, game_id)))
}

#[instrument(skip(socket, state))]
async fn forward(socket: WebSocket, state: AppState, game_id: String) {
    let (handle, mut outbound) = SubscriberHandle::channel(state.subscriber_buffer);
    state.hub.subscribe(game_id.clone(), handle.clone());
    info!(subscriber = %handle.id(), "Observer connected");

    // Late joiners see the current state without waiting for a mutation.
    if let Ok(session) = state.service.get_session(&game_id) {
        state.hub.publish(Snapshot::from(&session));
    }

    let (mut sink, mut stream) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = outbound.recv().await {
            if sink.send(Message::Text(payload.to_string().into())).await.is_err() {
                break;
            }
        }
    });

    let hub = state.hub.clone();
    let inbound_handle = handle.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Close(_) => break,
                Message::Text(_) | Message::Binary(_) => {
                    hub.notify_error(&inbound_handle, "observers are read-only");
                }
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.hub.unsubscribe(&handle);
    debug!(subscriber = %handle.id(), "Observer disconnected");
}
