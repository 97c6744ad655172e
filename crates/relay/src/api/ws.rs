//! WebSocket relay endpoint.
//!
//! Frames are fanned out verbatim to the other room member; the relay never
//! decodes payloads.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use couchsync_domain::{ConnectionId, RoomId};

use crate::rooms::CONNECTION_CHANNEL_BUFFER;

use super::AppState;

/// WebSocket upgrade handler - entry point for new connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Ok(room_id) = id.parse::<RoomId>() else {
        return (StatusCode::BAD_REQUEST, "room ID is not a valid UUID").into_response();
    };

    // Members enter through the room page first; a socket for an unknown
    // room is a client bug.
    if !state.rooms.exists(room_id).await {
        return (StatusCode::INTERNAL_SERVER_ERROR, "room does not exist").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state, room_id))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room_id: RoomId) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let connection_id = ConnectionId::new();

    let (tx, mut rx) = mpsc::channel::<String>(CONNECTION_CHANNEL_BUFFER);
    if let Err(e) = state.rooms.join(room_id, connection_id, tx).await {
        tracing::warn!(%connection_id, %room_id, error = %e, "rejecting connection");
        let _ = ws_sender
            .send(Message::Close(Some(CloseFrame {
                code: 1008, // policy violation
                reason: e.to_string().into(),
            })))
            .await;
        return;
    }
    tracing::info!(%connection_id, %room_id, "WebSocket connection established");

    // Forward frames queued by other members to this socket.
    let send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if ws_sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let delivered = state
                    .rooms
                    .broadcast(room_id, connection_id, text.as_str())
                    .await;
                tracing::debug!(%connection_id, delivered, "frame relayed");
            }
            Ok(Message::Close(_)) => break,
            // axum answers pings itself; binary frames are not part of the
            // protocol
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(%connection_id, error = %e, "websocket error");
                break;
            }
        }
    }

    state.rooms.leave(room_id, connection_id).await;
    send_task.abort();
    tracing::info!(%connection_id, %room_id, "WebSocket connection closed");
}
