use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::directory::RoomDirectory;
use crate::player::{Outbound, SlotId};
use crate::protocol::{self, RoomEvent};
use crate::room::{Room, RoomId};

/// Shared app state passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<RoomDirectory>,
    pub outbound_queue_capacity: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayQuery {
    pub player_id: i32,
    pub room_id: RoomId,
}

/// HTTP handler for the WebSocket upgrade of a seated player
pub async fn play_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
    query: Result<Query<PlayQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return (StatusCode::BAD_REQUEST, "Invalid Inputs").into_response();
    };
    let Ok(slot) = SlotId::try_from(query.player_id) else {
        return (StatusCode::BAD_REQUEST, "Invalid Inputs").into_response();
    };
    let Some(room) = app_state.directory.get(query.room_id).await else {
        return (StatusCode::BAD_REQUEST, "Invalid Request").into_response();
    };
    if !room.is_seated(slot).await {
        return (StatusCode::BAD_REQUEST, "Invalid Request").into_response();
    }

    let capacity = app_state.outbound_queue_capacity;
    ws.on_upgrade(move |socket| handle_socket(socket, room, slot, capacity))
        .into_response()
}

async fn handle_socket(socket: WebSocket, room: Arc<Room>, slot: SlotId, capacity: usize) {
    let (conn, mut outbound) = mpsc::channel(capacity);
    let Some(session) = room.attach(slot, conn).await else {
        tracing::warn!("Player {} in room {} is already connected", slot, room.id());
        return;
    };
    tracing::info!("Player {} connected to room {}", slot, room.id());
    room.post(RoomEvent::Join { slot });

    let (mut sink, mut stream) = socket.split();
    let mut closed_by_server = false;

    loop {
        tokio::select! {
            // Client -> Room
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => ingest(&room, slot, &data),
                    Some(Ok(Message::Text(text))) => ingest(&room, slot, text.as_str().as_bytes()),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!("Player {} read failed: {}", slot, e);
                        break;
                    }
                    _ => {} // Ignore ping/pong
                }
            }

            // Room -> Client
            out = outbound.recv() => {
                match out {
                    Some(Outbound::Frame(frame)) => {
                        if sink.send(Message::Binary(frame)).await.is_err() {
                            break;
                        }
                    }
                    Some(Outbound::Close) | None => {
                        closed_by_server = true;
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }

    if !closed_by_server {
        room.post(RoomEvent::Disconnect { slot, session });
    }
    tracing::info!("Player {} disconnected from room {}", slot, room.id());
}

fn ingest(room: &Room, slot: SlotId, frame: &[u8]) {
    let Some(envelope) = protocol::decode(frame) else {
        return;
    };
    let event = envelope.event;
    match RoomEvent::from_client(envelope, slot) {
        Some(room_event) => {
            room.post(room_event);
        }
        None => tracing::debug!("Player {} sent unusable {:?} event", slot, event),
    }
}
