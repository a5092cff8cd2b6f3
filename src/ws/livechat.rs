//! Livechat WebSocket - Connessioni alle stanze in tempo reale
//!
//! Ogni connessione viene divisa in due task: uno legge i frame del client
//! (li persiste e li rilancia sul canale broadcast della stanza), l'altro
//! scrive sulla socket tutto ciò che arriva dal canale della stanza più gli
//! errori destinati solo a questo client.

use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Extension;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Duration, interval, timeout};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, instrument, warn};

use crate::core::{AppError, AppState};
use crate::dtos::{ClientFrame, ServerFrame};
use crate::entities::User;
use crate::repositories::message::CreateChatMessage;
use crate::repositories::{Create, Read};
use crate::ws::{RATE_LIMITER_MILLIS, TIMEOUT_DURATION_SECONDS};

/// Segnali interni dal task di lettura a quello di scrittura
enum InternalSignal {
    /// Frame destinato solo a questo client (errori di validazione)
    Direct(ServerFrame),
    Shutdown,
}

/// Entry point per l'upgrade su /ws/chat/{room_id}.
/// La stanza deve esistere prima di accettare l'upgrade.
pub async fn room_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i32>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione JWT
) -> Result<Response, AppError> {
    if state.room.read(&room_id).await?.is_none() {
        return Err(AppError::not_found("Chat room not found"));
    }

    Ok(ws.on_upgrade(move |socket| handle_room_socket(socket, state, current_user, room_id)))
}

#[instrument(skip(ws, state, user), fields(user_id = %user.user_id, room_id))]
async fn handle_room_socket(ws: WebSocket, state: Arc<AppState>, user: User, room_id: i32) {
    info!("WebSocket connection established");

    // Dividiamo il WebSocket in due metà: sender e receiver
    let (ws_tx, ws_rx) = ws.split();

    // Canale interno per i frame destinati solo a questo client
    let (int_tx, int_rx) = unbounded_channel::<InternalSignal>();

    // Testa rx del canale broadcast della stanza
    let room_rx = state.rooms_online.subscribe(&room_id);

    tokio::spawn(write_ws(room_id, ws_tx, room_rx, int_rx));
    tokio::spawn(listen_ws(room_id, ws_rx, int_tx, state, user));
}

#[instrument(skip(websocket_tx, room_rx, internal_rx), fields(room_id))]
async fn write_ws(
    room_id: i32,
    mut websocket_tx: SplitSink<WebSocket, Message>,
    room_rx: Receiver<Arc<ServerFrame>>,
    mut internal_rx: UnboundedReceiver<InternalSignal>,
) {
    info!("Write task started");

    let mut room_stream = BroadcastStream::new(room_rx);

    loop {
        tokio::select! {
            frame = room_stream.next() => {
                match frame {
                    Some(Ok(frame)) => {
                        if send_frame(&mut websocket_tx, &frame).await.is_err() {
                            warn!("Failed to send room frame, closing connection");
                            break;
                        }
                    }
                    // rx in ritardo: il client ha perso frame, segnaliamo e proseguiamo
                    Some(Err(e)) => {
                        warn!("Broadcast receiver lagged: {:?}", e);
                    }
                    None => {
                        info!("Room broadcast channel closed");
                        break;
                    }
                }
            }

            signal = internal_rx.recv() => {
                match signal {
                    Some(InternalSignal::Direct(frame)) => {
                        if send_frame(&mut websocket_tx, &frame).await.is_err() {
                            warn!("Failed to send direct frame, closing connection");
                            break;
                        }
                    }
                    Some(InternalSignal::Shutdown) | None => {
                        info!("Shutdown signal received");
                        break;
                    }
                }
            }
        }
    }

    info!("Write task terminated");
}

async fn send_frame(
    websocket_tx: &mut SplitSink<WebSocket, Message>,
    frame: &ServerFrame,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(frame).map_err(axum::Error::new)?;
    websocket_tx.send(Message::Text(Utf8Bytes::from(json))).await
}

#[instrument(skip(websocket_rx, internal_tx, state, user), fields(user_id = %user.user_id, room_id))]
async fn listen_ws(
    room_id: i32,
    mut websocket_rx: SplitStream<WebSocket>,
    internal_tx: UnboundedSender<InternalSignal>,
    state: Arc<AppState>,
    user: User,
) {
    info!("Listen task started");

    let mut rate_limiter = interval(Duration::from_millis(RATE_LIMITER_MILLIS));
    let timeout_duration = Duration::from_secs(TIMEOUT_DURATION_SECONDS);

    loop {
        match timeout(timeout_duration, websocket_rx.next()).await {
            Ok(Some(msg_result)) => {
                rate_limiter.tick().await;

                let msg = match msg_result {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("WebSocket error: {:?}", e);
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => {
                        process_frame(&state, &user, room_id, &text, &internal_tx).await;
                    }
                    Message::Close(_) => {
                        info!("Close message received");
                        break;
                    }
                    _ => {}
                }
            }
            Ok(None) => {
                info!("WebSocket stream ended");
                break;
            }
            Err(_) => {
                warn!(
                    timeout_secs = TIMEOUT_DURATION_SECONDS,
                    "Connection timeout"
                );
                break;
            }
        }
    }

    // Cleanup
    info!("Cleaning up connection");
    let _ = internal_tx.send(InternalSignal::Shutdown);
    info!("Listen task terminated");
}

/// Valida, persiste e ritrasmette un frame del client
async fn process_frame(
    state: &Arc<AppState>,
    user: &User,
    room_id: i32,
    text: &str,
    internal_tx: &UnboundedSender<InternalSignal>,
) {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(_) => {
            warn!("Failed to deserialize client frame");
            let _ = internal_tx.send(InternalSignal::Direct(ServerFrame::system_error(
                "Malformed frame, expected {\"message\": \"...\"}",
            )));
            return;
        }
    };

    let content = frame.message.trim();
    if content.is_empty() {
        let _ = internal_tx.send(InternalSignal::Direct(ServerFrame::system_error(
            "Message is empty",
        )));
        return;
    }

    // prima la persistenza, poi il broadcast: un messaggio visto dagli
    // altri deve essere già nel database
    if let Err(e) = state
        .msg
        .create(&CreateChatMessage {
            room_id,
            user_id: user.user_id,
            content: content.to_string(),
        })
        .await
    {
        warn!("Failed to persist chat message: {:?}", e);
        let _ = internal_tx.send(InternalSignal::Direct(ServerFrame::system_error(
            "Could not save the message",
        )));
        return;
    }

    let broadcast_frame = Arc::new(ServerFrame::user(user.nickname.clone(), content));
    let _ = state.rooms_online.send(&room_id, broadcast_frame);
}
