//! Chatbot WebSocket - Conversazione RAG isolata per connessione
//!
//! Il consumer è turn-based: riceve `{"message": ...}`, persiste la
//! domanda, esegue la pipeline di retrieval + generazione e risponde con
//! `{"sender": "chatbot", "message": ...}`. La storia della conversazione
//! vive nella connessione: una nuova socket riparte da zero.

use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::Extension;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::time::{Duration, timeout};
use tracing::{error, info, instrument, warn};

use crate::chatbot::pipeline::{MAX_HISTORY_TURNS, ask};
use crate::chatbot::ChatTurn;
use crate::core::AppState;
use crate::dtos::{ClientFrame, ProfileDTO, ServerFrame};
use crate::entities::User;
use crate::repositories::question::CreateQuestion;
use crate::repositories::Create;
use crate::ws::TIMEOUT_DURATION_SECONDS;

/// Entry point per l'upgrade su /ws/chatbot
pub async fn chatbot_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione JWT
) -> Response {
    ws.on_upgrade(move |socket| handle_chatbot_socket(socket, state, current_user))
}

#[instrument(skip(ws, state, user), fields(user_id = %user.user_id))]
async fn handle_chatbot_socket(mut ws: WebSocket, state: Arc<AppState>, user: User) {
    info!("Chatbot WebSocket connection established");

    // Il profilo condiziona le raccomandazioni: lo rendiamo una volta sola
    let user_data = match load_user_data(&state, &user).await {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to load user profile: {:?}", e);
            let _ = send_frame(&mut ws, &ServerFrame::system_error("Could not load your profile")).await;
            return;
        }
    };

    // Storia della conversazione, isolata per connessione
    let mut history: Vec<ChatTurn> = Vec::new();

    let timeout_duration = Duration::from_secs(TIMEOUT_DURATION_SECONDS);

    loop {
        let msg = match timeout(timeout_duration, ws.next()).await {
            Ok(Some(Ok(msg))) => msg,
            Ok(Some(Err(e))) => {
                warn!("WebSocket error: {:?}", e);
                break;
            }
            Ok(None) => {
                info!("WebSocket stream ended");
                break;
            }
            Err(_) => {
                warn!(timeout_secs = TIMEOUT_DURATION_SECONDS, "Connection timeout");
                break;
            }
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => {
                info!("Close message received");
                break;
            }
            _ => continue,
        };

        let question = match parse_question(&text) {
            Ok(question) => question,
            Err(error_frame) => {
                if send_frame(&mut ws, &error_frame).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let reply = run_turn(&state, &user, &user_data, &history, &question).await;

        match reply {
            Ok(answer) => {
                if send_frame(&mut ws, &ServerFrame::chatbot(answer.clone())).await.is_err() {
                    break;
                }
                history.push(ChatTurn { question, answer });
                // la pipeline guarda solo gli ultimi MAX_HISTORY_TURNS turni
                if history.len() > MAX_HISTORY_TURNS {
                    let excess = history.len() - MAX_HISTORY_TURNS;
                    history.drain(..excess);
                }
            }
            Err(e) => {
                // l'errore chiude il turno, non la connessione
                error!("Chatbot turn failed: {}", e);
                let frame = ServerFrame::system_error(format!("Something went wrong: {e}"));
                if send_frame(&mut ws, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    info!("Chatbot WebSocket connection closed");
}

/// Profilo serializzato passato come user_data alla pipeline
async fn load_user_data(state: &Arc<AppState>, user: &User) -> Result<String, sqlx::Error> {
    let allergies = state.user.get_allergies(&user.user_id).await?;
    let cuisines = state.user.get_preferred_cuisines(&user.user_id).await?;
    let profile = ProfileDTO::from((user.clone(), allergies, cuisines));
    Ok(serde_json::to_string(&profile).unwrap_or_default())
}

fn parse_question(text: &str) -> Result<String, ServerFrame> {
    let frame = serde_json::from_str::<ClientFrame>(text)
        .map_err(|_| ServerFrame::system_error("Malformed frame, expected {\"message\": \"...\"}"))?;

    let question = frame.message.trim().to_string();
    if question.is_empty() {
        return Err(ServerFrame::system_error("Message is empty"));
    }
    Ok(question)
}

/// Un turno completo: persistenza della domanda + pipeline RAG
async fn run_turn(
    state: &Arc<AppState>,
    user: &User,
    user_data: &str,
    history: &[ChatTurn],
    question: &str,
) -> Result<String, crate::chatbot::ChatbotError> {
    state
        .question
        .create(&CreateQuestion {
            question: question.chars().take(255).collect(),
            user_id: user.user_id,
        })
        .await?;

    let store = state.vector_store().await?;

    ask(
        &state.http_client,
        &state.config.llm,
        store,
        question,
        user_data,
        history,
    )
    .await
}

async fn send_frame(ws: &mut WebSocket, frame: &ServerFrame) -> Result<(), axum::Error> {
    let json = serde_json::to_string(frame).map_err(axum::Error::new)?;
    ws.send(Message::Text(Utf8Bytes::from(json))).await
}
