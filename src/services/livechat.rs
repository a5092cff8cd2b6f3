//! Livechat services - CRUD su stanze e messaggi
//!
//! La parte real-time vive in `crate::ws::livechat`; qui ci sono le route
//! REST usate per elencare le stanze e ricostruire lo storico.

use crate::core::{AppError, AppState};
use crate::dtos::{ChatMessageDTO, ChatRoomDTO, CreateChatMessageDTO, CreateChatRoomDTO};
use crate::entities::User;
use crate::repositories::message::CreateChatMessage;
use crate::repositories::{Create, Delete, Read};
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[instrument(skip(state))]
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChatRoomDTO>>, AppError> {
    let rooms = state.room.find_all().await?;
    let rooms_dto: Vec<ChatRoomDTO> = rooms.into_iter().map(ChatRoomDTO::from).collect();
    Ok(Json(rooms_dto))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione tramite token jwt
    Json(body): Json<CreateChatRoomDTO>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;

    let created = state.room.create(&body).await?;
    info!(room_id = created.room_id, "Chat room created");

    Ok((StatusCode::CREATED, Json(ChatRoomDTO::from(created))))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<impl IntoResponse, AppError> {
    if state.room.read(&room_id).await?.is_none() {
        return Err(AppError::not_found("Chat room not found"));
    }

    state.room.delete(&room_id).await?;
    info!(room_id, "Chat room deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_room_messages(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<ChatMessageDTO>>, AppError> {
    // 1. La stanza deve esistere (404)
    // 2. Messaggi in ordine cronologico
    // 3. Risolvere i nickname dei mittenti con letture parallele + join in memoria
    if state.room.read(&room_id).await?.is_none() {
        return Err(AppError::not_found("Chat room not found"));
    }

    let messages = state.msg.find_many_by_room_id(&room_id).await?;

    let mut sender_ids: Vec<i32> = messages.iter().map(|m| m.user_id).collect();
    sender_ids.sort_unstable();
    sender_ids.dedup();

    let users = try_join_all(sender_ids.into_iter().map(|uid| {
        let state = state.clone();
        async move { state.user.read(&uid).await }
    }))
    .await?;

    let nicknames: HashMap<i32, String> = users
        .into_iter()
        .flatten()
        .map(|user| (user.user_id, user.nickname))
        .collect();

    let messages_dto: Vec<ChatMessageDTO> = messages
        .into_iter()
        .filter_map(|message| {
            nicknames
                .get(&message.user_id)
                .cloned()
                .map(|nickname| ChatMessageDTO::from((message, nickname)))
        })
        .collect();

    Ok(Json(messages_dto))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_room_message(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<i32>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateChatMessageDTO>,
) -> Result<impl IntoResponse, AppError> {
    if state.room.read(&room_id).await?.is_none() {
        return Err(AppError::not_found("Chat room not found"));
    }

    body.validate()?;

    let created = state
        .msg
        .create(&CreateChatMessage {
            room_id,
            user_id: current_user.user_id,
            content: body.content,
        })
        .await?;
    info!(message_id = created.message_id, "Chat message stored");

    Ok((
        StatusCode::CREATED,
        Json(ChatMessageDTO::from((created, current_user.nickname))),
    ))
}
