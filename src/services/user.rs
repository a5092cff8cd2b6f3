//! User services - Profilo, cambio password, cancellazione account,
//! email amministrative

use crate::core::auth::clear_auth_cookie;
use crate::core::{AppError, AppState};
use crate::dtos::{CreateEmailMessageDTO, PasswordChangeDTO, ProfileDTO, ProfileUpdateDTO};
use crate::entities::{User, UserRole};
use crate::repositories::{Delete, Update};
use crate::services::mail;
use axum::{
    Extension,
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Carica il profilo completo (utente + allergie + cucine preferite)
async fn load_profile(state: &Arc<AppState>, user: User) -> Result<ProfileDTO, AppError> {
    let allergies = state.user.get_allergies(&user.user_id).await?;
    let cuisines = state.user.get_preferred_cuisines(&user.user_id).await?;
    Ok(ProfileDTO::from((user, allergies, cuisines)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione tramite token jwt
) -> Result<Json<ProfileDTO>, AppError> {
    let profile = load_profile(&state, current_user).await?;
    Ok(Json(profile))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<ProfileUpdateDTO>,
) -> Result<Json<ProfileDTO>, AppError> {
    // 1. Validare i campi presenti (nickname 2-20)
    // 2. Se il nickname cambia, controllare che non sia già preso (409)
    // 3. Aggiornare i campi scalari con update parziale
    // 4. Sostituire le liste M2M solo se fornite nel body
    // 5. Ritornare il profilo aggiornato
    body.validate()?;

    if let Some(ref nickname) = body.nickname {
        if !crate::dtos::user::nickname_is_valid(nickname) {
            return Err(AppError::bad_request(
                "Nickname may only contain letters, digits, '-' and '_'",
            ));
        }
        if nickname != &current_user.nickname
            && state.user.find_by_nickname(nickname).await?.is_some()
        {
            warn!("Profile update attempted with a nickname already in use");
            return Err(AppError::conflict("A user with that nickname already exists"));
        }
    }

    let updated = state.user.update(&current_user.user_id, &body).await?;

    if let Some(ref allergy_ids) = body.allergy_ids {
        state.user.set_allergies(&current_user.user_id, allergy_ids).await?;
    }
    if let Some(ref cuisine_ids) = body.preferred_cuisine_ids {
        state
            .user
            .set_preferred_cuisines(&current_user.user_id, cuisine_ids)
            .await?;
    }

    info!("Profile updated");

    let profile = load_profile(&state, updated).await?;
    Ok(Json(profile))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<PasswordChangeDTO>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Validare la nuova password (>= 8 e conferma uguale)
    // 2. La vecchia password deve verificare contro l'hash corrente
    // 3. Salvare il nuovo hash
    body.validate()?;

    if !current_user.verify_password(&body.old_password) {
        warn!("Password change failed: old password does not match");
        return Err(AppError::bad_request("Old password is not correct"));
    }

    let password_hash = User::hash_password(&body.new_password)
        .map_err(|_| AppError::internal_server_error("Failed to hash password"))?;

    state
        .user
        .update_password(&current_user.user_id, &password_hash)
        .await?;

    info!("Password changed");

    Ok((StatusCode::OK, Json(json!({ "detail": "Password changed" }))))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_my_account(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione tramite token jwt
) -> Result<impl IntoResponse, AppError> {
    // Cancellazione soft: l'account viene anonimizzato così i contenuti
    // scritti (post, commenti, messaggi) restano consultabili.
    // Il cookie azzerato forza il logout lato client.
    state.user.delete(&current_user.user_id).await?;

    info!("Account anonymized");

    let mut headers = HeaderMap::new();
    headers.insert("Set-Cookie", HeaderValue::from_static(clear_auth_cookie()));
    Ok((StatusCode::OK, headers, "Logged out"))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_email_message(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateEmailMessageDTO>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Solo gli ADMIN possono spedire email in blocco
    // 2. Persistere il messaggio con i destinatari
    // 3. Consegnare in background e marcare sent_at a consegna avvenuta
    if current_user.role != UserRole::Admin {
        warn!("Bulk email attempted by non-admin user");
        return Err(AppError::forbidden("Admin role required"));
    }

    body.validate()?;

    let created = state
        .email
        .create_message(&body.subject, &body.message, &body.recipient_ids)
        .await?;

    info!(email_id = created.email_id, "Bulk email queued");

    mail::dispatch_bulk(state.clone(), created.email_id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": created.email_id,
            "subject": created.subject,
            "recipients": body.recipient_ids.len(),
        })),
    ))
}
