//! Auth services - Registrazione, login, logout, login social e verifica email

use crate::core::auth::{auth_cookie, clear_auth_cookie, encode_jwt};
use crate::core::{AppError, AppState};
use crate::dtos::{CreateUserDTO, KakaoSignInDTO, RegisteredUserDTO, SignInDTO, SignUpDTO};
use crate::repositories::Create;
use crate::services::mail;
use axum::{
    extract::{Json, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignUpDTO>, // JSON body
) -> Result<impl IntoResponse, AppError> {
    // 1. Validare il DTO con validator (email, password >= 8, conferma, nickname 2-20)
    // 2. Controllare che email e nickname non siano già registrati (409)
    // 3. Generare l'hash della password
    // 4. Salvare il nuovo utente e creare il token di verifica email
    // 5. Spedire l'email di attivazione in background (mai bloccare la risposta)
    // 6. Ritornare 201 con il DTO dell'utente creato
    body.validate()?;

    if !crate::dtos::user::nickname_is_valid(&body.nickname) {
        return Err(AppError::bad_request(
            "Nickname may only contain letters, digits, '-' and '_'",
        ));
    }

    if state.user.find_by_email(&body.email).await?.is_some() {
        warn!("Signup attempted with an email already in use");
        return Err(AppError::conflict("A user with that email address already exists"));
    }

    if state.user.find_by_nickname(&body.nickname).await?.is_some() {
        warn!("Signup attempted with a nickname already in use");
        return Err(AppError::conflict("A user with that nickname already exists"));
    }

    let password_hash = crate::entities::User::hash_password(&body.password).map_err(|_| {
        AppError::internal_server_error("Failed to hash password")
    })?;

    let new_user = CreateUserDTO {
        email: body.email,
        nickname: body.nickname,
        password: password_hash,
        age: body.age,
        gender: body.gender,
        is_vegetarian: body.is_vegetarian,
        is_vegan: body.is_vegan,
        email_verified: false,
    };

    let created_user = state.user.create(&new_user).await?;
    info!(user_id = created_user.user_id, "User registered");

    mail::send_activation_email(state.clone(), created_user.user_id, created_user.email.clone());

    Ok((StatusCode::CREATED, Json(RegisteredUserDTO::from(created_user))))
}

#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn signin(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignInDTO>, // JSON body
) -> Result<impl IntoResponse, AppError> {
    // 1. Cercare l'utente per email; account inesistente o disattivato -> 401
    // 2. Verificare la password contro l'hash memorizzato -> 401 se non corrisponde
    // 3. Generare il token JWT e impostare il cookie HttpOnly + header Authorization
    // 4. Ritornare 200 con nickname (il client lo mostra nella UI)
    let user = match state.user.find_by_email(&body.email).await? {
        Some(user) if user.is_active => user,
        _ => {
            warn!("Sign in failed: unknown or inactive account");
            return Err(AppError::unauthorized("Email or password are not correct"));
        }
    };

    if !user.verify_password(&body.password) {
        warn!("Sign in failed: wrong password");
        return Err(AppError::unauthorized("Email or password are not correct"));
    }

    let token = encode_jwt(user.email, user.user_id, &state.jwt_secret)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        "Set-Cookie",
        HeaderValue::from_str(&auth_cookie(&token))
            .map_err(|_| AppError::internal_server_error("Invalid cookie value"))?,
    );
    headers.insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AppError::internal_server_error("Invalid header value"))?,
    );

    info!(user_id = user.user_id, "User signed in");

    Ok((
        StatusCode::OK,
        headers,
        Json(json!({
            "detail": "Signed in successfully",
            "nickname": user.nickname,
        })),
    ))
}

#[instrument]
pub async fn signout() -> impl IntoResponse {
    // Il logout è lato client: azzeriamo il cookie di sessione
    let mut headers = HeaderMap::new();
    headers.insert("Set-Cookie", HeaderValue::from_static(clear_auth_cookie()));

    (StatusCode::OK, headers, Json(json!({ "detail": "Signed out" })))
}

// ------- login social Kakao -------

/// Risposta dell'API userinfo di Kakao, ridotta ai campi che usiamo
#[derive(Deserialize, Debug)]
struct KakaoUserInfo {
    id: i64,
    kakao_account: Option<KakaoAccount>,
}

#[derive(Deserialize, Debug)]
struct KakaoAccount {
    email: Option<String>,
    profile: Option<KakaoProfile>,
}

#[derive(Deserialize, Debug)]
struct KakaoProfile {
    nickname: Option<String>,
}

#[instrument(skip(state, body))]
pub async fn kakao_signin(
    State(state): State<Arc<AppState>>,
    Json(body): Json<KakaoSignInDTO>, // JSON body
) -> Result<impl IntoResponse, AppError> {
    // 1. Chiedere il profilo a Kakao con l'access token del client
    // 2. L'email è obbligatoria: senza consenso email non possiamo creare l'account
    // 3. Se l'utente esiste già, è un login; altrimenti creiamo l'account
    //    con una password casuale (mai usata) e un nickname disponibile
    // 4. Stessa risposta del signin classico (cookie + Authorization)
    let resp = state
        .http_client
        .get(&state.config.kakao_userinfo_url)
        .header("Authorization", format!("Bearer {}", body.access_token))
        .send()
        .await?;

    if !resp.status().is_success() {
        warn!(status = resp.status().as_u16(), "Kakao userinfo call rejected");
        return Err(AppError::unauthorized("Kakao token was rejected"));
    }

    let kakao_user: KakaoUserInfo = resp.json().await?;
    debug!(kakao_id = kakao_user.id, "Kakao profile received");

    let account = kakao_user.kakao_account.unwrap_or(KakaoAccount {
        email: None,
        profile: None,
    });

    let email = account.email.ok_or_else(|| {
        AppError::bad_request("Kakao account did not share an email address")
    })?;

    let user = match state.user.find_by_email(&email).await? {
        Some(user) if user.is_active => user,
        Some(_) => return Err(AppError::unauthorized("This account is not active")),
        None => {
            let kakao_nickname = account.profile.and_then(|p| p.nickname);
            let nickname = available_nickname(&state, kakao_nickname).await?;

            // password casuale: l'accesso passa sempre da Kakao
            let password_hash =
                crate::entities::User::hash_password(&uuid::Uuid::new_v4().to_string())
                    .map_err(|_| AppError::internal_server_error("Failed to hash password"))?;

            let created = state
                .user
                .create(&CreateUserDTO {
                    email,
                    nickname,
                    password: password_hash,
                    age: None,
                    gender: None,
                    is_vegetarian: false,
                    is_vegan: false,
                    // l'email arriva già verificata dal provider
                    email_verified: true,
                })
                .await?;

            info!(user_id = created.user_id, "User created from Kakao profile");
            created
        }
    };

    let token = encode_jwt(user.email, user.user_id, &state.jwt_secret)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        "Set-Cookie",
        HeaderValue::from_str(&auth_cookie(&token))
            .map_err(|_| AppError::internal_server_error("Invalid cookie value"))?,
    );
    headers.insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AppError::internal_server_error("Invalid header value"))?,
    );

    Ok((
        StatusCode::OK,
        headers,
        Json(json!({
            "detail": "Signed in successfully",
            "nickname": user.nickname,
        })),
    ))
}

/// Sceglie un nickname libero: quello di Kakao se valido, altrimenti una
/// coppia prefisso+suffisso dalle tabelle di parole, altrimenti un ripiego
/// derivato dall'orologio. Qualche collisione va tollerata, quindi proviamo
/// una manciata di combinazioni.
async fn available_nickname(
    state: &Arc<AppState>,
    kakao_nickname: Option<String>,
) -> Result<String, AppError> {
    if let Some(nickname) = kakao_nickname {
        let nickname = nickname.trim().to_string();
        if crate::dtos::user::nickname_is_valid(&nickname)
            && state.user.find_by_nickname(&nickname).await?.is_none()
        {
            return Ok(nickname);
        }
    }

    for _ in 0..5 {
        if let Some((prefix, suffix)) = state.user.random_nickname_words().await? {
            let candidate: String = format!("{prefix}-{suffix}").chars().take(20).collect();
            if state.user.find_by_nickname(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        } else {
            break;
        }
    }

    // ripiego: "user" + timestamp troncato a 20 caratteri
    let fallback: String = format!("user{}", Utc::now().timestamp())
        .chars()
        .take(20)
        .collect();
    Ok(fallback)
}

// ------- verifica email -------

#[instrument(skip(state))]
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>, // parametro dalla URL /verify-email/{token}
) -> Result<impl IntoResponse, AppError> {
    // 1. Il token deve esistere ed essere entro le 24 ore di validità
    // 2. Token scaduto: lo rimuoviamo e rispondiamo come se non esistesse
    // 3. Token valido: marchiamo l'email verificata e consumiamo il token
    let record = state
        .email
        .read_token(&token)
        .await?
        .ok_or_else(|| AppError::not_found("Verification token not found"))?;

    if record.is_expired(Utc::now()) {
        warn!("Expired verification token used");
        state.email.delete_token(&token).await?;
        return Err(AppError::not_found("Verification token not found"));
    }

    state.user.mark_email_verified(&record.user_id).await?;
    state.email.delete_token(&token).await?;

    info!(user_id = record.user_id, "Email verified");

    Ok((StatusCode::OK, Json(json!({ "detail": "Email verified" }))))
}
