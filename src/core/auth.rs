use crate::core::{AppError, AppState};
use crate::entities::User;
use crate::repositories::Read;
use axum::extract::State;
use axum::{Error, body::Body, extract::Request, http, http::Response, middleware::Next};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Durata del token (e del cookie che lo trasporta)
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

// struct che codifica il contenuto del token jwt
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
    pub id: i32,
    pub email: String,
}

#[instrument(skip(secret), fields(email = %email, id = %id))]
pub fn encode_jwt(email: String, id: i32, secret: &str) -> Result<String, Error> {
    debug!("Encoding JWT token for user");
    let now = Utc::now();
    let expire = Duration::hours(TOKEN_LIFETIME_HOURS);
    let exp: usize = (now + expire).timestamp() as usize;
    let iat: usize = now.timestamp() as usize;
    let claim = Claims {
        iat,
        exp,
        email,
        id,
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| {
        error!("Failed to encode JWT token: {:?}", e);
        Error::new("Error in encoding jwt token")
    })
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(jwt_token: &str, secret: &str) -> Result<TokenData<Claims>, Error> {
    debug!("Decoding JWT token");
    decode(
        jwt_token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Failed to decode JWT token: {:?}", e);
        Error::new("Error in decoding jwt token")
    })
}

/// Estrae il token dalla richiesta: prima l'header Authorization (Bearer),
/// poi il cookie "token". Il cookie serve all'handshake WebSocket del
/// browser, che non può impostare header custom.
fn extract_token(req: &Request) -> Option<String> {
    if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
        let value = auth_header.to_str().ok()?;
        let mut parts = value.split_whitespace();
        if let (Some("Bearer"), Some(token)) = (parts.next(), parts.next()) {
            return Some(token.to_string());
        }
    }

    let cookies = req.headers().get(http::header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == "token").then(|| value.to_string())
    })
}

#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");

    let token = extract_token(&req).ok_or_else(|| {
        warn!("Missing credentials in Authorization header and cookies");
        AppError::forbidden("Please sign in first")
    })?;

    let token_data = match decode_jwt(&token, &state.jwt_secret) {
        Ok(data) => data,
        Err(_) => {
            warn!("Failed to decode JWT token");
            return Err(AppError::unauthorized("Unable to decode token"));
        }
    };

    // Fetch the user details from the database
    let current_user = match state.user.read(&token_data.claims.id).await? {
        Some(user) if user.is_active => {
            info!("User authenticated: {}", user.nickname);
            user
        }
        Some(_) => {
            warn!("Authentication attempt for deactivated account");
            return Err(AppError::unauthorized("This account is not active"));
        }
        None => {
            warn!("User not found in database: {}", token_data.claims.email);
            return Err(AppError::unauthorized("You are not an authorized user"));
        }
    };
    req.extensions_mut().insert(current_user);
    Ok(next.run(req).await)
}

/// Helper per gli endpoint riservati allo staff (ricette, email in blocco)
#[instrument(skip(user))]
pub fn require_staff(user: &User) -> Result<(), AppError> {
    if !user.role.is_staff() {
        warn!(
            "User {} with role {:?} attempted a staff-only action",
            user.user_id, user.role
        );
        return Err(AppError::forbidden("Staff role required"));
    }
    Ok(())
}

/// Helper per le azioni su risorse con autore: passa l'autore o un admin
#[instrument(skip(user))]
pub fn require_author_or_admin(user: &User, author_id: i32) -> Result<(), AppError> {
    if user.user_id != author_id && user.role != crate::entities::UserRole::Admin {
        warn!(
            "User {} is neither the author {} nor an admin",
            user.user_id, author_id
        );
        return Err(AppError::forbidden("Only the author can modify this resource"));
    }
    Ok(())
}

/// Cookie di sessione con il token jwt
pub fn auth_cookie(token: &str) -> String {
    format!(
        "token={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        token,
        TOKEN_LIFETIME_HOURS * 60 * 60
    )
}

/// Cookie che forza il logout lato client
pub fn clear_auth_cookie() -> &'static str {
    "token=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0"
}
