//! Server library - espone i moduli principali per i test

pub mod chatbot;
pub mod core;
pub mod dtos;
pub mod entities;
pub mod monitoring;
pub mod repositories;
pub mod services;
pub mod ws;

// Re-export dei tipi principali per facilitare l'import
// (path espliciti con crate:: per non collidere con il crate `core` di Rust)
pub use crate::core::{AppError, AppState, auth, config};
pub use crate::services::root;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware, routing::{any, delete, get, patch, post}};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Limite del body delle richieste: deve bastare per gli upload di immagini
/// (8 MB) più l'overhead del multipart
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    use crate::core::authentication_middleware;
    use ws::{chatbot_ws_handler, room_ws_handler};

    let cors = cors_layer(&state);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1/accounts", configure_account_routes(state.clone()))
        .nest("/api/v1/community", configure_community_routes(state.clone()))
        .nest("/api/v1/livechat", configure_livechat_routes(state.clone()))
        .nest("/api/v1", configure_chatbot_routes(state.clone()))
        .route(
            "/ws/chat/{room_id}",
            any(room_ws_handler).layer(middleware::from_fn_with_state(
                state.clone(),
                authentication_middleware,
            )),
        )
        .route(
            "/ws/chatbot",
            any(chatbot_ws_handler).layer(middleware::from_fn_with_state(
                state.clone(),
                authentication_middleware,
            )),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .with_state(state)
}

/// CORS per il frontend: origini dalla configurazione, credenziali ammesse
/// (il token di sessione viaggia in un cookie)
fn cors_layer(state: &Arc<AppState>) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .front_domains
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Routes accounts: signup/signin/social/verifica sono pubbliche, il resto
/// richiede l'autenticazione
fn configure_account_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    let public_routes = Router::new()
        .route("/", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/kakao", post(kakao_signin))
        .route("/verify-email/{token}", get(verify_email));

    let private_routes = Router::new()
        .route("/profile", get(get_profile).patch(update_profile))
        .route("/password", post(change_password))
        .route("/me", delete(delete_my_account))
        .route("/emails", post(create_email_message))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    public_routes.merge(private_routes)
}

/// Routes community: lettura aperta, scrittura autenticata
fn configure_community_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    let public_routes = Router::new()
        .route("/", get(list_posts))
        .route("/{post_id}", get(get_post));

    let private_routes = Router::new()
        .route("/", post(create_post))
        .route("/{post_id}", patch(update_post).delete(delete_post))
        .route("/{post_id}/comment", post(create_comment))
        .route("/{post_id}/report", post(report_post))
        .route("/comment/{comment_id}", patch(update_comment).delete(delete_comment))
        .route("/upload-image", post(upload_image))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    public_routes.merge(private_routes)
}

/// Routes livechat: la lista stanze è aperta, il resto autenticato
fn configure_livechat_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    let public_routes = Router::new().route("/chatrooms", get(list_rooms));

    let private_routes = Router::new()
        .route("/chatrooms", post(create_room))
        .route("/chatrooms/{room_id}", delete(delete_room))
        .route(
            "/chatrooms/{room_id}/messages",
            get(list_room_messages).post(create_room_message),
        )
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    public_routes.merge(private_routes)
}

/// Routes chatbot: tutte autenticate, le ricette sono riservate allo staff
fn configure_chatbot_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/chatbot", post(ask_chatbot))
        .route("/recipes", get(list_recipes).post(upload_recipe))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}
