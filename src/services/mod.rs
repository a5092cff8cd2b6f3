//! Services module - Handler HTTP dell'applicazione
//!
//! Ogni sotto-modulo copre un'area dell'API: accounts, community, livechat,
//! chatbot. Gli handler prendono lo stato e l'utente autenticato (quando la
//! route è dietro il middleware) e parlano con i repository.

pub mod auth;
pub mod chatbot;
pub mod community;
pub mod livechat;
pub mod mail;
pub mod upload;
pub mod user;

pub use auth::{kakao_signin, signin, signout, signup, verify_email};
pub use chatbot::{ask_chatbot, list_recipes, upload_recipe};
pub use community::{
    create_comment, create_post, delete_comment, delete_post, get_post, list_posts, report_post,
    update_comment, update_post,
};
pub use livechat::{
    create_room, create_room_message, delete_room, list_room_messages, list_rooms,
};
pub use upload::upload_image;
pub use user::{change_password, create_email_message, delete_my_account, get_profile, update_profile};

use axum::{Json, response::IntoResponse, response::Response};
use serde_json::json;

pub async fn root() -> Response {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
    .into_response()
}
