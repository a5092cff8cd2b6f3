//! WebSocket frames - Forme JSON scambiate sui due endpoint ws
//!
//! In ingresso entrambe le socket accettano `{"message": "..."}`; in uscita
//! il frame porta `sender` + `message`, oppure `sender` + `error` quando
//! qualcosa va storto (il mittente degli errori è sempre "system").

use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
pub struct ClientFrame {
    pub message: String,
}

#[derive(Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum ServerFrame {
    Message { sender: String, message: String },
    Error { sender: &'static str, error: String },
}

impl ServerFrame {
    /// Frame di un partecipante umano in una stanza livechat
    pub fn user(nickname: impl Into<String>, message: impl Into<String>) -> Self {
        ServerFrame::Message {
            sender: nickname.into(),
            message: message.into(),
        }
    }

    /// Risposta del chatbot
    pub fn chatbot(message: impl Into<String>) -> Self {
        ServerFrame::Message {
            sender: "chatbot".to_string(),
            message: message.into(),
        }
    }

    pub fn system_error(error: impl Into<String>) -> Self {
        ServerFrame::Error {
            sender: "system",
            error: error.into(),
        }
    }
}
