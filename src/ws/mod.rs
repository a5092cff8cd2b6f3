//! WebSocket Module - Gestione WebSocket per comunicazione real-time
//!
//! Due endpoint distinti:
//! - `/ws/chat/{room_id}`: stanze livechat, i frame vengono persistiti e
//!   ritrasmessi a tutti i connessi della stessa stanza
//! - `/ws/chatbot`: conversazione isolata per connessione con il chatbot
//!   di ricette (pipeline RAG)
//!
//! L'autenticazione avviene prima dell'upgrade tramite lo stesso middleware
//! JWT delle route REST (il token viaggia nel cookie per i browser).

pub mod chatbot;
pub mod livechat;
pub mod roommap;

pub use chatbot::chatbot_ws_handler;
pub use livechat::room_ws_handler;

/// Capienza dei canali broadcast delle stanze
pub const BROADCAST_CHANNEL_CAPACITY: usize = 64;
/// Intervallo minimo tra messaggi dello stesso client (anti-flood)
pub const RATE_LIMITER_MILLIS: u64 = 300;
/// Una connessione senza frame per questo tempo viene chiusa
pub const TIMEOUT_DURATION_SECONDS: u64 = 600;
