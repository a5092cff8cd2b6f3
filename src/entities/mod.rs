//! Entities module - Modelli che rispecchiano lo schema del database
//!
//! Ogni struct corrisponde a una tabella; le conversioni verso i DTO
//! esposti al client vivono in `crate::dtos`.

pub mod chatbot;
pub mod community;
pub mod enums;
pub mod livechat;
pub mod user;

// Re-exports per facilitare l'import
pub use chatbot::{Question, Recipe};
pub use community::{Comment, Post, Report, UploadedImage};
pub use enums::{Gender, ReportReason, UserRole};
pub use livechat::{ChatMessage, ChatRoom};
pub use user::{Allergy, EmailMessage, PreferredCuisine, User, VerificationToken};
