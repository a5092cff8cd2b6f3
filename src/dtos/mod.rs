//! DTOs module - Strutture di input/output verso il client
//!
//! Le entities rispecchiano il database, i DTO la superficie JSON: la
//! password non esce mai, il ruolo esce nella forma leggibile.

pub mod chatbot;
pub mod community;
pub mod livechat;
pub mod user;
pub mod ws_event;

// Re-exports per facilitare l'import
pub use chatbot::{ChatbotRequestDTO, ChatbotResponseDTO, RecipeDTO};
pub use community::{
    AuthorDTO, CommentDTO, CreateCommentDTO, CreatePostDTO, CreateReportDTO, PageQuery,
    PaginatedPostsDTO, PostDTO, UpdateCommentDTO, UpdatePostDTO, UploadResponseDTO,
};
pub use livechat::{ChatMessageDTO, ChatRoomDTO, CreateChatMessageDTO, CreateChatRoomDTO};
pub use user::{
    CreateEmailMessageDTO, CreateUserDTO, KakaoSignInDTO, PasswordChangeDTO, ProfileDTO,
    ProfileUpdateDTO, RegisteredUserDTO, SignInDTO, SignUpDTO,
};
pub use ws_event::{ClientFrame, ServerFrame};
