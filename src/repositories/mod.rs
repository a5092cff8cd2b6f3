//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Ogni repository gestisce le operazioni di database per una specifica
//! entità sopra lo stesso pool di connessioni MySQL. Le query usano le
//! macro `query!`/`query_as!` di sqlx così lo schema viene controllato in
//! fase di compilazione contro le migrations.

pub mod comment;
pub mod email;
pub mod image;
pub mod message;
pub mod post;
pub mod question;
pub mod recipe;
pub mod report;
pub mod room;
pub mod traits;
pub mod user;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{Create, Delete, Read, Update};

// Re-esportazione delle struct dei repository per facilitare l'import
pub use comment::CommentRepository;
pub use email::EmailRepository;
pub use image::ImageRepository;
pub use message::ChatMessageRepository;
pub use post::PostRepository;
pub use question::QuestionRepository;
pub use recipe::RecipeRepository;
pub use report::ReportRepository;
pub use room::ChatRoomRepository;
pub use user::UserRepository;
