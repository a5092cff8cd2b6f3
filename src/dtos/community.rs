//! Community DTOs - Post, commenti, segnalazioni, paginazione

use crate::entities::{Comment, Post, ReportReason, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Autore come esposto nelle liste: mai la password, mai il ruolo
#[derive(Serialize, Debug, Clone)]
pub struct AuthorDTO {
    pub id: i32,
    pub email: String,
    pub nickname: String,
}

impl From<User> for AuthorDTO {
    fn from(value: User) -> Self {
        Self {
            id: value.user_id,
            email: value.email,
            nickname: value.nickname,
        }
    }
}

#[derive(Deserialize, Debug, Validate)]
pub struct CreatePostDTO {
    #[validate(length(min = 1, max = 64, message = "Title must be 1-64 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    pub thumbnail: Option<String>,
}

#[derive(Deserialize, Debug, Validate, Default)]
pub struct UpdatePostDTO {
    #[validate(length(min = 1, max = 64, message = "Title must be 1-64 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: Option<String>,

    pub thumbnail: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct CommentDTO {
    pub id: i32,
    pub post_id: i32,
    pub parent_id: Option<i32>,
    pub content: String,
    pub author: AuthorDTO,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<(Comment, AuthorDTO)> for CommentDTO {
    fn from(value: (Comment, AuthorDTO)) -> Self {
        let (comment, author) = value;
        Self {
            id: comment.comment_id,
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            content: comment.content,
            author,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct PostDTO {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub thumbnail: Option<String>,
    pub author: AuthorDTO,
    pub comments: Vec<CommentDTO>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<(Post, AuthorDTO, Vec<CommentDTO>)> for PostDTO {
    fn from(value: (Post, AuthorDTO, Vec<CommentDTO>)) -> Self {
        let (post, author, comments) = value;
        Self {
            id: post.post_id,
            title: post.title,
            content: post.content,
            thumbnail: post.thumbnail,
            author,
            comments,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Query string della lista post: ?page=2&page_size=20
#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageQuery {
    pub const DEFAULT_PAGE_SIZE: u32 = 10;
    pub const MAX_PAGE_SIZE: u32 = 50;

    /// Normalizza page (da 1 in su) e page_size (cap a 50)
    pub fn normalized(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(Self::DEFAULT_PAGE_SIZE)
            .clamp(1, Self::MAX_PAGE_SIZE);
        (page, page_size)
    }
}

/// Pagina di post con numeri di pagina espliciti per next/previous
#[derive(Serialize, Debug)]
pub struct PaginatedPostsDTO {
    pub count: i64,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<PostDTO>,
}

#[derive(Deserialize, Debug, Validate)]
pub struct CreateCommentDTO {
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    /// Commento padre per le risposte annidate, deve stare nello stesso post
    pub parent_id: Option<i32>,
}

#[derive(Deserialize, Debug, Validate)]
pub struct UpdateCommentDTO {
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

#[derive(Deserialize, Debug)]
pub struct CreateReportDTO {
    pub reason: ReportReason,
    pub detail: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct UploadResponseDTO {
    pub file_path: String,
}
