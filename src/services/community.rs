//! Community services - Post, commenti annidati e segnalazioni
//!
//! La lettura è aperta a tutti, la scrittura richiede l'autenticazione e le
//! modifiche passano il controllo autore-o-admin.

use crate::core::auth::require_author_or_admin;
use crate::core::{AppError, AppState};
use crate::dtos::{
    AuthorDTO, CommentDTO, CreateCommentDTO, CreatePostDTO, CreateReportDTO, PageQuery,
    PaginatedPostsDTO, PostDTO, UpdateCommentDTO, UpdatePostDTO,
};
use crate::entities::{Comment, Post, User};
use crate::repositories::{Create, Delete, Read, Update};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_macros::debug_handler;
use futures_util::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Risolve gli autori (post + commenti) in una mappa id -> AuthorDTO.
/// Letture per chiave primaria in parallelo, poi join in memoria.
async fn load_authors(
    state: &Arc<AppState>,
    author_ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, AuthorDTO>, AppError> {
    let mut unique_ids: Vec<i32> = author_ids.into_iter().collect();
    unique_ids.sort_unstable();
    unique_ids.dedup();

    let users = try_join_all(unique_ids.into_iter().map(|uid| {
        let state = state.clone();
        async move { state.user.read(&uid).await }
    }))
    .await?;

    Ok(users
        .into_iter()
        .flatten()
        .map(|user| (user.user_id, AuthorDTO::from(user)))
        .collect())
}

fn comments_to_dtos(comments: Vec<Comment>, authors: &HashMap<i32, AuthorDTO>) -> Vec<CommentDTO> {
    comments
        .into_iter()
        .filter_map(|comment| {
            authors
                .get(&comment.author_id)
                .cloned()
                .map(|author| CommentDTO::from((comment, author)))
        })
        .collect()
}

/// Costruisce il DTO completo di un post (autore + commenti annidati)
async fn build_post_dto(state: &Arc<AppState>, post: Post) -> Result<PostDTO, AppError> {
    let comments = state.comment.find_many_by_post_id(&post.post_id).await?;

    let author_ids = comments
        .iter()
        .map(|c| c.author_id)
        .chain(std::iter::once(post.author_id));
    let authors = load_authors(state, author_ids).await?;

    let author = authors
        .get(&post.author_id)
        .cloned()
        .ok_or_else(|| AppError::internal_server_error("Post author missing"))?;

    let comment_dtos = comments_to_dtos(comments, &authors);

    Ok(PostDTO::from((post, author, comment_dtos)))
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageQuery>, // query params ?page=2&page_size=20
) -> Result<Json<PaginatedPostsDTO>, AppError> {
    // 1. Normalizzare page/page_size (default 10, cap 50)
    // 2. Contare il totale e leggere la pagina richiesta, dal più recente
    // 3. Comporre i DTO con autori e commenti
    // 4. Calcolare i numeri di pagina next/previous
    let (page, page_size) = params.normalized();
    let offset = i64::from((page - 1) * page_size);

    let count = state.post.count().await?;
    let posts = state.post.find_page(offset, i64::from(page_size)).await?;

    debug!(page, page_size, count, "Listing posts");

    let mut results = Vec::with_capacity(posts.len());
    for post in posts {
        results.push(build_post_dto(&state, post).await?);
    }

    // NB: `i64::div_ceil` is still unstable on this toolchain (feature
    // `int_roundings`), so use the equivalent ceiling-division arithmetic.
    // `count` is a non-negative COUNT(*) and `page_size >= 1`, so this
    // matches `div_ceil` exactly over the valid input domain.
    let page_size_i64 = i64::from(page_size);
    let total_pages = ((count + page_size_i64 - 1) / page_size_i64) as u32;
    let next = (page < total_pages).then(|| page + 1);
    let previous = (page > 1).then(|| page - 1);

    Ok(Json(PaginatedPostsDTO {
        count,
        next,
        previous,
        results,
    }))
}

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione tramite token jwt
    Json(body): Json<CreatePostDTO>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;

    let created = state.post.create(&(body, current_user.user_id)).await?;
    info!(post_id = created.post_id, "Post created");

    let dto = build_post_dto(&state, created).await?;
    Ok((StatusCode::CREATED, Json(dto)))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>, // parametro dalla URL /community/{post_id}
) -> Result<Json<PostDTO>, AppError> {
    let post = state
        .post
        .read(&post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;

    let dto = build_post_dto(&state, post).await?;
    Ok(Json(dto))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>,
    Extension(current_user): Extension<User>,
    Json(body): Json<UpdatePostDTO>,
) -> Result<Json<PostDTO>, AppError> {
    // 1. Il post deve esistere (404)
    // 2. Solo l'autore o un admin possono modificarlo (403)
    // 3. Update parziale dei campi forniti
    let post = state
        .post
        .read(&post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;

    require_author_or_admin(&current_user, post.author_id)?;

    body.validate()?;

    let updated = state.post.update(&post_id, &body).await?;
    info!(post_id, "Post updated");

    let dto = build_post_dto(&state, updated).await?;
    Ok(Json(dto))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<impl IntoResponse, AppError> {
    let post = state
        .post
        .read(&post_id)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;

    require_author_or_admin(&current_user, post.author_id)?;

    state.post.delete(&post_id).await?;
    info!(post_id, "Post deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ------- commenti -------

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateCommentDTO>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Il post deve esistere (404)
    // 2. Un'eventuale risposta deve puntare a un commento dello stesso post (400)
    // 3. Creare il commento e ritornare 201
    if state.post.read(&post_id).await?.is_none() {
        return Err(AppError::not_found("Post not found"));
    }

    body.validate()?;

    if let Some(parent_id) = body.parent_id {
        match state.comment.read(&parent_id).await? {
            Some(parent) if parent.post_id == post_id => {}
            Some(_) => {
                warn!("Reply attempted to a comment of another post");
                return Err(AppError::bad_request("Parent comment belongs to another post"));
            }
            None => return Err(AppError::bad_request("Parent comment not found")),
        }
    }

    let created = state
        .comment
        .create(&(body, post_id, current_user.user_id))
        .await?;
    info!(comment_id = created.comment_id, "Comment created");

    let author = AuthorDTO::from(current_user);
    Ok((StatusCode::CREATED, Json(CommentDTO::from((created, author)))))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<i32>,
    Extension(current_user): Extension<User>,
    Json(body): Json<UpdateCommentDTO>,
) -> Result<Json<CommentDTO>, AppError> {
    let comment = state
        .comment
        .read(&comment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment not found"))?;

    require_author_or_admin(&current_user, comment.author_id)?;

    body.validate()?;

    let updated = state.comment.update(&comment_id, &body).await?;
    info!(comment_id, "Comment updated");

    let authors = load_authors(&state, [updated.author_id]).await?;
    let author = authors
        .get(&updated.author_id)
        .cloned()
        .ok_or_else(|| AppError::internal_server_error("Comment author missing"))?;

    Ok(Json(CommentDTO::from((updated, author))))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path(comment_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<impl IntoResponse, AppError> {
    let comment = state
        .comment
        .read(&comment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Comment not found"))?;

    require_author_or_admin(&current_user, comment.author_id)?;

    state.comment.delete(&comment_id).await?;
    info!(comment_id, "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ------- segnalazioni -------

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn report_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<i32>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateReportDTO>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Il post deve esistere (404)
    // 2. Una sola segnalazione per utente per post (409)
    if state.post.read(&post_id).await?.is_none() {
        return Err(AppError::not_found("Post not found"));
    }

    if state.report.exists_for(&post_id, &current_user.user_id).await? {
        warn!("Duplicate report attempted");
        return Err(AppError::conflict("You already reported this post"));
    }

    let created = state
        .report
        .create(&(body, post_id, current_user.user_id))
        .await?;
    info!(report_id = created.report_id, "Post reported");

    Ok((StatusCode::CREATED, Json(created)))
}
