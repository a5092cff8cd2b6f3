//! Upload service - Caricamento immagini nella directory media
//!
//! Il file viene salvato sotto `media/posts/YYYY/MM/DD/<uuid>.<ext>` e la
//! risposta riporta l'URL pubblico. In produzione la directory media sta
//! dietro un bucket/CDN, per questo il prefisso URL è configurabile.

use crate::core::{AppError, AppState};
use crate::dtos::UploadResponseDTO;
use crate::entities::User;
use crate::repositories::Create;
use axum::{
    Extension,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Datelike, Utc};
use std::path::Path as FsPath;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Dimensione massima accettata per un'immagine (8 MB)
const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

fn extension_of(filename: &str) -> Option<String> {
    let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Path relativo datato con nome file casuale: posts/2025/3/27/<uuid>.jpg
fn dated_relative_path(directory: &str, extension: &str) -> String {
    let now = Utc::now();
    format!(
        "{}/{}/{}/{}/{}.{}",
        directory,
        now.year(),
        now.month(),
        now.day(),
        uuid::Uuid::new_v4().simple(),
        extension
    )
}

/// Salva i byte sotto la media root e ritorna l'URL pubblico
pub async fn store_media_file(
    state: &Arc<AppState>,
    directory: &str,
    extension: &str,
    bytes: &[u8],
) -> Result<String, AppError> {
    let relative_path = dated_relative_path(directory, extension);
    let full_path = FsPath::new(&state.config.media_root).join(&relative_path);

    if let Some(parent) = full_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|_| AppError::internal_server_error("Failed to create media directory"))?;
    }

    tokio::fs::write(&full_path, bytes)
        .await
        .map_err(|_| AppError::internal_server_error("Failed to store the file"))?;

    Ok(format!("{}{}", state.config.media_url, relative_path))
}

#[instrument(skip(state, current_user, multipart), fields(user_id = %current_user.user_id))]
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione tramite token jwt
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    // 1. Cercare nel multipart il campo "image" con un filename
    // 2. Estensione ammessa e dimensione sotto il limite (400)
    // 3. Salvare su disco con nome casuale e path datato
    // 4. Registrare l'upload e ritornare 201 con l'URL pubblico
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::bad_request("Malformed multipart body"))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let filename = field
            .file_name()
            .ok_or_else(|| AppError::bad_request("Image field has no filename"))?
            .to_string();

        let extension = extension_of(&filename).ok_or_else(|| {
            warn!("Upload rejected: unsupported extension on {filename:?}");
            AppError::bad_request("Unsupported image format")
        })?;

        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Failed to read uploaded file"))?;

        if bytes.is_empty() {
            return Err(AppError::bad_request("Uploaded file is empty"));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::bad_request("Image is too large"));
        }

        let file_path = store_media_file(&state, "posts", &extension, &bytes).await?;
        state.image.create(&file_path).await?;

        info!(%file_path, "Image uploaded");

        return Ok((
            StatusCode::CREATED,
            axum::Json(UploadResponseDTO { file_path }),
        ));
    }

    Err(AppError::bad_request("Missing image field"))
}
