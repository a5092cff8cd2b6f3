//! Chatbot services - Endpoint REST della pipeline RAG e gestione ricette
//!
//! La conversazione continuativa passa da `/ws/chatbot`; l'endpoint REST
//! serve le integrazioni a turno singolo. Prima di rispondere vengono
//! indicizzati gli eventuali CSV di ricette in attesa.

use crate::chatbot::ingest::embed_pending;
use crate::chatbot::pipeline::ask;
use crate::core::auth::require_staff;
use crate::core::{AppError, AppState};
use crate::dtos::{ChatbotRequestDTO, ChatbotResponseDTO, ProfileDTO, RecipeDTO};
use crate::entities::User;
use crate::repositories::question::CreateQuestion;
use crate::repositories::Create;
use crate::services::upload::store_media_file;
use axum::{
    Extension,
    extract::{Json, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn ask_chatbot(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione tramite token jwt
    Json(body): Json<ChatbotRequestDTO>,
) -> Result<Json<ChatbotResponseDTO>, AppError> {
    // 1. Validare la domanda (1-255 caratteri)
    // 2. Persistere la domanda
    // 3. Indicizzare i CSV di ricette ancora in attesa
    // 4. Pipeline RAG con il profilo dell'utente, senza storia (turno singolo)
    body.validate()?;

    state
        .question
        .create(&CreateQuestion {
            question: body.question.clone(),
            user_id: current_user.user_id,
        })
        .await?;

    let store = state.vector_store().await?;

    let embedded = embed_pending(&state.recipe, store, &state.http_client, &state.config.llm).await?;
    if embedded > 0 {
        info!(recipes = embedded, "Pending recipes indexed before answering");
    }

    let allergies = state.user.get_allergies(&current_user.user_id).await?;
    let cuisines = state.user.get_preferred_cuisines(&current_user.user_id).await?;
    let profile = ProfileDTO::from((current_user, allergies, cuisines));
    let user_data = serde_json::to_string(&profile).unwrap_or_default();

    let answer = ask(
        &state.http_client,
        &state.config.llm,
        store,
        &body.question,
        &user_data,
        &[],
    )
    .await?;

    Ok(Json(ChatbotResponseDTO { answer }))
}

// ------- gestione ricette (solo staff) -------

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<RecipeDTO>>, AppError> {
    require_staff(&current_user)?;

    let recipes = state.recipe.find_all().await?;
    let recipes_dto: Vec<RecipeDTO> = recipes.into_iter().map(RecipeDTO::from).collect();
    Ok(Json(recipes_dto))
}

#[instrument(skip(state, current_user, multipart), fields(user_id = %current_user.user_id))]
pub async fn upload_recipe(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    // 1. Solo lo staff carica ricette
    // 2. Cercare il campo "csv_file" nel multipart
    // 3. Salvare il CSV sotto media e registrare la ricetta da indicizzare
    //    (l'indicizzazione avverrà alla prossima domanda)
    require_staff(&current_user)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::bad_request("Malformed multipart body"))?
    {
        if field.name() != Some("csv_file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("recipes.csv").to_string();
        if !filename.to_ascii_lowercase().ends_with(".csv") {
            warn!("Recipe upload rejected: {filename:?} is not a CSV");
            return Err(AppError::bad_request("Recipe file must be a CSV"));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Failed to read uploaded file"))?;

        if bytes.is_empty() {
            return Err(AppError::bad_request("Uploaded file is empty"));
        }

        let public_path = store_media_file(&state, "csv_file", "csv", &bytes).await?;

        // il path su disco (non l'URL) è ciò che l'ingestione rilegge
        let disk_path = format!(
            "{}/{}",
            state.config.media_root,
            public_path.trim_start_matches(&state.config.media_url)
        );

        let created = state.recipe.create(&disk_path).await?;
        info!(recipe_id = created.recipe_id, "Recipe CSV uploaded");

        return Ok((StatusCode::CREATED, Json(RecipeDTO::from(created))));
    }

    Err(AppError::bad_request("Missing csv_file field"))
}
