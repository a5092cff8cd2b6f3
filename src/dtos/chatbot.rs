//! Chatbot DTOs - Richiesta/risposta REST e ricette caricate

use crate::entities::Recipe;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Deserialize, Debug, Validate)]
pub struct ChatbotRequestDTO {
    #[validate(length(min = 1, max = 255, message = "Question must be 1-255 characters"))]
    pub question: String,
}

#[derive(Serialize, Debug)]
pub struct ChatbotResponseDTO {
    pub answer: String,
}

#[derive(Serialize, Debug)]
pub struct RecipeDTO {
    pub id: i32,
    pub csv_path: String,
    pub is_embedded: bool,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Recipe> for RecipeDTO {
    fn from(value: Recipe) -> Self {
        Self {
            id: value.recipe_id,
            csv_path: value.csv_path,
            is_embedded: value.is_embedded,
            uploaded_at: value.uploaded_at,
        }
    }
}
