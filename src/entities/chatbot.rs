use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File CSV di ricette caricato da uno staff; `is_embedded` indica se le
/// righe sono già state indicizzate nel vector store
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Recipe {
    pub recipe_id: i32,
    pub csv_path: String,
    pub is_embedded: bool,
    pub uploaded_at: DateTime<Utc>,
}

/// Domanda rivolta al chatbot, persistita a ogni turno
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Question {
    pub question_id: i32,
    pub question: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}
