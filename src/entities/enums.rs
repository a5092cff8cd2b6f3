use serde::{Deserialize, Serialize};

// ********************* ENUMERAZIONI UTILI **********************//

/// Ruolo applicativo dell'utente, salvato come codice a un carattere
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::Type)]
#[sqlx(type_name = "role")]
pub enum UserRole {
    #[serde(rename = "A")]
    #[sqlx(rename = "A")]
    Admin,
    #[serde(rename = "S")]
    #[sqlx(rename = "S")]
    Staff,
    #[serde(rename = "U")]
    #[sqlx(rename = "U")]
    User,
}

impl UserRole {
    /// Forma leggibile mostrata nelle risposte API
    pub fn display(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Staff => "STAFF",
            UserRole::User => "USER",
        }
    }

    /// Ruoli che possono gestire le ricette e le email amministrative
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Staff)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::Type)]
#[sqlx(type_name = "gender")]
pub enum Gender {
    M,
    F,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::Type)]
#[sqlx(type_name = "reason", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportReason {
    Spam,
    Abuse,
    Adult,
    Other,
}
