use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{Gender, UserRole};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub user_id: i32,
    pub email: String,
    pub nickname: String,
    pub password: String,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub role: UserRole,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub email_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    // Verify if target_password matches the stored hashed password
    pub fn verify_password(&self, target_password: &str) -> bool {
        verify(target_password, &self.password).unwrap_or(false)
    }

    pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
        let hash = hash(password, DEFAULT_COST)?;
        Ok(hash)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Allergy {
    pub allergy_id: i32,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PreferredCuisine {
    pub cuisine_id: i32,
    pub name: String,
}

/// Token monouso per la verifica dell'indirizzo email, valido 24 ore
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VerificationToken {
    pub token: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

impl VerificationToken {
    pub const VALIDITY_HOURS: i64 = 24;

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > chrono::Duration::hours(Self::VALIDITY_HOURS)
    }
}

/// Email amministrativa inviata in blocco a più destinatari
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EmailMessage {
    pub email_id: i32,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}
