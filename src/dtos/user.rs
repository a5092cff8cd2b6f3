//! User DTOs - Data Transfer Objects per registrazione, login e profilo

use crate::entities::{Allergy, Gender, PreferredCuisine, User};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    // lettere e cifre unicode (hangul compreso), trattino e underscore
    static ref NICKNAME_RE: Regex = Regex::new(r"^[\w\-]{2,20}$").unwrap();
}

/// Regole sul formato del nickname, condivise tra signup, update profilo
/// e login social
pub fn nickname_is_valid(nickname: &str) -> bool {
    NICKNAME_RE.is_match(nickname)
}

/// DTO di registrazione. La conferma password viene confrontata qui,
/// prima di qualunque accesso al database.
#[derive(Deserialize, Debug, Validate)]
pub struct SignUpDTO {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub password_confirm: String,

    #[validate(length(min = 2, max = 20, message = "Nickname must be 2-20 characters"))]
    pub nickname: String,

    pub age: Option<i32>,
    pub gender: Option<Gender>,

    #[serde(default)]
    pub is_vegetarian: bool,
    #[serde(default)]
    pub is_vegan: bool,
}

#[derive(Deserialize, Debug)]
pub struct SignInDTO {
    pub email: String,
    pub password: String,
}

/// Body del login social: il client ha già ottenuto l'access token da Kakao
#[derive(Deserialize, Debug)]
pub struct KakaoSignInDTO {
    pub access_token: String,
}

#[derive(Deserialize, Debug, Validate)]
pub struct PasswordChangeDTO {
    pub old_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,

    #[validate(must_match(other = "new_password", message = "Passwords do not match"))]
    pub new_password_confirm: String,
}

/// Update parziale del profilo: solo i campi presenti vengono toccati
#[derive(Deserialize, Debug, Validate, Default)]
pub struct ProfileUpdateDTO {
    #[validate(length(min = 2, max = 20, message = "Nickname must be 2-20 characters"))]
    pub nickname: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub is_vegetarian: Option<bool>,
    pub is_vegan: Option<bool>,
    /// Sostituisce l'elenco di allergie dell'utente
    pub allergy_ids: Option<Vec<i32>>,
    /// Sostituisce l'elenco di cucine preferite
    pub preferred_cuisine_ids: Option<Vec<i32>>,
}

/// DTO interno di inserimento utente: la password qui è già l'hash bcrypt
#[derive(Debug, Clone)]
pub struct CreateUserDTO {
    pub email: String,
    pub nickname: String,
    pub password: String,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    /// true per i login social, dove l'email arriva già verificata dal provider
    pub email_verified: bool,
}

/// Risposta alla registrazione: il ruolo esce nella forma leggibile
#[derive(Serialize, Debug)]
pub struct RegisteredUserDTO {
    pub id: i32,
    pub email: String,
    pub nickname: String,
    pub role: &'static str,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
}

impl From<User> for RegisteredUserDTO {
    fn from(value: User) -> Self {
        Self {
            id: value.user_id,
            email: value.email,
            nickname: value.nickname,
            role: value.role.display(),
            age: value.age,
            gender: value.gender,
        }
    }
}

/// Profilo completo dell'utente autenticato; è anche la rappresentazione
/// passata al chatbot come user_data
#[derive(Serialize, Debug)]
pub struct ProfileDTO {
    pub id: i32,
    pub email: String,
    pub nickname: String,
    pub role: &'static str,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub email_verified: bool,
    pub allergies: Vec<String>,
    pub preferred_cuisines: Vec<String>,
}

impl From<(User, Vec<Allergy>, Vec<PreferredCuisine>)> for ProfileDTO {
    fn from(value: (User, Vec<Allergy>, Vec<PreferredCuisine>)) -> Self {
        let (user, allergies, cuisines) = value;
        Self {
            id: user.user_id,
            email: user.email,
            nickname: user.nickname,
            role: user.role.display(),
            age: user.age,
            gender: user.gender,
            is_vegetarian: user.is_vegetarian,
            is_vegan: user.is_vegan,
            email_verified: user.email_verified,
            allergies: allergies.into_iter().map(|a| a.name).collect(),
            preferred_cuisines: cuisines.into_iter().map(|c| c.name).collect(),
        }
    }
}

/// Email amministrativa da inviare in blocco (solo ruolo ADMIN)
#[derive(Deserialize, Debug, Validate)]
pub struct CreateEmailMessageDTO {
    #[validate(length(min = 1, max = 127, message = "Subject must be 1-127 characters"))]
    pub subject: String,

    #[validate(length(min = 1, message = "Message body is required"))]
    pub message: String,

    #[validate(length(min = 1, message = "At least one recipient is required"))]
    pub recipient_ids: Vec<i32>,
}
