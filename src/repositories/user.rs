//! UserRepository - Repository per la gestione degli utenti e del profilo

use super::{Create, Delete, Read, Update};
use crate::dtos::{CreateUserDTO, ProfileUpdateDTO};
use crate::entities::{Allergy, Gender, PreferredCuisine, User, UserRole};
use sqlx::{Error, MySqlPool};

pub struct UserRepository {
    connection_pool: MySqlPool,
}

impl UserRepository {
    pub fn new(connection_pool: MySqlPool) -> UserRepository {
        Self { connection_pool }
    }

    /// L'email è l'identificativo di login, quindi univoca
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as!(
            User,
            r#"
            SELECT
                user_id, email, nickname, password, age,
                gender as "gender: Gender",
                role as "role: UserRole",
                is_vegetarian as "is_vegetarian: bool",
                is_vegan as "is_vegan: bool",
                email_verified as "email_verified: bool",
                is_active as "is_active: bool",
                created_at
            FROM users WHERE email = ?
            "#,
            email
        )
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as!(
            User,
            r#"
            SELECT
                user_id, email, nickname, password, age,
                gender as "gender: Gender",
                role as "role: UserRole",
                is_vegetarian as "is_vegetarian: bool",
                is_vegan as "is_vegan: bool",
                email_verified as "email_verified: bool",
                is_active as "is_active: bool",
                created_at
            FROM users WHERE nickname = ?
            "#,
            nickname
        )
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    pub async fn update_password(&self, user_id: &i32, password_hash: &str) -> Result<(), Error> {
        sqlx::query!(
            "UPDATE users SET password = ? WHERE user_id = ?",
            password_hash,
            user_id
        )
        .execute(&self.connection_pool)
        .await?;

        Ok(())
    }

    pub async fn mark_email_verified(&self, user_id: &i32) -> Result<(), Error> {
        sqlx::query!(
            "UPDATE users SET email_verified = TRUE WHERE user_id = ?",
            user_id
        )
        .execute(&self.connection_pool)
        .await?;

        Ok(())
    }

    // ------- profilo alimentare (M2M) -------

    pub async fn get_allergies(&self, user_id: &i32) -> Result<Vec<Allergy>, Error> {
        let allergies = sqlx::query_as!(
            Allergy,
            r#"
            SELECT a.allergy_id, a.name
            FROM allergies a
            JOIN user_allergies ua ON ua.allergy_id = a.allergy_id
            WHERE ua.user_id = ?
            ORDER BY a.name
            "#,
            user_id
        )
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(allergies)
    }

    pub async fn get_preferred_cuisines(
        &self,
        user_id: &i32,
    ) -> Result<Vec<PreferredCuisine>, Error> {
        let cuisines = sqlx::query_as!(
            PreferredCuisine,
            r#"
            SELECT c.cuisine_id, c.name
            FROM preferred_cuisines c
            JOIN user_preferred_cuisines uc ON uc.cuisine_id = c.cuisine_id
            WHERE uc.user_id = ?
            ORDER BY c.name
            "#,
            user_id
        )
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(cuisines)
    }

    /// Sostituisce per intero l'elenco allergie dell'utente (delete + insert
    /// in transazione). Id inesistenti falliscono per vincolo di FK.
    pub async fn set_allergies(&self, user_id: &i32, allergy_ids: &[i32]) -> Result<(), Error> {
        let mut tx = self.connection_pool.begin().await?;

        sqlx::query!("DELETE FROM user_allergies WHERE user_id = ?", user_id)
            .execute(&mut *tx)
            .await?;

        for allergy_id in allergy_ids {
            sqlx::query!(
                "INSERT INTO user_allergies (user_id, allergy_id) VALUES (?, ?)",
                user_id,
                allergy_id
            )
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn set_preferred_cuisines(
        &self,
        user_id: &i32,
        cuisine_ids: &[i32],
    ) -> Result<(), Error> {
        let mut tx = self.connection_pool.begin().await?;

        sqlx::query!(
            "DELETE FROM user_preferred_cuisines WHERE user_id = ?",
            user_id
        )
        .execute(&mut *tx)
        .await?;

        for cuisine_id in cuisine_ids {
            sqlx::query!(
                "INSERT INTO user_preferred_cuisines (user_id, cuisine_id) VALUES (?, ?)",
                user_id,
                cuisine_id
            )
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Pesca una coppia prefisso+suffisso casuale dalle tabelle di parole
    /// per coniare un nickname ai login social senza nickname
    pub async fn random_nickname_words(&self) -> Result<Option<(String, String)>, Error> {
        let prefix = sqlx::query!("SELECT word FROM nickname_prefixes ORDER BY RAND() LIMIT 1")
            .fetch_optional(&self.connection_pool)
            .await?;

        let suffix = sqlx::query!("SELECT word FROM nickname_suffixes ORDER BY RAND() LIMIT 1")
            .fetch_optional(&self.connection_pool)
            .await?;

        Ok(match (prefix, suffix) {
            (Some(p), Some(s)) => Some((p.word, s.word)),
            _ => None,
        })
    }
}

impl Create<User, CreateUserDTO> for UserRepository {
    async fn create(&self, data: &CreateUserDTO) -> Result<User, Error> {
        let result = sqlx::query!(
            r#"
            INSERT INTO users
                (email, nickname, password, age, gender, is_vegetarian, is_vegan, email_verified)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            data.email,
            data.nickname,
            data.password,
            data.age,
            data.gender,
            data.is_vegetarian,
            data.is_vegan,
            data.email_verified
        )
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;

        // Rileggiamo la riga per avere i default del database (role, created_at)
        self.read(&new_id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

impl Read<User, i32> for UserRepository {
    async fn read(&self, id: &i32) -> Result<Option<User>, Error> {
        let user = sqlx::query_as!(
            User,
            r#"
            SELECT
                user_id, email, nickname, password, age,
                gender as "gender: Gender",
                role as "role: UserRole",
                is_vegetarian as "is_vegetarian: bool",
                is_vegan as "is_vegan: bool",
                email_verified as "email_verified: bool",
                is_active as "is_active: bool",
                created_at
            FROM users WHERE user_id = ?
            "#,
            id
        )
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }
}

impl Update<User, ProfileUpdateDTO, i32> for UserRepository {
    /// Update parziale: COALESCE lascia invariati i campi non forniti.
    /// Le liste M2M vengono gestite a parte da set_allergies/set_preferred_cuisines.
    async fn update(&self, id: &i32, data: &ProfileUpdateDTO) -> Result<User, Error> {
        sqlx::query!(
            r#"
            UPDATE users SET
                nickname = COALESCE(?, nickname),
                age = COALESCE(?, age),
                gender = COALESCE(?, gender),
                is_vegetarian = COALESCE(?, is_vegetarian),
                is_vegan = COALESCE(?, is_vegan)
            WHERE user_id = ?
            "#,
            data.nickname,
            data.age,
            data.gender,
            data.is_vegetarian,
            data.is_vegan,
            id
        )
        .execute(&self.connection_pool)
        .await?;

        self.read(id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

impl Delete<i32> for UserRepository {
    /// Soft delete: anonimizza l'account preservando i contenuti scritti.
    /// Email e nickname sono univoci, quindi il placeholder incorpora l'id.
    async fn delete(&self, user_id: &i32) -> Result<(), Error> {
        sqlx::query!(
            r#"
            UPDATE users SET
                nickname = CONCAT('deleted#', user_id),
                email = CONCAT('deleted#', user_id, '@deleted.local'),
                password = '',
                is_active = FALSE
            WHERE user_id = ?
            "#,
            user_id
        )
        .execute(&self.connection_pool)
        .await?;

        Ok(())
    }
}
