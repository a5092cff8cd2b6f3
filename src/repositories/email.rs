//! EmailRepository - Token di verifica email e email amministrative

use crate::entities::{EmailMessage, VerificationToken};
use sqlx::{Error, MySqlPool};

pub struct EmailRepository {
    connection_pool: MySqlPool,
}

impl EmailRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    // ------- token di verifica -------

    pub async fn create_token(&self, token: &str, user_id: &i32) -> Result<(), Error> {
        sqlx::query!(
            "INSERT INTO email_verification_tokens (token, user_id) VALUES (?, ?)",
            token,
            user_id
        )
        .execute(&self.connection_pool)
        .await?;

        Ok(())
    }

    pub async fn read_token(&self, token: &str) -> Result<Option<VerificationToken>, Error> {
        let row = sqlx::query_as!(
            VerificationToken,
            r#"
            SELECT token, user_id, created_at
            FROM email_verification_tokens WHERE token = ?
            "#,
            token
        )
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(row)
    }

    /// I token sono monouso: vengono rimossi alla verifica (o da scaduti)
    pub async fn delete_token(&self, token: &str) -> Result<(), Error> {
        sqlx::query!(
            "DELETE FROM email_verification_tokens WHERE token = ?",
            token
        )
        .execute(&self.connection_pool)
        .await?;

        Ok(())
    }

    // ------- email amministrative -------

    pub async fn create_message(
        &self,
        subject: &str,
        message: &str,
        recipient_ids: &[i32],
    ) -> Result<EmailMessage, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query!(
            "INSERT INTO email_messages (subject, message) VALUES (?, ?)",
            subject,
            message
        )
        .execute(&mut *tx)
        .await?;

        let email_id = result.last_insert_id() as i32;

        for user_id in recipient_ids {
            sqlx::query!(
                "INSERT INTO email_message_recipients (email_id, user_id) VALUES (?, ?)",
                email_id,
                user_id
            )
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let created = sqlx::query_as!(
            EmailMessage,
            r#"
            SELECT email_id, subject, message, created_at, sent_at
            FROM email_messages WHERE email_id = ?
            "#,
            email_id
        )
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(created)
    }

    pub async fn read_message(&self, email_id: &i32) -> Result<Option<EmailMessage>, Error> {
        let message = sqlx::query_as!(
            EmailMessage,
            r#"
            SELECT email_id, subject, message, created_at, sent_at
            FROM email_messages WHERE email_id = ?
            "#,
            email_id
        )
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(message)
    }

    /// Indirizzi dei destinatari, saltando gli account anonimizzati
    pub async fn recipient_addresses(&self, email_id: &i32) -> Result<Vec<String>, Error> {
        let rows = sqlx::query!(
            r#"
            SELECT u.email
            FROM users u
            JOIN email_message_recipients r ON r.user_id = u.user_id
            WHERE r.email_id = ? AND u.is_active = TRUE
            "#,
            email_id
        )
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.email).collect())
    }

    pub async fn mark_sent(&self, email_id: &i32) -> Result<(), Error> {
        sqlx::query!(
            "UPDATE email_messages SET sent_at = CURRENT_TIMESTAMP WHERE email_id = ?",
            email_id
        )
        .execute(&self.connection_pool)
        .await?;

        Ok(())
    }
}
