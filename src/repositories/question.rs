//! QuestionRepository - Repository per le domande rivolte al chatbot

use super::{Create, Read};
use crate::entities::Question;
use sqlx::{Error, MySqlPool};

/// Dati per persistere una domanda a ogni turno di chat
#[derive(Debug, Clone)]
pub struct CreateQuestion {
    pub question: String,
    pub user_id: i32,
}

pub struct QuestionRepository {
    connection_pool: MySqlPool,
}

impl QuestionRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }
}

impl Create<Question, CreateQuestion> for QuestionRepository {
    async fn create(&self, data: &CreateQuestion) -> Result<Question, Error> {
        let result = sqlx::query!(
            "INSERT INTO questions (question, user_id) VALUES (?, ?)",
            data.question,
            data.user_id
        )
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;

        self.read(&new_id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

impl Read<Question, i32> for QuestionRepository {
    async fn read(&self, id: &i32) -> Result<Option<Question>, Error> {
        let question = sqlx::query_as!(
            Question,
            r#"
            SELECT question_id, question, user_id, created_at
            FROM questions WHERE question_id = ?
            "#,
            id
        )
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(question)
    }
}
