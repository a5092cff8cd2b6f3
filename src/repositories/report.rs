//! ReportRepository - Repository per le segnalazioni dei post

use super::{Create, Read};
use crate::dtos::CreateReportDTO;
use crate::entities::{Report, ReportReason};
use sqlx::{Error, MySqlPool};

pub struct ReportRepository {
    connection_pool: MySqlPool,
}

impl ReportRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Una sola segnalazione per coppia (post, utente)
    pub async fn exists_for(&self, post_id: &i32, reporter_id: &i32) -> Result<bool, Error> {
        let row = sqlx::query!(
            "SELECT COUNT(*) as total FROM reports WHERE post_id = ? AND reporter_id = ?",
            post_id,
            reporter_id
        )
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(row.total > 0)
    }
}

impl Create<Report, (CreateReportDTO, i32, i32)> for ReportRepository {
    /// (body, post_id, reporter_id)
    async fn create(&self, data: &(CreateReportDTO, i32, i32)) -> Result<Report, Error> {
        let (dto, post_id, reporter_id) = data;
        let result = sqlx::query!(
            "INSERT INTO reports (post_id, reporter_id, reason, detail) VALUES (?, ?, ?, ?)",
            post_id,
            reporter_id,
            dto.reason,
            dto.detail
        )
        .execute(&self.connection_pool)
        .await?;

        let new_id = result.last_insert_id() as i32;

        self.read(&new_id).await?.ok_or(sqlx::Error::RowNotFound)
    }
}

impl Read<Report, i32> for ReportRepository {
    async fn read(&self, id: &i32) -> Result<Option<Report>, Error> {
        let report = sqlx::query_as!(
            Report,
            r#"
            SELECT report_id, post_id, reporter_id,
                   reason as "reason: ReportReason",
                   detail, created_at
            FROM reports WHERE report_id = ?
            "#,
            id
        )
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(report)
    }
}
