use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{RepoError, SettingsRepo, UpdateSettingsParams},
    domain::entities::SettingsRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct SettingsRow {
    id: Uuid,
    whatsapp_number: Option<String>,
    hero_title: Option<String>,
    hero_subtitle: Option<String>,
    announcement_text: Option<String>,
    created_at: OffsetDateTime,
}

impl From<SettingsRow> for SettingsRecord {
    fn from(row: SettingsRow) -> Self {
        Self {
            id: row.id,
            whatsapp_number: row.whatsapp_number,
            hero_title: row.hero_title,
            hero_subtitle: row.hero_subtitle,
            announcement_text: row.announcement_text,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl SettingsRepo for PostgresRepositories {
    async fn load_settings(&self) -> Result<Option<SettingsRecord>, RepoError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT id,
                   whatsapp_number,
                   hero_title,
                   hero_subtitle,
                   announcement_text,
                   created_at
            FROM settings
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SettingsRecord::from))
    }

    async fn update_settings(
        &self,
        params: UpdateSettingsParams,
    ) -> Result<SettingsRecord, RepoError> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            UPDATE settings
            SET whatsapp_number = $2,
                hero_title = $3,
                hero_subtitle = $4,
                announcement_text = $5
            WHERE id = $1
            RETURNING id,
                      whatsapp_number,
                      hero_title,
                      hero_subtitle,
                      announcement_text,
                      created_at
            "#,
        )
        .bind(params.id)
        .bind(params.whatsapp_number)
        .bind(params.hero_title)
        .bind(params.hero_subtitle)
        .bind(params.announcement_text)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(SettingsRecord::from).ok_or(RepoError::NotFound)
    }
}
