use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::admin::normalize_optional;
use crate::application::catalog::CatalogService;
use crate::application::repos::{RepoError, SettingsRepo, UpdateSettingsParams};
use crate::cache::QueryFamily;
use crate::domain::entities::SettingsRecord;

const MIN_PHONE_DIGITS: usize = 8;
const MAX_PHONE_DIGITS: usize = 15;

#[derive(Debug, Error)]
pub enum AdminSettingsError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("storefront settings have not been created")]
    Missing,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Replacement values for the settings row. Blank text clears a field.
#[derive(Debug, Clone, Default)]
pub struct UpdateSettingsCommand {
    /// Row to update; defaults to the single existing row.
    pub id: Option<Uuid>,
    pub whatsapp_number: Option<String>,
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub announcement_text: Option<String>,
}

#[derive(Clone)]
pub struct AdminSettingsService {
    repo: Arc<dyn SettingsRepo>,
    catalog: CatalogService,
}

impl AdminSettingsService {
    pub fn new(repo: Arc<dyn SettingsRepo>, catalog: CatalogService) -> Self {
        Self { repo, catalog }
    }

    pub async fn load(&self) -> Result<Option<SettingsRecord>, AdminSettingsError> {
        self.repo
            .load_settings()
            .await
            .map_err(AdminSettingsError::from)
    }

    pub async fn update(
        &self,
        command: UpdateSettingsCommand,
    ) -> Result<SettingsRecord, AdminSettingsError> {
        let whatsapp_number = normalize_optional(command.whatsapp_number);
        if let Some(number) = whatsapp_number.as_deref() {
            ensure_phone_number(number)?;
        }

        let id = match command.id {
            Some(id) => id,
            None => {
                self.repo
                    .load_settings()
                    .await?
                    .ok_or(AdminSettingsError::Missing)?
                    .id
            }
        };

        let params = UpdateSettingsParams {
            id,
            whatsapp_number,
            hero_title: normalize_optional(command.hero_title),
            hero_subtitle: normalize_optional(command.hero_subtitle),
            announcement_text: normalize_optional(command.announcement_text),
        };

        let record = self.repo.update_settings(params).await.map_err(|err| match err {
            RepoError::NotFound => AdminSettingsError::Missing,
            other => AdminSettingsError::Repo(other),
        })?;
        self.catalog.invalidate_family(QueryFamily::Settings);
        Ok(record)
    }
}

fn ensure_phone_number(number: &str) -> Result<(), AdminSettingsError> {
    let body = number.strip_prefix('+').unwrap_or(number);
    let valid_chars = body
        .chars()
        .all(|ch| ch.is_ascii_digit() || ch == ' ' || ch == '-');
    let digits = body.chars().filter(char::is_ascii_digit).count();

    if !valid_chars || !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        return Err(AdminSettingsError::Validation(
            "WhatsApp number must contain 8 to 15 digits including the country code",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers_accept_common_formatting() {
        assert!(ensure_phone_number("+91 98765-43210").is_ok());
        assert!(ensure_phone_number("919876543210").is_ok());
    }

    #[test]
    fn phone_numbers_reject_letters_and_short_input() {
        assert!(ensure_phone_number("call me").is_err());
        assert!(ensure_phone_number("12345").is_err());
        assert!(ensure_phone_number("+91 98765 43210 12345").is_err());
    }
}
