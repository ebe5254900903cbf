//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::*;

use std::{num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vastra";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 15;
const DEFAULT_WHATSAPP_NUMBER: &str = "919876543210";
const DEFAULT_UPLOAD_PUBLIC_BASE: &str = "/uploads";
const DEFAULT_UPLOAD_MAX_BYTES: u64 = 5 * 1024 * 1024;
const DEFAULT_PRODUCT_BUCKET: &str = "product-images";
const DEFAULT_CATEGORY_BUCKET: &str = "category-images";
const DEFAULT_FAVORITES_PATH: &str = ".vastra/favorites.json";
const DEFAULT_QUERY_CACHE_LIMIT: u32 = 256;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub backend: BackendSettings,
    pub storefront: StorefrontSettings,
    pub uploads: UploadSettings,
    pub favorites: FavoritesSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
    pub acquire_timeout: Duration,
}

/// Hosted auth and object storage. Absent when no base URL is configured.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: Option<Url>,
    pub anon_key: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct StorefrontSettings {
    /// Used when the settings row has no WhatsApp number.
    pub default_whatsapp_number: String,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Store images on local disk instead of backend object storage.
    pub directory: Option<PathBuf>,
    pub public_base: String,
    pub max_bytes: usize,
    pub product_bucket: String,
    pub category_bucket: String,
}

#[derive(Debug, Clone)]
pub struct FavoritesSettings {
    pub storage_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enable_query_cache: bool,
    pub query_limit: usize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("VASTRA").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_global_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    backend: RawBackendSettings,
    storefront: RawStorefrontSettings,
    uploads: RawUploadSettings,
    favorites: RawFavoritesSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_global_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(url) = overrides.backend_url.as_ref() {
            self.backend.base_url = Some(url.clone());
        }
        if let Some(path) = overrides.favorites_path.as_ref() {
            self.favorites.storage_path = Some(path.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            database,
            backend,
            storefront,
            uploads,
            favorites,
            cache,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            backend: build_backend_settings(backend)?,
            storefront: build_storefront_settings(storefront)?,
            uploads: build_upload_settings(uploads)?,
            favorites: build_favorites_settings(favorites)?,
            cache: build_cache_settings(cache)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    let acquire_secs = database
        .acquire_timeout_seconds
        .unwrap_or(DEFAULT_DB_ACQUIRE_TIMEOUT_SECS);
    if acquire_secs == 0 {
        return Err(LoadError::invalid(
            "database.acquire_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(DatabaseSettings {
        url,
        max_connections,
        acquire_timeout: Duration::from_secs(acquire_secs),
    })
}

fn build_backend_settings(backend: RawBackendSettings) -> Result<BackendSettings, LoadError> {
    let base_url = non_blank(backend.base_url)
        .map(|value| {
            let url = Url::parse(&value)
                .map_err(|err| LoadError::invalid("backend.base_url", err.to_string()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(LoadError::invalid(
                    "backend.base_url",
                    "scheme must be http or https",
                ));
            }
            Ok(url)
        })
        .transpose()?;

    let anon_key = non_blank(backend.anon_key).unwrap_or_default();
    if base_url.is_some() && anon_key.is_empty() {
        return Err(LoadError::invalid(
            "backend.anon_key",
            "required when backend.base_url is set",
        ));
    }

    let timeout_secs = backend
        .request_timeout_seconds
        .unwrap_or(DEFAULT_BACKEND_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "backend.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(BackendSettings {
        base_url,
        anon_key,
        request_timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_storefront_settings(
    storefront: RawStorefrontSettings,
) -> Result<StorefrontSettings, LoadError> {
    let number = non_blank(storefront.default_whatsapp_number)
        .unwrap_or_else(|| DEFAULT_WHATSAPP_NUMBER.to_string());
    if !number.chars().any(|ch| ch.is_ascii_digit()) {
        return Err(LoadError::invalid(
            "storefront.default_whatsapp_number",
            "must contain digits",
        ));
    }

    Ok(StorefrontSettings {
        default_whatsapp_number: number,
    })
}

fn build_upload_settings(uploads: RawUploadSettings) -> Result<UploadSettings, LoadError> {
    let max_bytes_value = uploads.max_bytes.unwrap_or(DEFAULT_UPLOAD_MAX_BYTES);
    if max_bytes_value == 0 {
        return Err(LoadError::invalid(
            "uploads.max_bytes",
            "must be greater than zero",
        ));
    }
    let max_bytes = usize::try_from(max_bytes_value).map_err(|_| {
        LoadError::invalid(
            "uploads.max_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    let directory = uploads
        .directory
        .filter(|path| !path.as_os_str().is_empty());

    Ok(UploadSettings {
        directory,
        public_base: non_blank(uploads.public_base)
            .unwrap_or_else(|| DEFAULT_UPLOAD_PUBLIC_BASE.to_string()),
        max_bytes,
        product_bucket: bucket_name(
            uploads.product_bucket,
            DEFAULT_PRODUCT_BUCKET,
            "uploads.product_bucket",
        )?,
        category_bucket: bucket_name(
            uploads.category_bucket,
            DEFAULT_CATEGORY_BUCKET,
            "uploads.category_bucket",
        )?,
    })
}

fn build_favorites_settings(
    favorites: RawFavoritesSettings,
) -> Result<FavoritesSettings, LoadError> {
    let storage_path = favorites
        .storage_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FAVORITES_PATH));
    if storage_path.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "favorites.storage_path",
            "path must not be empty",
        ));
    }

    Ok(FavoritesSettings { storage_path })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let limit = non_zero_u32(
        cache
            .query_limit
            .unwrap_or(DEFAULT_QUERY_CACHE_LIMIT)
            .into(),
        "cache.query_limit",
    )?;

    Ok(CacheSettings {
        enable_query_cache: cache.enable_query_cache.unwrap_or(true),
        query_limit: limit.get() as usize,
    })
}

fn bucket_name(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    let name = non_blank(value).unwrap_or_else(|| default.to_string());
    if name.contains('/') {
        return Err(LoadError::invalid(key, "bucket names cannot contain `/`"));
    }
    Ok(name)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    let value = u32::try_from(value)
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range"))?;
    NonZeroU32::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
    acquire_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBackendSettings {
    base_url: Option<String>,
    anon_key: Option<String>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStorefrontSettings {
    default_whatsapp_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUploadSettings {
    directory: Option<PathBuf>,
    public_base: Option<String>,
    max_bytes: Option<u64>,
    product_bucket: Option<String>,
    category_bucket: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFavoritesSettings {
    storage_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enable_query_cache: Option<bool>,
    query_limit: Option<u32>,
}
