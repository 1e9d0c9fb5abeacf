//! Configuration module
//!
//! Configuration is read once at startup by [`Config::from_env`] and handed to
//! each component that needs it. Handlers and services never read the
//! environment themselves.

use anyhow::Context;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::validate_bucket;
use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 8091;
const MAX_CONNECTIONS: u32 = 10;
const PROCESS_TIMEOUT_SECS: u64 = 300;
const PRESIGNED_URL_TTL_SECS: u64 = 60 * 60;
const MAX_VIDEO_SIZE_MB: usize = 1024;
const MAX_THUMBNAIL_SIZE_MB: usize = 10;
const MIN_SECRET_LEN: usize = 32;

/// Server, auth and database settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub database_url: String,
    pub db_max_connections: u32,
    /// Externally reachable origin, used to build thumbnail URLs
    pub public_base_url: String,
}

/// Object store settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub local_storage_bucket: String,
    pub url_signing_secret: String,
    pub presigned_url_ttl_secs: u64,
}

/// Upload pipeline settings
#[derive(Clone, Debug)]
pub struct ProcessingConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub process_timeout_secs: u64,
    pub scratch_dir: PathBuf,
    pub assets_root: PathBuf,
    pub max_video_size_bytes: usize,
    pub max_thumbnail_size_bytes: usize,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub storage: StorageConfig,
    pub processing: ProcessingConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?;

        let base = BaseConfig {
            server_port,
            environment,
            cors_origins,
            jwt_secret: jwt_secret.clone(),
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", server_port)),
        };

        let storage = StorageConfig {
            backend: match env::var("STORAGE_BACKEND") {
                Ok(value) => value.parse()?,
                Err(_) => StorageBackend::S3,
            },
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            local_storage_bucket: env::var("LOCAL_STORAGE_BUCKET")
                .unwrap_or_else(|_| "local".to_string()),
            url_signing_secret: env::var("URL_SIGNING_SECRET").unwrap_or(jwt_secret),
            presigned_url_ttl_secs: env::var("PRESIGNED_URL_TTL_SECS")
                .unwrap_or_else(|_| PRESIGNED_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(PRESIGNED_URL_TTL_SECS),
        };

        let max_video_size_mb = env::var("MAX_VIDEO_SIZE_MB")
            .unwrap_or_else(|_| MAX_VIDEO_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_VIDEO_SIZE_MB);
        let max_thumbnail_size_mb = env::var("MAX_THUMBNAIL_SIZE_MB")
            .unwrap_or_else(|_| MAX_THUMBNAIL_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_THUMBNAIL_SIZE_MB);

        let processing = ProcessingConfig {
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            process_timeout_secs: env::var("PROCESS_TIMEOUT_SECS")
                .unwrap_or_else(|_| PROCESS_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(PROCESS_TIMEOUT_SECS),
            scratch_dir: env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
            assets_root: env::var("ASSETS_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./assets")),
            max_video_size_bytes: max_video_size_mb * 1024 * 1024,
            max_thumbnail_size_bytes: max_thumbnail_size_mb * 1024 * 1024,
        };

        let config = Config {
            base,
            storage,
            processing,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least {} characters long",
                MIN_SECRET_LEN
            ));
        }

        if !self.uses_in_memory_database()
            && !self.base.database_url.starts_with("postgresql://")
            && !self.base.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a PostgreSQL connection string or memory://"
            ));
        }

        if self.processing.process_timeout_secs == 0 {
            return Err(anyhow::anyhow!("PROCESS_TIMEOUT_SECS must be greater than 0"));
        }

        if self.storage.presigned_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!(
                "PRESIGNED_URL_TTL_SECS must be greater than 0"
            ));
        }

        match self.storage.backend {
            StorageBackend::S3 => {
                let Some(bucket) = &self.storage.s3_bucket else {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                };
                validate_bucket(bucket)
                    .context("S3_BUCKET cannot be stored in a video reference")?;
                if self.storage.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                validate_bucket(&self.storage.local_storage_bucket)
                    .context("LOCAL_STORAGE_BUCKET cannot be stored in a video reference")?;
                if self.storage.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.storage.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn uses_in_memory_database(&self) -> bool {
        self.base.database_url.starts_with("memory://")
    }

    pub fn process_timeout(&self) -> Duration {
        Duration::from_secs(self.processing.process_timeout_secs)
    }

    pub fn presigned_url_ttl(&self) -> Duration {
        Duration::from_secs(self.storage.presigned_url_ttl_secs)
    }
}
