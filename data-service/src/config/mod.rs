use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017/";

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub store: StoreConfig,
    pub mongodb: MongoConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub user: Option<String>,
    pub password: Option<Secret<String>>,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl DataConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;

        Ok(DataConfig {
            common: common_config,
            service_name: get_env("SERVICE_NAME", "data-service"),
            log_level: get_env("LOG_LEVEL", "info"),
            otlp_endpoint: get_optional_env("OTLP_ENDPOINT"),
            store: StoreConfig {
                backend: get_env("STORE_BACKEND", "mongo")
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", DEFAULT_MONGODB_URI),
                user: get_optional_env("MONGODB_USER"),
                password: get_optional_env("MONGODB_PASS").map(Secret::new),
                database: get_env("MONGODB_DATABASE", "data_db"),
                collection: get_env("MONGODB_COLLECTION", "data"),
            },
            cors: CorsConfig {
                allowed_origins: parse_origins(&get_env("CORS_ALLOWED_ORIGINS", "")),
            },
        })
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Unset and empty variables are both treated as absent.
fn get_optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
