use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ItemsConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// How long in-flight requests may drain after a shutdown signal.
    pub shutdown_grace: Duration,
    /// Upper bound on a single inbound request.
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            shutdown_grace: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ItemsConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env, configuration file and APP__ prefix)
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";
        let defaults = ServerConfig::default();

        Ok(ItemsConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env("MONGO_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("DB_NAME", Some("appdb"), is_prod)?,
            },
            server: ServerConfig {
                shutdown_grace: get_secs("SHUTDOWN_GRACE_SECS", defaults.shutdown_grace)?,
                request_timeout: get_secs("REQUEST_TIMEOUT_SECS", defaults.request_timeout)?,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn get_secs(key: &str, default: Duration) -> Result<Duration, AppError> {
    match env::var(key) {
        Ok(val) => val.parse().map(Duration::from_secs).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} must be a whole number of seconds: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}
