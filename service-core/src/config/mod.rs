use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;

/// Settings shared by every service binary.
///
/// Sources, lowest precedence first: built-in defaults, an optional
/// `configuration.{toml,yaml,json}` file, `APP__*` variables, and finally the
/// bare `PORT`, `LOG_LEVEL` and `OTLP_ENDPOINT` variables that container
/// platforms tend to inject.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

const PLAIN_OVERRIDES: [(&str, &str); 3] = [
    ("port", "PORT"),
    ("log_level", "LOG_LEVEL"),
    ("otlp_endpoint", "OTLP_ENDPOINT"),
];

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let mut builder = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        for (key, var) in PLAIN_OVERRIDES {
            if let Ok(value) = env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        Ok(builder.build()?.try_deserialize()?)
    }
}
