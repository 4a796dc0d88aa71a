use std::str::FromStr;

use config::{Config, ConfigError, Environment, File};
use entity::{priority::Priority, result_code::ResultCode};
use serde::Deserialize;
use tracing::Level;

#[derive(Debug, Deserialize)]
pub struct Settings {
    database: Database,
    #[serde(default)]
    mailer: Mailer,
    #[serde(default)]
    maintenance: Maintenance,
    logging: Option<Logging>,
}

#[derive(Debug, Deserialize)]
struct Database {
    r#type: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    pass: String,
    #[serde(default)]
    host: String,
    #[serde(default)]
    port: u16,
    db_name: String,
}

#[derive(Debug, Deserialize)]
struct Mailer {
    max_retries: Option<i32>,
    #[serde(default = "default_true")]
    log_message_data: bool,
}

impl Default for Mailer {
    fn default() -> Self {
        Self {
            max_retries: None,
            log_message_data: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Maintenance {
    #[serde(default)]
    pub retry_deferred: bool,
    #[serde(default)]
    pub retry_priority: Priority,
    #[serde(default)]
    pub purge_deferred: bool,
    pub log_retention_days: Option<i64>,
    pub purge_result_codes: Option<Vec<ResultCode>>,
}

#[derive(Debug, Deserialize)]
struct Logging {
    level: String,
}

fn default_true() -> bool {
    true
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file(&format!("/etc/{}.toml", env!("CARGO_PKG_NAME")))
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix(&env!("CARGO_PKG_NAME").to_uppercase()).separator("__"),
            )
            .build()?;

        s.try_deserialize::<Self>()?.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.maintenance.retry_priority == Priority::Deferred {
            return Err(ConfigError::Message(
                "maintenance.retry_priority must be high, medium or low".to_string(),
            ));
        }

        Ok(self)
    }

    pub fn get_db_url(&self) -> String {
        if self.database.r#type == "sqlite" {
            if self.database.db_name == ":memory:" {
                return "sqlite::memory:".to_string();
            }
            return format!("sqlite:{}?mode=rwc", self.database.db_name);
        }

        format!(
            "{}://{}:{}@{}:{}/{}",
            self.database.r#type,
            self.database.user,
            self.database.pass,
            self.database.host,
            self.database.port,
            self.database.db_name,
        )
    }

    pub fn get_max_retries(&self) -> Option<i32> {
        self.mailer.max_retries
    }

    pub fn get_log_message_data(&self) -> bool {
        self.mailer.log_message_data
    }

    pub fn get_maintenance(&self) -> &Maintenance {
        &self.maintenance
    }

    pub fn get_log_level(&self) -> Level {
        self.logging
            .as_ref()
            .and_then(|logging| Level::from_str(&logging.level).ok())
            .unwrap_or(Level::INFO)
    }
}
