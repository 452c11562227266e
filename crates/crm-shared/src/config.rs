//! Configuration management

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::constants::{DEFAULT_ACCESS_TOKEN_EXPIRY, DEFAULT_UPLOAD_DIR, DEFAULT_UPLOAD_MAX_BYTES};
use crate::error::AppError;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub access: AccessSettings,
    pub upload: UploadSettings,
    pub log: LogSettings,
    #[serde(default)]
    pub bootstrap: BootstrapSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub api_prefix: String,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub backend: DatabaseBackend,
    #[serde(default)]
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    #[serde(default)]
    pub secret: String,
    pub access_token_expiry: i64,
}

/// Switches for the two places where member permissions differ between deployments.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct AccessSettings {
    pub members_can_create_leads: bool,
    pub members_can_export: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadSettings {
    pub directory: String,
    pub max_bytes: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
    pub directory: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BootstrapSettings {
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl BootstrapSettings {
    /// `(name, email, password)` when all three admin fields are set.
    pub fn admin(&self) -> Option<(&str, &str, &str)> {
        match (&self.admin_name, &self.admin_email, &self.admin_password) {
            (Some(name), Some(email), Some(password)) => Some((name, email, password)),
            _ => None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let builder = Self::with_defaults()?
            .set_override("app.env", env.clone())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("app.cors_origins"),
            );
        Self::from_config(builder.build()?)
    }

    pub fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 5000)?
            .set_default("app.name", "crm-server")?
            .set_default("app.api_prefix", "/api")?
            .set_default("database.backend", "memory")?
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_seconds", 3)?
            .set_default("database.run_migrations", true)?
            .set_default("jwt.access_token_expiry", DEFAULT_ACCESS_TOKEN_EXPIRY)?
            .set_default("access.members_can_create_leads", false)?
            .set_default("access.members_can_export", true)?
            .set_default("upload.directory", DEFAULT_UPLOAD_DIR)?
            .set_default("upload.max_bytes", DEFAULT_UPLOAD_MAX_BYTES)?
            .set_default("log.level", "info")?
            .set_default("log.format", "json")
    }

    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let parsed: AppConfig = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn is_development(&self) -> bool {
        self.app.env == "development" || self.app.env == "test"
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.jwt.secret.is_empty() && !self.is_development() {
            return Err(AppError::InvalidConfig("jwt.secret must be set".into()));
        }
        if self.jwt.access_token_expiry <= 0 {
            return Err(AppError::InvalidConfig("jwt.access_token_expiry must be positive".into()));
        }
        if self.database.backend == DatabaseBackend::Postgres && self.database.url.is_empty() {
            return Err(AppError::InvalidConfig(
                "database.url is required for the postgres backend".into(),
            ));
        }
        if !self.app.api_prefix.starts_with('/') {
            return Err(AppError::InvalidConfig("app.api_prefix must start with '/'".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn build(extra: &str) -> Result<AppConfig, AppError> {
        let config = AppConfig::with_defaults()
            .unwrap()
            .add_source(File::from_str(extra, FileFormat::Toml))
            .build()
            .unwrap();
        AppConfig::from_config(config)
    }

    #[test]
    fn test_defaults_are_usable_in_development() {
        let cfg = build("").unwrap();
        assert_eq!(cfg.app.port, 5000);
        assert_eq!(cfg.database.backend, DatabaseBackend::Memory);
        assert!(!cfg.access.members_can_create_leads);
        assert!(cfg.access.members_can_export);
        assert_eq!(cfg.log.format, LogFormat::Json);
        assert!(cfg.bootstrap.admin().is_none());
    }

    #[test]
    fn test_production_requires_secret() {
        let err = build("[app]\nenv = \"production\"").unwrap_err();
        assert!(err.to_string().contains("jwt.secret"));
    }

    #[test]
    fn test_postgres_requires_url() {
        let err = build("[database]\nbackend = \"postgres\"").unwrap_err();
        assert!(err.to_string().contains("database.url"));
    }

    #[test]
    fn test_bootstrap_admin_needs_all_fields() {
        let cfg = build("[bootstrap]\nadmin_name = \"Root\"\nadmin_email = \"root@x.com\"").unwrap();
        assert!(cfg.bootstrap.admin().is_none());

        let cfg = build(
            "[bootstrap]\nadmin_name = \"Root\"\nadmin_email = \"root@x.com\"\nadmin_password = \"secret1\"",
        )
        .unwrap();
        assert_eq!(cfg.bootstrap.admin(), Some(("Root", "root@x.com", "secret1")));
    }
}
