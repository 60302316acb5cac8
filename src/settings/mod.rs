//! 프록시 설정
//!
//! `PROXY_CONFIG_FILE`이 지정되면 TOML 파일에서, 아니면 환경 변수에서 읽습니다.

use std::{env, path::Path};
use serde::Deserialize;
use tracing::debug;

use crate::rate_limit::RateLimitConfig;

mod server;
pub mod logging;
mod tls;
mod error;
pub mod routes;

pub use server::{ServerSettings, DEFAULT_MAX_BODY_BYTES};
pub use logging::{LogFormat, LogOutput, LogSettings};
pub use tls::TlsSettings;
pub use error::SettingsError;
pub use routes::{load_route_file, parse_route_lines};

pub type Result<T> = std::result::Result<T, SettingsError>;
pub use server::parse_env_var;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub logging: LogSettings,

    #[serde(default)]
    pub tls: TlsSettings,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Settings {
    pub async fn load() -> Result<Self> {
        match env::var("PROXY_CONFIG_FILE") {
            Ok(config_path) => {
                debug!(path = %config_path, "TOML 설정 파일 사용");
                Self::from_toml_file(&config_path).await
            }
            Err(_) => Self::from_env().await,
        }
    }

    pub async fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| SettingsError::FileError {
            path: path.as_ref().to_string_lossy().to_string(),
            error: e,
        })?;

        let settings: Self = toml::from_str(&content)
            .map_err(|e| SettingsError::ParseError { source: e })?;

        settings.validate().await?;
        Ok(settings)
    }

    pub async fn from_env() -> Result<Self> {
        let settings = Self {
            server: ServerSettings::from_env()?,
            logging: LogSettings::from_env()?,
            tls: TlsSettings::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
        };

        settings.validate().await?;
        Ok(settings)
    }

    pub async fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.tls.validate().await?;
        self.rate_limit.validate()?;
        Ok(())
    }
}
