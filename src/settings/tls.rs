use std::path::PathBuf;
use serde::Deserialize;
use tokio::fs;
use super::{server::parse_env_var, SettingsError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsSettings {
    /// 리스너에서 TLS 종료 여부
    #[serde(default)]
    pub enabled: bool,

    /// 인증서 체인 PEM 파일 경로
    pub cert_path: Option<PathBuf>,

    /// 개인키 PEM 파일 경로
    pub key_path: Option<PathBuf>,
}

impl TlsSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Self {
            enabled: parse_env_var("PROXY_TLS_ENABLED", || false)?,
            cert_path: std::env::var("PROXY_TLS_CERT").map(PathBuf::from).ok(),
            key_path: std::env::var("PROXY_TLS_KEY").map(PathBuf::from).ok(),
        })
    }

    /// TLS가 켜져 있으면 인증서와 키 파일이 모두 지정되어 있고 읽을 수 있어야 합니다.
    pub async fn validate(&self) -> Result<(), SettingsError> {
        if !self.enabled {
            return Ok(());
        }

        let cert_path = self.cert_path.as_ref().ok_or_else(|| SettingsError::Missing {
            name: "PROXY_TLS_CERT".to_string(),
        })?;
        let key_path = self.key_path.as_ref().ok_or_else(|| SettingsError::Missing {
            name: "PROXY_TLS_KEY".to_string(),
        })?;

        for path in [cert_path, key_path] {
            fs::read(path).await.map_err(|e| SettingsError::FileError {
                path: path.to_string_lossy().to_string(),
                error: e,
            })?;
        }

        Ok(())
    }
}
