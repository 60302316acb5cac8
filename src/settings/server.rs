use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use super::SettingsError;

/// 인바운드 요청 본문 기본 상한 (1 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone, Debug, Deserialize)]
pub struct ServerSettings {
    /// 리스닝 포트 (기본값: 80)
    #[serde(default = "default_port")]
    pub port: u16,

    /// `host -> url` 형식의 라우트 파일
    #[serde(default = "default_routes_file")]
    pub routes_file: PathBuf,

    /// 라우트가 없을 때 응답할 HTML 파일
    #[serde(default = "default_not_found_page")]
    pub not_found_page: PathBuf,

    /// 접근 로그 파일
    #[serde(default = "default_access_log")]
    pub access_log: PathBuf,

    /// 요청 본문 최대 크기(바이트)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 { 80 }
fn default_routes_file() -> PathBuf { PathBuf::from("config.cfg") }
fn default_not_found_page() -> PathBuf { PathBuf::from("404.html") }
fn default_access_log() -> PathBuf { PathBuf::from("access.log") }
fn default_max_body_bytes() -> usize { DEFAULT_MAX_BODY_BYTES }

/// 환경 변수를 `FromStr`로 파싱합니다. 변수가 없으면 기본값을 사용합니다.
pub fn parse_env_var<T: std::str::FromStr, F: FnOnce() -> T>(name: &str, default: F) -> Result<T, SettingsError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| SettingsError::Invalid {
            name: name.to_string(),
            value: val,
            reason: e.to_string(),
        }),
        Err(env::VarError::NotPresent) => Ok(default()),
        Err(e) => Err(SettingsError::Invalid {
            name: name.to_string(),
            value: String::new(),
            reason: e.to_string(),
        }),
    }
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, SettingsError> {
        let settings = Self {
            port: parse_env_var("PROXY_HTTP_PORT", default_port)?,
            routes_file: parse_env_var("PROXY_ROUTES_FILE", default_routes_file)?,
            not_found_page: parse_env_var("PROXY_NOT_FOUND_PAGE", default_not_found_page)?,
            access_log: parse_env_var("PROXY_ACCESS_LOG", default_access_log)?,
            max_body_bytes: parse_env_var("PROXY_MAX_BODY_BYTES", default_max_body_bytes)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.port == 0 {
            return Err(SettingsError::Invalid {
                name: "server.port".to_string(),
                value: self.port.to_string(),
                reason: "포트는 0이 될 수 없습니다".to_string(),
            });
        }

        if self.max_body_bytes == 0 {
            return Err(SettingsError::Invalid {
                name: "server.max_body_bytes".to_string(),
                value: self.max_body_bytes.to_string(),
                reason: "0보다 커야 합니다".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            routes_file: default_routes_file(),
            not_found_page: default_not_found_page(),
            access_log: default_access_log(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}
