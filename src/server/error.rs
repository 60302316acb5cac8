use crate::settings::SettingsError;
use std::fmt;
use std::net::SocketAddr;

/// 서비스 시작 전에 발생하는 치명적 에러
#[derive(Debug)]
pub enum Error {
    Settings(SettingsError),
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    Tls(String),
    AccessLog(std::io::Error),
    IoError(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<SettingsError> for Error {
    fn from(err: SettingsError) -> Self {
        Error::Settings(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Settings(e) => write!(f, "Settings Error: {}", e),
            Error::Bind { addr, source } => write!(f, "Bind Error: {}: {}", addr, source),
            Error::Tls(msg) => write!(f, "TLS Error: {}", msg),
            Error::AccessLog(e) => write!(f, "Access Log Error: {}", e),
            Error::IoError(e) => write!(f, "IO Error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Settings(e) => Some(e),
            Error::Bind { source, .. } => Some(source),
            Error::AccessLog(e) | Error::IoError(e) => Some(e),
            Error::Tls(_) => None,
        }
    }
}
