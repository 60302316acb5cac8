use std::fmt;

#[derive(Debug)]
pub enum SettingsError {
    /// 필수 값 누락
    Missing {
        name: String,
    },
    /// 값 형식 또는 범위 오류
    Invalid {
        name: String,
        value: String,
        reason: String,
    },
    FileError {
        path: String,
        error: std::io::Error,
    },
    ParseError {
        source: toml::de::Error,
    },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { name } =>
                write!(f, "설정 값 누락: {}", name),
            Self::Invalid { name, value, reason } =>
                write!(f, "설정 값 {}={:?} 오류: {}", name, value, reason),
            Self::FileError { path, error } =>
                write!(f, "파일 {} 오류: {}", path, error),
            Self::ParseError { source } =>
                write!(f, "설정 파싱 오류: {}", source),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ParseError { source } => Some(source),
            Self::FileError { error, .. } => Some(error),
            _ => None,
        }
    }
}
