use std::fmt;

/// 라우트 항목 검증 중 발생하는 에러입니다.
///
/// 모두 시작 시점에 해당 항목만 건너뛰고 복구됩니다.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteError {
    /// 대상 URL 파싱 실패
    InvalidTarget {
        target: String,
        reason: String,
    },
    /// 지원하지 않는 스킴 (http, https만 지원)
    UnsupportedScheme {
        target: String,
        scheme: String,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidTarget { target, reason } =>
                write!(f, "유효하지 않은 대상 URL {}: {}", target, reason),
            RouteError::UnsupportedScheme { target, scheme } =>
                write!(f, "지원하지 않는 스킴 {} (대상: {})", scheme, target),
        }
    }
}

impl std::error::Error for RouteError {}
