use hyper::http::uri::InvalidUri;
use hyper::Uri;
use url::Url;

use crate::routing::RouteError;

/// 검증 전의 라우트 항목 (호스트, 대상 URL 문자열)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub host: String,
    pub target: String,
}

impl RouteEntry {
    pub fn new(host: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            target: target.into(),
        }
    }
}

/// 호스트 하나와 백엔드 오리진 하나를 잇는 불변 라우트입니다.
#[derive(Debug, Clone)]
pub struct Route {
    host: String,
    target: Url,
    authority: String,
}

impl Route {
    /// 대상 URL을 검증하여 라우트를 생성합니다.
    ///
    /// # 예제
    ///
    /// ```
    /// use vhost_proxy::routing::Route;
    ///
    /// let route = Route::new("x.test", "http://10.0.0.1:9000").unwrap();
    /// assert_eq!(route.host(), "x.test");
    /// assert_eq!(route.authority(), "10.0.0.1:9000");
    /// ```
    pub fn new(host: impl Into<String>, target: &str) -> Result<Self, RouteError> {
        let url = Url::parse(target).map_err(|e| RouteError::InvalidTarget {
            target: target.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(RouteError::UnsupportedScheme {
                target: target.to_string(),
                scheme: url.scheme().to_string(),
            });
        }

        let host_str = url.host_str().ok_or_else(|| RouteError::InvalidTarget {
            target: target.to_string(),
            reason: "호스트가 없음".to_string(),
        })?;

        let authority = match url.port() {
            Some(port) => format!("{}:{}", host_str, port),
            None => host_str.to_string(),
        };

        Ok(Self {
            host: host.into(),
            target: url,
            authority,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// 백엔드 스킴 (`http` 또는 `https`)
    pub fn scheme(&self) -> &str {
        self.target.scheme()
    }

    /// 백엔드의 `host[:port]`
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// 인바운드 URI를 백엔드로 보낼 절대 URI로 변환합니다.
    ///
    /// 경로는 대상 경로 뒤에 슬래시 하나로 이어 붙이고, 쿼리는 둘 다 있을 때 `&`로 합칩니다.
    pub fn outbound_uri(&self, inbound: &Uri) -> Result<Uri, InvalidUri> {
        let path = join_path(self.target.path(), inbound.path());
        let query = match (self.target.query(), inbound.query()) {
            (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => Some(format!("{}&{}", a, b)),
            (Some(a), _) if !a.is_empty() => Some(a.to_string()),
            (_, Some(b)) if !b.is_empty() => Some(b.to_string()),
            _ => None,
        };

        let uri = match query {
            Some(query) => format!("{}://{}{}?{}", self.scheme(), self.authority, path, query),
            None => format!("{}://{}{}", self.scheme(), self.authority, path),
        };
        uri.parse()
    }
}

fn join_path(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}
