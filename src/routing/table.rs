use hyper::header;
use tracing::{debug, info, warn};

use crate::routing::{Route, RouteEntry};

/// 선언 순서를 유지하는 불변 라우팅 테이블입니다.
///
/// 생성 이후에는 읽기 전용이므로 `Arc`로 감싸 잠금 없이 공유합니다.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// 라우트 항목 목록으로 테이블을 생성합니다.
    ///
    /// 대상 URL이 유효하지 않은 항목은 경고를 남기고 건너뜁니다.
    /// 중복 호스트도 그대로 유지되며, 조회 시에는 먼저 선언된 항목이 이깁니다.
    pub fn build<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = RouteEntry>,
    {
        let mut routes = Vec::new();
        for entry in entries {
            match Route::new(entry.host.clone(), &entry.target) {
                Ok(route) => {
                    info!(host = %entry.host, target = %entry.target, "라우트 추가");
                    routes.push(route);
                }
                Err(e) => {
                    warn!(host = %entry.host, target = %entry.target, error = %e, "유효하지 않은 라우트 건너뜀");
                }
            }
        }
        Self { routes }
    }

    /// Host 값과 정확히 일치하는 첫 번째 라우트를 찾습니다.
    ///
    /// 포트 접미사를 포함한 원본 값을 그대로 비교합니다.
    pub fn lookup(&self, host: &str) -> Option<&Route> {
        let route = self.routes.iter().find(|route| route.host() == host);
        if route.is_none() {
            debug!(host = %host, "일치하는 라우트 없음");
        }
        route
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}

/// 요청의 라우팅용 Host 값을 반환합니다.
///
/// 절대 형식 URI의 authority가 있으면 그것을, 없으면 Host 헤더를 사용합니다.
/// 둘 다 없거나 헤더가 ASCII가 아니면 빈 문자열입니다.
pub fn request_host<B>(req: &hyper::Request<B>) -> &str {
    if let Some(authority) = req.uri().authority() {
        return authority.as_str();
    }
    req.headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_skips_invalid_entries() {
        let table = RouteTable::build(vec![
            RouteEntry::new("a.test", "http://127.0.0.1:8080"),
            RouteEntry::new("b.test", "::not-a-url"),
            RouteEntry::new("c.test", "http://127.0.0.1:8082"),
        ]);

        assert_eq!(table.len(), 2);
        assert!(table.lookup("b.test").is_none());
        assert!(table.lookup("c.test").is_some());
    }

    #[test]
    fn test_request_host_prefers_absolute_uri() {
        let req = hyper::Request::builder()
            .uri("http://absolute.test/path")
            .header("Host", "header.test")
            .body(())
            .unwrap();
        assert_eq!(request_host(&req), "absolute.test");

        let req = hyper::Request::builder()
            .uri("/path")
            .header("Host", "header.test:8080")
            .body(())
            .unwrap();
        assert_eq!(request_host(&req), "header.test:8080");

        let req = hyper::Request::builder().uri("/path").body(()).unwrap();
        assert_eq!(request_host(&req), "");
    }
}
