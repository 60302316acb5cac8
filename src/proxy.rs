use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;

use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use bytes::Bytes;
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::http::uri::InvalidUri;
use hyper::{Request, Response, StatusCode, Version};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, warn};

use crate::routing::Route;

/// 클라이언트에 돌려주는 응답 본문 타입
pub type ProxyBody = BoxBody<Bytes, hyper::Error>;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// 프록시 구간에서만 의미가 있어 전달하지 않는 헤더
const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "proxy-connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug)]
pub enum ProxyError {
    /// 백엔드 URI 생성 실패
    InvalidUri(InvalidUri),
    /// 백엔드 연결 또는 요청 실패
    BackendUnreachable(legacy::Error),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::InvalidUri(e) => write!(f, "백엔드 URI 생성 실패: {}", e),
            ProxyError::BackendUnreachable(e) => write!(f, "백엔드 요청 실패: {}", e),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProxyError::InvalidUri(e) => Some(e),
            ProxyError::BackendUnreachable(e) => Some(e),
        }
    }
}

impl From<InvalidUri> for ProxyError {
    fn from(err: InvalidUri) -> Self {
        ProxyError::InvalidUri(err)
    }
}

impl From<legacy::Error> for ProxyError {
    fn from(err: legacy::Error) -> Self {
        ProxyError::BackendUnreachable(err)
    }
}

/// 선택된 백엔드로 요청 하나를 중계합니다.
///
/// 모든 요청이 하나의 커넥션 풀을 공유합니다. 재시도는 하지 않습니다.
/// `https` 대상은 webpki 루트 인증서로 검증합니다.
#[derive(Clone)]
pub struct ForwardingProxy {
    client: legacy::Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
}

impl ForwardingProxy {
    pub fn new() -> Self {
        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();
        let client = legacy::Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }

    /// 요청을 백엔드로 보내고 응답을 그대로 돌려줍니다.
    ///
    /// 백엔드 응답 본문은 모으지 않고 스트리밍합니다. 실패 시 502를 반환합니다.
    pub async fn forward(
        &self,
        route: &Route,
        req: Request<Full<Bytes>>,
        peer: SocketAddr,
    ) -> Response<ProxyBody> {
        match self.send(route, req, peer).await {
            Ok(response) => response,
            Err(e) => {
                warn!(host = %route.host(), backend = %route.authority(), error = %e, "백엔드 요청 실패");
                status_response(StatusCode::BAD_GATEWAY)
            }
        }
    }

    async fn send(
        &self,
        route: &Route,
        req: Request<Full<Bytes>>,
        peer: SocketAddr,
    ) -> Result<Response<ProxyBody>, ProxyError> {
        let (mut parts, body) = req.into_parts();

        parts.uri = route.outbound_uri(&parts.uri)?;
        parts.version = Version::HTTP_11;
        remove_hop_by_hop_headers(&mut parts.headers);
        append_forwarded_for(&mut parts.headers, peer);

        debug!(uri = %parts.uri, method = %parts.method, "백엔드로 요청 전달");
        let response = self.client.request(Request::from_parts(parts, body)).await?;

        let (mut parts, body) = response.into_parts();
        remove_hop_by_hop_headers(&mut parts.headers);
        debug!(status = %parts.status, "백엔드 응답 수신");

        Ok(Response::from_parts(parts, body.boxed()))
    }
}

impl Default for ForwardingProxy {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_hop_by_hop_headers(headers: &mut HeaderMap) {
    // Connection 헤더에 나열된 헤더도 홉 단위
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

/// 기존 `X-Forwarded-For` 값 뒤에 연결 상대의 IP를 덧붙입니다.
fn append_forwarded_for(headers: &mut HeaderMap, peer: SocketAddr) {
    let ip = peer.ip().to_string();
    let prior: Vec<&str> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    let value = if prior.is_empty() {
        ip
    } else {
        format!("{}, {}", prior.join(", "), ip)
    };

    match HeaderValue::from_str(&value) {
        Ok(value) => {
            headers.insert(X_FORWARDED_FOR, value);
        }
        Err(e) => warn!(error = %e, "X-Forwarded-For 헤더 생성 실패"),
    }
}

pub fn full<T: Into<Bytes>>(chunk: T) -> ProxyBody {
    Full::new(chunk.into())
        .map_err(|never: Infallible| match never {})
        .boxed()
}

pub fn empty() -> ProxyBody {
    Empty::<Bytes>::new()
        .map_err(|never: Infallible| match never {})
        .boxed()
}

/// 본문이 비어 있는 상태 코드 응답
pub fn status_response(status: StatusCode) -> Response<ProxyBody> {
    let mut response = Response::new(empty());
    *response.status_mut() = status;
    response
}
