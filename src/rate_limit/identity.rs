use std::net::SocketAddr;

use hyper::HeaderMap;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// 요청에서 속도 제한 키로 쓸 클라이언트 식별자를 뽑는 전략입니다.
///
/// `X-Forwarded-For`는 클라이언트가 임의로 보낼 수 있으므로, 신뢰할 수 있는
/// 상위 프록시 뒤에 있지 않다면 [`PeerAddress`]를 사용해야 합니다.
pub trait ClientIdentity: Send + Sync {
    fn identify(&self, headers: &HeaderMap, peer: SocketAddr) -> String;
}

/// `X-Forwarded-For`의 첫 번째 항목, 없으면 연결 상대의 IP (기본값)
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardedFor;

impl ClientIdentity for ForwardedFor {
    fn identify(&self, headers: &HeaderMap, peer: SocketAddr) -> String {
        let first = headers
            .get(X_FORWARDED_FOR)
            .and_then(|h| h.to_str().ok())
            .and_then(|forwarded| forwarded.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());

        match first {
            Some(ip) => ip.to_string(),
            None => peer.ip().to_string(),
        }
    }
}

/// 헤더를 무시하고 연결 상대의 IP만 사용
#[derive(Debug, Clone, Copy, Default)]
pub struct PeerAddress;

impl ClientIdentity for PeerAddress {
    fn identify(&self, _headers: &HeaderMap, peer: SocketAddr) -> String {
        peer.ip().to_string()
    }
}
