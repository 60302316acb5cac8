//! vhost-proxy는 Host 헤더로 백엔드를 고르는 경량 리버스 프록시입니다.
//!
//! # 주요 기능
//!
//! - 정확한 호스트 일치 기반 라우팅 (선언 순서상 첫 번째 일치)
//! - 클라이언트별 토큰 버킷 속도 제한과 유휴 버킷 정리
//! - 요청/응답 그대로 중계, 백엔드 장애 시 502
//! - 요청마다 한 줄씩 남는 접근 로그
//!
//! # 예제
//!
//! ```
//! use vhost_proxy::routing::{RouteEntry, RouteTable};
//!
//! let table = RouteTable::build(vec![
//!     RouteEntry::new("x.test", "http://10.0.0.1:9000"),
//!     RouteEntry::new("x.test", "http://10.0.0.2:9000"),
//! ]);
//!
//! // 먼저 선언된 라우트가 이김
//! assert_eq!(table.lookup("x.test").unwrap().authority(), "10.0.0.1:9000");
//! // 포트를 떼어내지 않음
//! assert!(table.lookup("x.test:8080").is_none());
//! ```

pub mod logging;
pub mod proxy;
pub mod rate_limit;
pub mod routing;
pub mod server;
pub mod settings;
pub mod tls;
