//! 호스트 기반 라우팅을 위한 핵심 기능을 제공하는 모듈입니다.
//!
//! 라우팅 테이블은 시작 시 한 번 생성되며 이후 변경되지 않습니다.
//! 조회는 Host 값과의 정확한 문자열 비교이며, 선언 순서상 첫 번째로
//! 일치하는 라우트가 선택됩니다.

mod error;
mod route;
mod table;

pub use error::RouteError;
pub use route::{Route, RouteEntry};
pub use table::{request_host, RouteTable};
