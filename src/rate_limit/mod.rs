//! 클라이언트별 요청 속도 제한
//!
//! 클라이언트 식별자마다 토큰 버킷을 하나씩 두고, 오래 사용되지 않은 버킷은
//! 백그라운드 리퍼가 주기적으로 제거합니다.

mod config;
mod identity;
mod limiter;
mod reaper;

pub use config::RateLimitConfig;
pub use identity::{ClientIdentity, ForwardedFor, PeerAddress};
pub use limiter::RateLimiter;
pub use reaper::ReaperHandle;
