use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::HeaderMap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::{ClientIdentity, ForwardedFor, RateLimitConfig, ReaperHandle};

/// 클라이언트 하나의 토큰 버킷
#[derive(Debug)]
struct ClientBucket {
    /// 현재 사용 가능한 토큰 수 (0..=capacity)
    tokens: u32,
    /// 마지막으로 토큰이 보충된 시각
    last_refill: Instant,
}

impl ClientBucket {
    fn new(capacity: u32, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
        }
    }

    /// 경과 시간만큼 정수 개의 토큰을 보충합니다.
    ///
    /// 보충이 일어나면 나머지 시간과 상관없이 `last_refill`은 `now`로 이동합니다.
    fn refill(&mut self, now: Instant, config: &RateLimitConfig) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let interval = config.refill_interval().as_nanos().max(1);
        let to_add = elapsed.as_nanos() / interval;

        if to_add > 0 {
            let to_add = u32::try_from(to_add).unwrap_or(u32::MAX);
            self.tokens = self.tokens.saturating_add(to_add).min(config.capacity);
            self.last_refill = now;
        }
    }

    fn try_consume(&mut self) -> bool {
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }
}

/// 클라이언트별 토큰 버킷 속도 제한기
///
/// 버킷 맵 전체를 하나의 뮤텍스로 보호합니다. `allow`의 보충-소비와 리퍼의
/// 삭제가 모두 같은 잠금 아래에서 일어나므로 같은 토큰을 두 번 쓰는 일이 없습니다.
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, ClientBucket>>,
    identity: Box<dyn ClientIdentity>,
}

impl RateLimiter {
    /// `X-Forwarded-For` 기반 식별 전략으로 속도 제한기를 생성합니다.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_identity(config, ForwardedFor)
    }

    pub fn with_identity(config: RateLimitConfig, identity: impl ClientIdentity + 'static) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
            identity: Box::new(identity),
        }
    }

    /// 속도 제한기를 만들고 리퍼를 바로 시작합니다.
    pub fn start(config: RateLimitConfig) -> (Arc<Self>, ReaperHandle) {
        let limiter = Arc::new(Self::new(config));
        let reaper = limiter.spawn_reaper();
        (limiter, reaper)
    }

    /// 주기적으로 [`RateLimiter::reap`]을 실행하는 백그라운드 태스크를 시작합니다.
    pub fn spawn_reaper(self: &Arc<Self>) -> ReaperHandle {
        ReaperHandle::spawn(Arc::downgrade(self), self.config.reap_interval())
    }

    pub fn extract_identity(&self, headers: &HeaderMap, peer: SocketAddr) -> String {
        self.identity.identify(headers, peer)
    }

    /// 요청을 허용할지 결정하고, 허용하면 토큰 하나를 소비합니다.
    ///
    /// 처음 보는 클라이언트는 가득 찬 버킷으로 시작합니다.
    pub async fn allow(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;

        let bucket = buckets.entry(client.to_string()).or_insert_with(|| {
            debug!(client = %client, capacity = self.config.capacity, "새로운 토큰 버킷 생성");
            ClientBucket::new(self.config.capacity, now)
        });

        bucket.refill(now, &self.config);
        let allowed = bucket.try_consume();
        if !allowed {
            debug!(client = %client, "토큰 없음, 요청 거부");
        }
        allowed
    }

    /// `idle_ttl`보다 오래 보충되지 않은 버킷을 제거하고 제거한 개수를 반환합니다.
    pub async fn reap(&self) -> usize {
        let now = Instant::now();
        let idle_ttl = self.config.idle_ttl();
        let mut buckets = self.buckets.lock().await;

        let before = buckets.len();
        buckets.retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) <= idle_ttl);
        before - buckets.len()
    }

    pub async fn tracked_clients(&self) -> usize {
        self.buckets.lock().await.len()
    }

    /// 마지막 요청 시점 기준의 남은 토큰 수 (보충은 계산하지 않음)
    pub async fn available_tokens(&self, client: &str) -> Option<u32> {
        self.buckets.lock().await.get(client).map(|bucket| bucket.tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_refill_is_capped_at_capacity() {
        let config = RateLimitConfig::default();
        let start = Instant::now();
        let mut bucket = ClientBucket::new(config.capacity, start);
        bucket.tokens = 0;

        bucket.refill(start + Duration::from_secs(60 * 60 * 24), &config);
        assert_eq!(bucket.tokens, config.capacity);
    }

    #[test]
    fn test_partial_interval_adds_nothing() {
        let config = RateLimitConfig::default();
        let start = Instant::now();
        let mut bucket = ClientBucket::new(config.capacity, start);
        bucket.tokens = 0;

        bucket.refill(start + Duration::from_millis(5_999), &config);
        assert_eq!(bucket.tokens, 0);
        assert_eq!(bucket.last_refill, start);
    }

    #[test]
    fn test_refill_stamp_jumps_to_now() {
        let config = RateLimitConfig::default();
        let start = Instant::now();
        let mut bucket = ClientBucket::new(config.capacity, start);
        bucket.tokens = 0;

        let now = start + Duration::from_secs(13);
        bucket.refill(now, &config);
        assert_eq!(bucket.tokens, 2);
        // 남은 1초는 버려짐
        assert_eq!(bucket.last_refill, now);
    }
}
