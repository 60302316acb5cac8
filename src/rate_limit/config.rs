use serde::Deserialize;
use std::time::Duration;

use crate::settings::{parse_env_var, SettingsError};

/// Rate Limit 설정
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RateLimitConfig {
    /// 버킷 최대 토큰 수 (신규 클라이언트의 버스트 허용량)
    #[serde(default = "default_capacity")]
    pub capacity: u32,

    /// 토큰 1개가 보충되는 간격(초)
    #[serde(default = "default_refill_secs")]
    pub refill_interval_secs: u64,

    /// 이 시간(초) 동안 보충되지 않은 버킷은 제거 대상
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,

    /// 리퍼 실행 간격(초)
    #[serde(default = "default_reap_interval_secs")]
    pub reap_interval_secs: u64,
}

fn default_capacity() -> u32 {
    10
}

fn default_refill_secs() -> u64 {
    6
}

fn default_idle_ttl_secs() -> u64 {
    10 * 60
}

fn default_reap_interval_secs() -> u64 {
    5 * 60
}

impl RateLimitConfig {
    pub fn from_env() -> Result<Self, SettingsError> {
        let config = Self {
            capacity: parse_env_var("PROXY_RATE_LIMIT_CAPACITY", default_capacity)?,
            refill_interval_secs: parse_env_var("PROXY_RATE_LIMIT_REFILL_SECS", default_refill_secs)?,
            idle_ttl_secs: parse_env_var("PROXY_RATE_LIMIT_IDLE_TTL_SECS", default_idle_ttl_secs)?,
            reap_interval_secs: parse_env_var(
                "PROXY_RATE_LIMIT_REAP_INTERVAL_SECS",
                default_reap_interval_secs,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// 0 값은 버킷이 영원히 비거나 리퍼가 바쁘게 도는 설정이므로 거부합니다.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let checks = [
            ("rate_limit.capacity", self.capacity as u64),
            ("rate_limit.refill_interval_secs", self.refill_interval_secs),
            ("rate_limit.idle_ttl_secs", self.idle_ttl_secs),
            ("rate_limit.reap_interval_secs", self.reap_interval_secs),
        ];

        for (name, value) in checks {
            if value == 0 {
                return Err(SettingsError::Invalid {
                    name: name.to_string(),
                    value: value.to_string(),
                    reason: "0보다 커야 합니다".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn refill_interval(&self) -> Duration {
        Duration::from_secs(self.refill_interval_secs)
    }

    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            refill_interval_secs: default_refill_secs(),
            idle_ttl_secs: default_idle_ttl_secs(),
            reap_interval_secs: default_reap_interval_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();

        assert_eq!(config.capacity, 10);
        assert_eq!(config.refill_interval(), Duration::from_secs(6));
        assert_eq!(config.idle_ttl(), Duration::from_secs(600));
        assert_eq!(config.reap_interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RateLimitConfig = toml::from_str("capacity = 3").unwrap();
        assert_eq!(config.capacity, 3);
        assert_eq!(config.refill_interval_secs, 6);
    }

    #[test]
    fn test_zero_values_rejected() {
        let config = RateLimitConfig {
            refill_interval_secs: 0,
            ..RateLimitConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
