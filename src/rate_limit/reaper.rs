use std::sync::Weak;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::RateLimiter;

/// 실행 중인 리퍼 태스크의 핸들
///
/// 리퍼는 속도 제한기에 대한 약한 참조만 가지므로 제한기가 해제되면 스스로 끝납니다.
/// `stop` 없이 핸들을 버리면 태스크는 중단(abort)됩니다.
#[derive(Debug)]
pub struct ReaperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ReaperHandle {
    pub(super) fn spawn(limiter: Weak<RateLimiter>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            // 첫 실행은 한 주기 뒤
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let Some(limiter) = limiter.upgrade() else {
                            break;
                        };
                        let removed = limiter.reap().await;
                        if removed > 0 {
                            info!(removed = removed, "유휴 클라이언트 버킷 정리");
                        }
                    }
                }
            }
            debug!("리퍼 태스크 종료");
        });

        Self {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// 리퍼에 종료를 알리고 태스크가 끝날 때까지 기다립니다.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }
}

impl Drop for ReaperHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
