use std::path::Path;
use std::sync::Arc;

use hyper::body::Bytes;
use tracing::{error, info, warn};

use vhost_proxy::{
    logging::{self, FileAccessLog},
    rate_limit::RateLimiter,
    routing::RouteTable,
    server::{Dispatcher, Error, Result, ServerListener},
    settings::{self, Settings},
};

async fn load_not_found_page(path: &Path) -> Option<Bytes> {
    match tokio::fs::read(path).await {
        Ok(page) => Some(Bytes::from(page)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "404 페이지를 불러올 수 없음");
            None
        }
    }
}

async fn run(settings: Settings) -> Result<()> {
    let entries = settings::load_route_file(&settings.server.routes_file).await?;
    let routes = Arc::new(RouteTable::build(entries));
    info!(count = routes.len(), "라우팅 테이블 생성 완료");

    let (access_log, _access_log_guard) =
        FileAccessLog::open(&settings.server.access_log).map_err(Error::AccessLog)?;

    let (rate_limiter, reaper) = RateLimiter::start(settings.rate_limit.clone());

    let mut dispatcher = Dispatcher::new(routes, rate_limiter, Arc::new(access_log))
        .with_max_body_bytes(settings.server.max_body_bytes);
    if let Some(page) = load_not_found_page(&settings.server.not_found_page).await {
        dispatcher = dispatcher.with_not_found(move || page.clone());
    }

    let listener = ServerListener::new(&settings).await?;
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "종료 시그널 대기 실패");
        }
    };

    let result = listener.run(Arc::new(dispatcher), shutdown).await;
    reaper.stop().await;
    result
}

#[tokio::main]
async fn main() {
    let settings = match Settings::load().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("설정 로드 실패: {}", e);
            std::process::exit(1);
        }
    };

    let log_guard = match logging::init_logging(&settings.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("로깅 초기화 실패: {}", e);
            std::process::exit(1);
        }
    };

    let result = run(settings).await;
    if let Err(e) = &result {
        error!(error = %e, "서버 실행 실패");
    }

    // 종료 전에 남은 로그를 기록
    drop(log_guard);
    if result.is_err() {
        std::process::exit(1);
    }
}
