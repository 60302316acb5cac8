use std::convert::Infallible;
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use bytes::Bytes;
use hyper::body::Body;
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::logging::{AccessLog, LogRecord};
use crate::proxy::{self, ForwardingProxy, ProxyBody};
use crate::rate_limit::RateLimiter;
use crate::routing::{request_host, RouteTable};
use crate::settings::DEFAULT_MAX_BODY_BYTES;

/// 라우트가 없을 때 응답할 본문을 만드는 함수
pub type NotFoundBody = Arc<dyn Fn() -> Bytes + Send + Sync>;

/// 요청 하나를 본문 제한 → 속도 제한 → 접근 로그 → 라우팅 → 전달 순으로 처리합니다.
pub struct Dispatcher {
    routes: Arc<RouteTable>,
    rate_limiter: Arc<RateLimiter>,
    access_log: Arc<dyn AccessLog>,
    proxy: ForwardingProxy,
    not_found: Option<NotFoundBody>,
    max_body_bytes: usize,
}

impl Dispatcher {
    pub fn new(
        routes: Arc<RouteTable>,
        rate_limiter: Arc<RateLimiter>,
        access_log: Arc<dyn AccessLog>,
    ) -> Self {
        Self {
            routes,
            rate_limiter,
            access_log,
            proxy: ForwardingProxy::new(),
            not_found: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_not_found<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> Bytes + Send + Sync + 'static,
    {
        self.not_found = Some(Arc::new(supplier));
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    #[instrument(skip_all, fields(request_id = %Uuid::new_v4(), method = %req.method(), peer = %peer))]
    pub async fn handle<B>(&self, req: Request<B>, peer: SocketAddr) -> Response<ProxyBody>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        // 1. 본문 크기 제한
        let req = match self.read_body(req).await {
            Ok(req) => req,
            Err(status) => return proxy::status_response(status),
        };

        // 2-3. 속도 제한
        let client = self.rate_limiter.extract_identity(req.headers(), peer);
        if !self.rate_limiter.allow(&client).await {
            debug!(client = %client, "요청 속도 제한 초과");
            return proxy::status_response(StatusCode::TOO_MANY_REQUESTS);
        }

        // 4. 접근 로그
        let host = request_host(&req).to_string();
        let record = LogRecord::from_request(&req, &host, &client);
        info!(host = %host, client = %client, url = %record.url_path, "요청 수신");
        self.access_log.append(&record);

        // 5-7. 라우팅 후 전달, 없으면 404
        match self.routes.lookup(&host) {
            Some(route) => self.proxy.forward(route, req, peer).await,
            None => self.not_found_response(),
        }
    }

    /// 제한 크기까지 본문을 읽어 버퍼링된 요청으로 바꿉니다.
    async fn read_body<B>(&self, req: Request<B>) -> Result<Request<Full<Bytes>>, StatusCode>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let declared = req
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        if declared.is_some_and(|len| len > self.max_body_bytes as u64) {
            warn!(content_length = ?declared, limit = self.max_body_bytes, "요청 본문이 너무 큼");
            return Err(StatusCode::PAYLOAD_TOO_LARGE);
        }

        let (parts, body) = req.into_parts();
        match Limited::new(body, self.max_body_bytes).collect().await {
            Ok(collected) => Ok(Request::from_parts(parts, Full::new(collected.to_bytes()))),
            Err(e) if e.is::<LengthLimitError>() => {
                warn!(limit = self.max_body_bytes, "요청 본문이 너무 큼");
                Err(StatusCode::PAYLOAD_TOO_LARGE)
            }
            Err(e) => {
                debug!(error = %e, "요청 본문 읽기 실패");
                Err(StatusCode::BAD_REQUEST)
            }
        }
    }

    fn not_found_response(&self) -> Response<ProxyBody> {
        let body = match &self.not_found {
            Some(supplier) => proxy::full(supplier()),
            None => proxy::empty(),
        };

        let mut response = Response::new(body);
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        *response.status_mut() = StatusCode::NOT_FOUND;
        response
    }

    /// 연결 하나에서 들어오는 요청들을 처리합니다.
    ///
    /// 클라이언트가 연결을 끊으면 진행 중인 요청 future가 해제되며 백엔드 호출도 함께 중단됩니다.
    pub async fn handle_connection<I>(
        self: Arc<Self>,
        io: I,
        peer: SocketAddr,
    ) -> Result<(), hyper::Error>
    where
        I: hyper::rt::Read + hyper::rt::Write + Send + Unpin + 'static,
    {
        let service = service_fn(move |req| {
            let dispatcher = self.clone();
            async move { Ok::<_, Infallible>(dispatcher.handle(req, peer).await) }
        });

        http1::Builder::new().serve_connection(io, service).await
    }
}
