#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use vhost_proxy::logging::{AccessLog, LogRecord};

/// 받은 요청을 헤더로 되돌려주는 테스트용 백엔드
pub struct EchoBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl EchoBackend {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let counter = counter.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        echo(req)
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self { addr, hits, task }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for EchoBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn echo(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };

    let method = req.method().to_string();
    let uri = req.uri().to_string();
    let host = header("host");
    let forwarded_for = header("x-forwarded-for");
    let custom = header("x-custom");
    let connection_hop = header("x-hop");

    let body = req.into_body().collect().await.map(|c| c.to_bytes()).unwrap_or_default();

    let response = Response::builder()
        .status(StatusCode::CREATED)
        .header("x-echo-method", method)
        .header("x-echo-uri", uri)
        .header("x-echo-host", host)
        .header("x-echo-forwarded-for", forwarded_for)
        .header("x-echo-custom", custom)
        .header("x-echo-hop", connection_hop)
        .header("x-backend", "echo")
        .body(Full::new(body))
        .unwrap();
    Ok(response)
}

/// 닫힌 포트 주소 (연결 거부용)
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// 메모리에 레코드를 쌓는 접근 로그
#[derive(Default)]
pub struct MemoryAccessLog {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryAccessLog {
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl AccessLog for MemoryAccessLog {
    fn append(&self, record: &LogRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

pub fn peer() -> SocketAddr {
    "192.0.2.10:50000".parse().unwrap()
}

pub fn request(host: &str, method: &str, uri: &str, body: impl Into<Bytes>) -> Request<Full<Bytes>> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Host", host)
        .body(Full::new(body.into()))
        .unwrap()
}

pub async fn body_bytes<B>(body: B) -> Bytes
where
    B: hyper::body::Body,
    B::Error: std::fmt::Debug,
{
    body.collect().await.unwrap().to_bytes()
}
