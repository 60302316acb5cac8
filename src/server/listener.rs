use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use crate::{settings::Settings, tls};
use tracing::{error, info};
use super::{handler::Dispatcher, Error, Result};

/// 단일 포트 리스너. TLS가 설정되면 디스패처에 넘기기 전에 암호화를 종료합니다.
pub struct ServerListener {
    listener: TcpListener,
    tls: Option<TlsAcceptor>,
}

impl ServerListener {
    pub async fn new(settings: &Settings) -> Result<Self> {
        let tls = if settings.tls.enabled {
            let (cert_path, key_path) = match (&settings.tls.cert_path, &settings.tls.key_path) {
                (Some(cert), Some(key)) => (cert, key),
                _ => return Err(Error::Tls("TLS 인증서와 개인키 경로가 필요합니다".to_string())),
            };
            let acceptor = tls::load_acceptor(cert_path, key_path)
                .map_err(|e| Error::Tls(e.to_string()))?;
            Some(acceptor)
        } else {
            None
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.port));
        Self::bind(addr, tls).await
    }

    pub async fn bind(addr: SocketAddr, tls: Option<TlsAcceptor>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            error!(error = %e, addr = %addr, "포트 바인딩 실패");
            Error::Bind { addr, source: e }
        })?;

        info!(addr = %addr, tls = tls.is_some(), "리스너 시작");
        Ok(Self { listener, tls })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// `shutdown`이 끝날 때까지 연결을 수락합니다. 연결마다 태스크 하나를 띄웁니다.
    pub async fn run<F>(self, dispatcher: Arc<Dispatcher>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("리스너 종료");
                    return Ok(());
                }
                result = self.listener.accept() => {
                    let (stream, peer) = match result {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            error!(error = %e, "연결 수락 실패");
                            continue;
                        }
                    };

                    let dispatcher = dispatcher.clone();
                    match &self.tls {
                        None => {
                            tokio::spawn(async move {
                                if let Err(err) = dispatcher.handle_connection(TokioIo::new(stream), peer).await {
                                    error!(error = %err, peer = %peer, "HTTP 연결 처리 실패");
                                }
                            });
                        }
                        Some(acceptor) => {
                            let acceptor = acceptor.clone();
                            tokio::spawn(async move {
                                match acceptor.accept(stream).await {
                                    Ok(tls_stream) => {
                                        if let Err(err) = dispatcher.handle_connection(TokioIo::new(tls_stream), peer).await {
                                            error!(error = %err, peer = %peer, "HTTPS 연결 처리 실패");
                                        }
                                    }
                                    Err(e) => {
                                        error!(error = %e, peer = %peer, "TLS 핸드쉐이크 실패");
                                    }
                                }
                            });
                        }
                    }
                }
            }
        }
    }
}
