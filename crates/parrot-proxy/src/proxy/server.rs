//! Listeners: the proxy/control listener and the metrics listener.

use super::handler::ProxyHandler;
use crate::control::{build_response_with_headers, status_response};
use crate::metrics::collect_metrics;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Accepts plaintext HTTP/1.1 connections and runs every request through a
/// [`ProxyHandler`].
pub struct ProxyServer {
    listener: TcpListener,
    handler: Arc<ProxyHandler>,
}

impl ProxyServer {
    /// Bind the listener. Port 0 picks a free port; see [`Self::local_addr`].
    pub async fn bind(addr: SocketAddr, handler: Arc<ProxyHandler>) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, handler })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> Result<(), anyhow::Error> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves. Connections already accepted finish
    /// on their own tasks.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<(), anyhow::Error> {
        info!("Parrot proxy listening on http://{}", self.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            let (stream, remote_addr) = tokio::select! {
                accepted = self.listener.accept() => accepted?,
                () = &mut shutdown => {
                    info!("Proxy listener shutting down");
                    return Ok(());
                }
            };
            let io = TokioIo::new(stream);
            let handler = Arc::clone(&self.handler);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let handler = Arc::clone(&handler);
                    async move { handler.handle(req, false).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Error serving connection from {}: {}", remote_addr, err);
                }
            });
        }
    }
}

/// Serves Prometheus text on `GET /metrics`.
pub struct MetricsServer {
    listener: TcpListener,
}

impl MetricsServer {
    pub async fn bind(addr: SocketAddr) -> Result<Self, anyhow::Error> {
        Ok(Self {
            listener: TcpListener::bind(addr).await?,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> Result<(), anyhow::Error> {
        info!("Metrics listening on http://{}/metrics", self.local_addr()?);
        loop {
            let (stream, _) = self.listener.accept().await?;
            let io = TokioIo::new(stream);

            tokio::spawn(async move {
                let service = service_fn(|req: hyper::Request<hyper::body::Incoming>| async move {
                    let is_metrics =
                        *req.method() == Method::GET && req.uri().path() == "/metrics";
                    let response = if is_metrics {
                        build_response_with_headers(
                            StatusCode::OK,
                            [("Content-Type", "text/plain; version=0.0.4")],
                            collect_metrics(),
                        )
                    } else {
                        status_response(StatusCode::NOT_FOUND)
                    };
                    Ok::<_, Infallible>(response)
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Metrics connection error: {}", e);
                }
            });
        }
    }
}
