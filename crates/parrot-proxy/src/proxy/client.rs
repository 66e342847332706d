//! Outbound HTTP client.
//!
//! The proxy only depends on [`OutboundClient`]; the hyper client below is
//! the production implementation, with connection pooling and rustls for
//! `https` upstreams.

use crate::codec::http::{decode_response, encode_outbound_request};
use crate::config::ConnectionPoolConfig;
use crate::error::{ProxyError, Result};
use crate::model::{HttpResponse, OutboundHttpRequest};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Full;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sends one forwarded request and returns the upstream's response.
#[async_trait]
pub trait OutboundClient: Send + Sync {
    async fn send(&self, request: &OutboundHttpRequest) -> Result<HttpResponse>;
}

/// Type alias for the HTTP client used by the proxy.
pub type HttpClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, Full<Bytes>>;

/// Create a shared HTTP client with connection pooling.
pub fn create_http_client(pool: &ConnectionPoolConfig) -> HttpClient {
    // Both ring and aws-lc-rs are linked; pick one explicitly. An error only
    // means a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut http_connector = HttpConnector::new();
    http_connector.set_keepalive(Some(Duration::from_secs(pool.keepalive_timeout_secs)));
    http_connector.set_connect_timeout(Some(Duration::from_secs(pool.connect_timeout_secs)));
    http_connector.enforce_http(false);

    let builder = match hyper_rustls::HttpsConnectorBuilder::new().with_native_roots() {
        Ok(builder) => builder,
        Err(e) => {
            warn!("No native root certificates ({}), https upstreams will fail verification", e);
            let tls_config = rustls::ClientConfig::builder()
                .with_root_certificates(rustls::RootCertStore::empty())
                .with_no_client_auth();
            hyper_rustls::HttpsConnectorBuilder::new().with_tls_config(tls_config)
        }
    };
    let https_connector = builder.https_or_http().enable_http1().wrap_connector(http_connector);

    let http_client = Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(pool.idle_timeout_secs))
        .pool_max_idle_per_host(pool.max_idle_per_host)
        .build(https_connector);

    info!(
        "Connection pool configured (HTTP/1.1): max_idle={}, idle_timeout={}s, keepalive={}s",
        pool.max_idle_per_host, pool.idle_timeout_secs, pool.keepalive_timeout_secs
    );

    http_client
}

/// [`OutboundClient`] backed by the pooled hyper client.
#[derive(Clone)]
pub struct HyperOutboundClient {
    client: HttpClient,
}

impl HyperOutboundClient {
    pub fn new(pool: &ConnectionPoolConfig) -> Self {
        Self {
            client: create_http_client(pool),
        }
    }
}

#[async_trait]
impl OutboundClient for HyperOutboundClient {
    async fn send(&self, request: &OutboundHttpRequest) -> Result<HttpResponse> {
        let encoded = encode_outbound_request(request)?;
        debug!("Forwarding to: {}", encoded.uri());
        let response = self
            .client
            .request(encoded)
            .await
            .map_err(|e| ProxyError::Upstream(format!("{}: {e}", request.uri())))?;
        decode_response(response).await
    }
}
