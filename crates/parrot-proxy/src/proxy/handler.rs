//! One proxy cycle: control dispatch, filters, forwarding and logging.

use super::client::OutboundClient;
use crate::codec::http::{decode_request, encode_response};
use crate::control::{handle_control, text_response, ControlRoute};
use crate::error::Result;
use crate::filters::Filters;
use crate::metrics;
use crate::model::{HttpRequest, HttpResponse, OutboundHttpRequest};
use crate::recording::RequestLog;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Shared state of every connection on one listener.
pub struct ProxyHandler {
    log: Arc<RequestLog>,
    filters: Arc<Filters>,
    client: Arc<dyn OutboundClient>,
}

impl ProxyHandler {
    pub fn new(
        log: Arc<RequestLog>,
        filters: Arc<Filters>,
        client: Arc<dyn OutboundClient>,
    ) -> Self {
        Self { log, filters, client }
    }

    pub fn log(&self) -> &Arc<RequestLog> {
        &self.log
    }

    /// hyper service entry point. Never fails: every error becomes a response.
    pub async fn handle(
        &self,
        req: Request<Incoming>,
        secure: bool,
    ) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
        let (parts, body) = req.into_parts();
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                error!("Failed to read body of {} {}: {}", parts.method, parts.uri, e);
                return Ok(text_response(StatusCode::BAD_REQUEST, "Failed to read request body"));
            }
        };

        if let Some(route) = ControlRoute::parse(&parts.method, parts.uri.path()) {
            return Ok(handle_control(route, parts.uri.query(), &bytes, &self.log));
        }

        let request = decode_request(&parts, &bytes, secure);
        let method = request.method_str().to_string();
        let response = match self.proxy(request).await {
            Ok(response) => encode_response(&response),
            Err(e) => text_response(e.status_code(), e.to_string()),
        };
        metrics::record_request(&method, response.status().as_u16());
        Ok(response)
    }

    /// Run a decoded request through the filters and the upstream.
    ///
    /// A request dropped by a request filter is answered with 404 and still
    /// logged, as received. A request that cannot be forwarded is an error
    /// and is not logged.
    pub async fn proxy(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!("Received request: {} {}", request.method_str(), request.path_str());

        let Some(filtered) = self.filters.apply_on_request_filters(request.clone()) else {
            metrics::record_short_circuit();
            let response = HttpResponse::not_found();
            self.log.add(request, response.clone());
            return Ok(response);
        };

        let outbound = OutboundHttpRequest::from_request(filtered).map_err(|e| {
            error!("Cannot forward {} {}: {}", request.method_str(), request.path_str(), e);
            e
        })?;

        let start = Instant::now();
        let upstream = self.client.send(&outbound).await.map_err(|e| {
            error!("Failed to forward request to upstream: {}", e);
            e
        })?;
        metrics::record_upstream_duration(
            outbound.request.method_str(),
            upstream.status(),
            start.elapsed().as_secs_f64() * 1000.0,
        );

        let response = self.filters.apply_on_response_filters(&outbound.request, upstream);
        self.log.add(outbound.request, response.clone());
        Ok(response)
    }
}
