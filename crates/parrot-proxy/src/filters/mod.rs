//! Request and response filters applied around forwarding.
//!
//! Filters are registered against a request pattern and run in registration
//! order for every proxied request matching that pattern. The registry is a
//! plain list scanned on each cycle; filters are operator-configured and
//! few, so no index is kept.

mod hop_by_hop;

pub use hop_by_hop::{is_hop_by_hop, HopByHopHeaderFilter, HOP_BY_HOP_HEADERS};

use crate::model::{HttpRequest, HttpResponse};
use crate::predicate::HttpRequestMatcher;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Rewrites a request before it is forwarded.
///
/// Returning `None` stops the pipeline: no later filter runs, nothing is
/// forwarded and the caller answers with 404.
pub trait RequestFilter: Send + Sync {
    fn on_request(&self, request: HttpRequest) -> Option<HttpRequest>;
}

/// Rewrites the upstream response before it is returned and logged.
pub trait ResponseFilter: Send + Sync {
    fn on_response(&self, request: &HttpRequest, response: HttpResponse) -> HttpResponse;
}

impl<F> RequestFilter for F
where
    F: Fn(HttpRequest) -> Option<HttpRequest> + Send + Sync,
{
    fn on_request(&self, request: HttpRequest) -> Option<HttpRequest> {
        self(request)
    }
}

impl<F> ResponseFilter for F
where
    F: Fn(&HttpRequest, HttpResponse) -> HttpResponse + Send + Sync,
{
    fn on_response(&self, request: &HttpRequest, response: HttpResponse) -> HttpResponse {
        self(request, response)
    }
}

#[derive(Clone)]
enum Filter {
    Request(Arc<dyn RequestFilter>),
    Response(Arc<dyn ResponseFilter>),
}

#[derive(Clone)]
struct Registration {
    matcher: HttpRequestMatcher,
    filter: Filter,
}

/// Ordered `(pattern, filter)` registrations.
#[derive(Clone, Default)]
pub struct Filters {
    registrations: Vec<Registration>,
}

impl fmt::Debug for Filters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (requests, responses) =
            self.registrations
                .iter()
                .fold((0, 0), |(req, resp), r| match r.filter {
                    Filter::Request(_) => (req + 1, resp),
                    Filter::Response(_) => (req, resp + 1),
                });
        f.debug_struct("Filters")
            .field("request_filters", &requests)
            .field("response_filters", &responses)
            .finish()
    }
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_filter(
        mut self,
        pattern: HttpRequest,
        filter: impl RequestFilter + 'static,
    ) -> Self {
        self.add_request_filter(pattern, filter);
        self
    }

    pub fn with_response_filter(
        mut self,
        pattern: HttpRequest,
        filter: impl ResponseFilter + 'static,
    ) -> Self {
        self.add_response_filter(pattern, filter);
        self
    }

    pub fn add_request_filter(
        &mut self,
        pattern: HttpRequest,
        filter: impl RequestFilter + 'static,
    ) {
        self.registrations.push(Registration {
            matcher: HttpRequestMatcher::new(&pattern),
            filter: Filter::Request(Arc::new(filter)),
        });
    }

    pub fn add_response_filter(
        &mut self,
        pattern: HttpRequest,
        filter: impl ResponseFilter + 'static,
    ) {
        self.registrations.push(Registration {
            matcher: HttpRequestMatcher::new(&pattern),
            filter: Filter::Response(Arc::new(filter)),
        });
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Run the hop-by-hop filter, then every matching request filter.
    ///
    /// Which filters apply is decided once, against the request as it leaves
    /// the hop-by-hop filter; a filter that rewrites the request does not
    /// change which later filters run.
    pub fn apply_on_request_filters(&self, request: HttpRequest) -> Option<HttpRequest> {
        let request = HopByHopHeaderFilter.on_request(request)?;
        let applicable: Vec<&Arc<dyn RequestFilter>> = self
            .registrations
            .iter()
            .filter_map(|registration| match &registration.filter {
                Filter::Request(filter) if registration.matcher.matches(&request) => Some(filter),
                _ => None,
            })
            .collect();

        let mut current = request;
        for (index, filter) in applicable.into_iter().enumerate() {
            match filter.on_request(current) {
                Some(next) => current = next,
                None => {
                    debug!("Request filter {} short-circuited the pipeline", index);
                    return None;
                }
            }
        }
        Some(current)
    }

    /// Run every response filter whose pattern matches `request`, each one
    /// receiving the previous filter's output.
    pub fn apply_on_response_filters(
        &self,
        request: &HttpRequest,
        response: HttpResponse,
    ) -> HttpResponse {
        self.registrations
            .iter()
            .filter(|registration| registration.matcher.matches(request))
            .fold(response, |response, registration| match &registration.filter {
                Filter::Response(filter) => filter.on_response(request, response),
                Filter::Request(_) => response,
            })
    }
}
