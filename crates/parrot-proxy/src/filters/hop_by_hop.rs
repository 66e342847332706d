//! Hop-by-hop header stripping.

use super::RequestFilter;
use crate::model::HttpRequest;

/// Headers that only describe the inbound connection and must not reach the
/// upstream. `content-length` is deliberately absent: the body is forwarded.
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|hop| hop.eq_ignore_ascii_case(name))
}

/// Always runs first, for every request, and never short-circuits.
#[derive(Debug, Default, Clone, Copy)]
pub struct HopByHopHeaderFilter;

impl RequestFilter for HopByHopHeaderFilter {
    fn on_request(&self, mut request: HttpRequest) -> Option<HttpRequest> {
        request.headers.retain(|header| !is_hop_by_hop(header.name_str()));
        Some(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_exactly_hop_by_hop_headers() {
        let names = [
            "host",
            "some-other-header",
            "proxy-connection",
            "connection",
            "keep-alive",
            "transfer-encoding",
            "te",
            "trailer",
            "proxy-authorization",
            "proxy-authenticate",
            "upgrade",
        ];
        let request = names
            .iter()
            .fold(HttpRequest::new(), |request, name| request.with_header(name, "value"));

        let filtered = HopByHopHeaderFilter.on_request(request).unwrap();
        let remaining: Vec<&str> = filtered.headers.iter().map(|h| h.name_str()).collect();
        assert_eq!(remaining, vec!["host", "some-other-header"]);
    }

    #[test]
    fn test_is_case_insensitive_and_keeps_content_length() {
        let request = HttpRequest::new()
            .with_header("Connection", "close")
            .with_header("Transfer-Encoding", "chunked")
            .with_header("Content-Length", "12");
        let filtered = HopByHopHeaderFilter.on_request(request).unwrap();
        assert_eq!(filtered.headers.len(), 1);
        assert_eq!(filtered.first_header("content-length"), Some("12"));
    }
}
