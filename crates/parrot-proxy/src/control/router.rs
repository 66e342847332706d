//! Control path dispatch.
//!
//! Control requests are `PUT`s to a fixed set of paths. They never reach the
//! filter pipeline or the upstream; they only read or mutate the request log.

use super::types::{json_response, status_response, text_response};
use crate::error::Result;
use crate::model::key_values::{self, parse_form_urlencoded};
use crate::model::{HttpRequest, Verification, VerificationSequence};
use crate::recording::{DumpFormat, RequestLog};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Method, Response, StatusCode};
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRoute {
    Status,
    Clear,
    Reset,
    DumpToLog,
    Retrieve,
    Verify,
    VerifySequence,
    Stop,
}

impl ControlRoute {
    /// Resolve a control route; `None` means the request is to be forwarded.
    pub fn parse(method: &Method, path: &str) -> Option<Self> {
        if *method != Method::PUT {
            return None;
        }
        match path {
            "/status" => Some(ControlRoute::Status),
            "/clear" => Some(ControlRoute::Clear),
            "/reset" => Some(ControlRoute::Reset),
            "/dumpToLog" => Some(ControlRoute::DumpToLog),
            "/retrieve" => Some(ControlRoute::Retrieve),
            "/verify" => Some(ControlRoute::Verify),
            "/verifySequence" => Some(ControlRoute::VerifySequence),
            "/stop" => Some(ControlRoute::Stop),
            _ => None,
        }
    }
}

/// Run a control route. Any failure is answered with 400.
pub fn handle_control(
    route: ControlRoute,
    query: Option<&str>,
    body: &[u8],
    log: &RequestLog,
) -> Response<Full<Bytes>> {
    debug!("Control request: {:?}", route);
    match dispatch(route, query, body, log) {
        Ok(response) => response,
        Err(e) => {
            error!("Exception processing control request {:?}: {}", route, e);
            text_response(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

fn dispatch(
    route: ControlRoute,
    query: Option<&str>,
    body: &[u8],
    log: &RequestLog,
) -> Result<Response<Full<Bytes>>> {
    let response = match route {
        ControlRoute::Status => status_response(StatusCode::OK),
        ControlRoute::Clear => {
            log.clear(request_pattern(body)?.as_ref());
            status_response(StatusCode::ACCEPTED)
        }
        ControlRoute::Reset => {
            log.reset();
            status_response(StatusCode::ACCEPTED)
        }
        ControlRoute::DumpToLog => {
            let format = dump_format(query);
            log.dump_to_log(request_pattern(body)?.as_ref(), format);
            status_response(StatusCode::ACCEPTED)
        }
        ControlRoute::Retrieve => {
            let requests = log.retrieve(request_pattern(body)?.as_ref());
            json_response(StatusCode::OK, &requests)
        }
        ControlRoute::Verify => {
            let verification: Verification = serde_json::from_slice(body)?;
            verification_response(log.verify(&verification))
        }
        ControlRoute::VerifySequence => {
            let sequence: VerificationSequence = serde_json::from_slice(body)?;
            verification_response(log.verify_sequence(&sequence))
        }
        ControlRoute::Stop => status_response(StatusCode::NOT_IMPLEMENTED),
    };
    Ok(response)
}

/// An empty body means "no pattern".
fn request_pattern(body: &[u8]) -> Result<Option<HttpRequest>> {
    Ok(HttpRequest::from_json(&String::from_utf8_lossy(body))?)
}

fn dump_format(query: Option<&str>) -> DumpFormat {
    query
        .map(parse_form_urlencoded)
        .and_then(|parameters| {
            key_values::first_value(&parameters, "type", false).map(str::to_string)
        })
        .and_then(|value| value.parse().ok())
        .unwrap_or_default()
}

fn verification_response(message: String) -> Response<Full<Bytes>> {
    if message.is_empty() {
        status_response(StatusCode::ACCEPTED)
    } else {
        text_response(StatusCode::NOT_ACCEPTABLE, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HttpResponse;
    use http_body_util::BodyExt;

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn log_with(paths: &[&str]) -> RequestLog {
        let log = RequestLog::new();
        for path in paths {
            log.add(
                HttpRequest::new().with_method("GET").with_path(*path),
                HttpResponse::new(),
            );
        }
        log
    }

    #[test]
    fn test_route_parse() {
        assert_eq!(ControlRoute::parse(&Method::PUT, "/status"), Some(ControlRoute::Status));
        assert_eq!(
            ControlRoute::parse(&Method::PUT, "/verifySequence"),
            Some(ControlRoute::VerifySequence)
        );
        assert_eq!(ControlRoute::parse(&Method::GET, "/status"), None);
        assert_eq!(ControlRoute::parse(&Method::PUT, "/status/extra"), None);
        assert_eq!(ControlRoute::parse(&Method::PUT, "/api/users"), None);
    }

    #[test]
    fn test_status_and_stop() {
        let log = RequestLog::new();
        assert_eq!(handle_control(ControlRoute::Status, None, b"", &log).status(), StatusCode::OK);
        assert_eq!(
            handle_control(ControlRoute::Stop, None, b"", &log).status(),
            StatusCode::NOT_IMPLEMENTED
        );
    }

    #[tokio::test]
    async fn test_retrieve_and_clear() {
        let log = log_with(&["/a", "/b", "/a"]);

        let response = handle_control(ControlRoute::Retrieve, None, br#"{"path": "/a"}"#, &log);
        assert_eq!(response.status(), StatusCode::OK);
        let requests: Vec<HttpRequest> = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(requests.len(), 2);

        let response = handle_control(ControlRoute::Clear, None, br#"{"path": "/a"}"#, &log);
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(log.len(), 1);

        let response = handle_control(ControlRoute::Retrieve, None, b"", &log);
        let requests: Vec<HttpRequest> = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path_str(), "/b");

        assert_eq!(
            handle_control(ControlRoute::Reset, None, b"", &log).status(),
            StatusCode::ACCEPTED
        );
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_verify() {
        let log = log_with(&["/a", "/a"]);
        let twice = br#"{"httpRequest": {"path": "/a"}, "times": {"atLeast": 2, "atMost": 2}}"#;
        assert_eq!(
            handle_control(ControlRoute::Verify, None, twice, &log).status(),
            StatusCode::ACCEPTED
        );

        let once = br#"{"httpRequest": {"path": "/a"}, "times": {"atLeast": 1, "atMost": 1}}"#;
        let response = handle_control(ControlRoute::Verify, None, once, &log);
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
        assert!(body_text(response).await.starts_with("Request not found exactly once"));
    }

    #[tokio::test]
    async fn test_verify_sequence() {
        let log = log_with(&["/a", "/b", "/c"]);
        let in_order = br#"{"httpRequests": [{"path": "/a"}, {"path": "/c"}]}"#;
        assert_eq!(
            handle_control(ControlRoute::VerifySequence, None, in_order, &log).status(),
            StatusCode::ACCEPTED
        );

        let reversed = br#"{"httpRequests": [{"path": "/c"}, {"path": "/a"}]}"#;
        let response = handle_control(ControlRoute::VerifySequence, None, reversed, &log);
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
        assert!(body_text(response).await.contains("position 1"));
    }

    #[test]
    fn test_invalid_payload_is_bad_request() {
        let log = RequestLog::new();
        let response = handle_control(ControlRoute::Verify, None, b"{not json", &log);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = handle_control(ControlRoute::Retrieve, None, b"[1, 2", &log);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_dump_format_from_query() {
        assert_eq!(dump_format(Some("type=java")), DumpFormat::Java);
        assert_eq!(dump_format(Some("type=json")), DumpFormat::Json);
        assert_eq!(dump_format(Some("other=1")), DumpFormat::Json);
        assert_eq!(dump_format(None), DumpFormat::Json);
    }

    #[test]
    fn test_dump_to_log_accepted() {
        let log = log_with(&["/a"]);
        let response = handle_control(ControlRoute::DumpToLog, Some("type=java"), b"", &log);
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
}
