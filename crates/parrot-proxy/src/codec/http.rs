//! Conversion between hyper messages and the message model.
//!
//! This is the transport boundary: inbound requests are decoded once when
//! they arrive, responses are encoded once when they leave, and outbound
//! requests are encoded for the upstream client.

use super::body::{decode_body, write_body, CONTENT_TYPE};
use crate::error::{ProxyError, Result};
use crate::model::key_values::{self, parse_form_urlencoded, Header};
use crate::model::{Cookie, HttpRequest, HttpResponse, NottableString, OutboundHttpRequest};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Request, Response, StatusCode, Version};
use tracing::{debug, warn};

/// Headers describing the framing of one hop. hyper writes its own, so the
/// model's copies are dropped when a message is encoded.
const FRAMING_HEADERS: &[&str] = &[
    "content-length",
    "transfer-encoding",
    "connection",
    "keep-alive",
];

/// Build an [`HttpRequest`] from the parts and collected body of an inbound request.
pub fn decode_request(
    parts: &hyper::http::request::Parts,
    body: &[u8],
    secure: bool,
) -> HttpRequest {
    let raw_path = parts.uri.path();
    let path = match urlencoding::decode(raw_path) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            debug!("Path '{}' is not valid percent-encoded UTF-8, keeping it raw", raw_path);
            raw_path.to_string()
        }
    };

    let headers = decode_headers(&parts.headers);
    let content_type = key_values::first_value(&headers, CONTENT_TYPE, true);

    HttpRequest {
        method: NottableString::string(parts.method.as_str()),
        path: NottableString::string(path),
        query_string_parameters: parts
            .uri
            .query()
            .map(parse_form_urlencoded)
            .unwrap_or_default(),
        cookies: decode_cookies(&parts.headers),
        body: decode_body(body, content_type),
        secure: Some(secure),
        keep_alive: Some(is_keep_alive(parts.version, &parts.headers)),
        headers,
    }
}

/// Collect an upstream response into an [`HttpResponse`].
///
/// `Set-Cookie` stays in the headers; cookies are not parsed out of it.
pub async fn decode_response(response: Response<Incoming>) -> Result<HttpResponse> {
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await?.to_bytes();
    let headers = decode_headers(&parts.headers);
    let body = decode_body(&bytes, key_values::first_value(&headers, CONTENT_TYPE, true));
    Ok(HttpResponse {
        status_code: Some(parts.status.as_u16()),
        headers,
        cookies: Vec::new(),
        body,
    })
}

/// Encode a response for the caller.
pub fn encode_response(response: &HttpResponse) -> Response<Full<Bytes>> {
    let mut headers = response.headers.clone();
    for cookie in &response.cookies {
        let already_set = key_values::find(&headers, "set-cookie", true).is_some_and(|h| {
            h.values.iter().any(|v| {
                v.value()
                    .is_some_and(|v| v.starts_with(&format!("{}=", cookie.name)))
            })
        });
        if !already_set {
            key_values::add_value(&mut headers, "Set-Cookie", &format_cookie(cookie), true);
        }
    }
    let bytes = write_body(response.body.as_ref(), &mut headers);

    let status = StatusCode::from_u16(response.status()).unwrap_or_else(|_| {
        warn!("Invalid status code {}, answering 500", response.status());
        StatusCode::INTERNAL_SERVER_ERROR
    });
    let mut encoded = Response::new(Full::new(bytes));
    *encoded.status_mut() = status;
    copy_headers(&headers, encoded.headers_mut());
    encoded
}

/// Encode a request for the upstream client.
pub fn encode_outbound_request(outbound: &OutboundHttpRequest) -> Result<Request<Full<Bytes>>> {
    let request = &outbound.request;
    let method = Method::from_bytes(request.method_str().as_bytes()).map_err(|e| {
        ProxyError::InvalidOutbound(format!("method '{}': {e}", request.method_str()))
    })?;
    let uri: hyper::Uri = outbound
        .uri()
        .parse()
        .map_err(|e| ProxyError::InvalidOutbound(format!("uri '{}': {e}", outbound.uri())))?;

    let mut headers = request.headers.clone();
    if !request.cookies.is_empty() && key_values::find(&headers, "cookie", true).is_none() {
        let cookie_header = request
            .cookies
            .iter()
            .map(format_cookie)
            .collect::<Vec<_>>()
            .join("; ");
        key_values::add_value(&mut headers, "Cookie", &cookie_header, true);
    }
    let bytes = write_body(request.body.as_ref(), &mut headers);

    let mut encoded = Request::new(Full::new(bytes));
    *encoded.method_mut() = method;
    *encoded.uri_mut() = uri;
    copy_headers(&headers, encoded.headers_mut());
    Ok(encoded)
}

fn decode_headers(map: &HeaderMap) -> Vec<Header> {
    let mut headers = Vec::new();
    for (name, value) in map.iter() {
        let value = String::from_utf8_lossy(value.as_bytes());
        key_values::add_value(&mut headers, name.as_str(), &value, true);
    }
    headers
}

fn decode_cookies(map: &HeaderMap) -> Vec<Cookie> {
    map.get_all(hyper::header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| Cookie::new(name, value.trim()))
        })
        .collect()
}

fn is_keep_alive(version: Version, headers: &HeaderMap) -> bool {
    let connection_has = |token: &str| {
        headers
            .get_all(hyper::header::CONNECTION)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|t| t.trim().eq_ignore_ascii_case(token))
    };
    if version == Version::HTTP_10 || version == Version::HTTP_09 {
        connection_has("keep-alive")
    } else {
        !connection_has("close")
    }
}

fn format_cookie(cookie: &Cookie) -> String {
    format!(
        "{}={}",
        cookie.name.value().unwrap_or(""),
        cookie.value.value().unwrap_or("")
    )
}

fn copy_headers(headers: &[Header], target: &mut HeaderMap) {
    for header in headers {
        let name = header.name_str();
        if FRAMING_HEADERS.iter().any(|f| f.eq_ignore_ascii_case(name)) {
            continue;
        }
        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            debug!("Dropping header with invalid name '{}'", name);
            continue;
        };
        for value in header.values.iter().filter_map(NottableString::value) {
            match HeaderValue::from_str(value) {
                Ok(header_value) => {
                    target.append(header_name.clone(), header_value);
                }
                Err(_) => debug!("Dropping invalid value for header '{}'", name),
            }
        }
    }
}
