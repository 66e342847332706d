//! Field-by-field request matching.
//!
//! A pattern is an [`HttpRequest`] in which every unset field is a wildcard.
//! Method and path use regex matching; headers and query parameters are
//! subset matches (every expected entry must be found, extra actual entries
//! are ignored); header names are case-insensitive.

use super::body_matcher::BodyMatcher;
use super::not::apply_not;
use super::string_matcher::RegexStringMatcher;
use super::validator::{BodyValidator, StandardValidator};
use crate::model::{Cookie, HttpRequest, KeyToMultiValue, NottableString};
use std::sync::Arc;
use tracing::trace;

/// Compiled request pattern.
#[derive(Debug, Clone)]
pub struct HttpRequestMatcher {
    pattern: HttpRequest,
    method: RegexStringMatcher,
    path: RegexStringMatcher,
    query_string_parameters: Vec<MultiValueMatcher>,
    headers: Vec<MultiValueMatcher>,
    cookies: Vec<CookieMatcher>,
    body: Option<BodyMatcher>,
}

impl HttpRequestMatcher {
    pub fn new(pattern: &HttpRequest) -> Self {
        Self::with_validator(pattern, Arc::new(StandardValidator))
    }

    pub fn with_validator(pattern: &HttpRequest, validator: Arc<dyn BodyValidator>) -> Self {
        Self {
            pattern: pattern.clone(),
            method: RegexStringMatcher::new(pattern.method.clone()),
            path: RegexStringMatcher::new(pattern.path.clone()),
            query_string_parameters: pattern
                .query_string_parameters
                .iter()
                .map(|entry| MultiValueMatcher::compile(entry, false))
                .collect(),
            headers: pattern
                .headers
                .iter()
                .map(|entry| MultiValueMatcher::compile(entry, true))
                .collect(),
            cookies: pattern.cookies.iter().map(CookieMatcher::compile).collect(),
            body: pattern
                .body
                .clone()
                .map(|body| BodyMatcher::with_validator(body, Arc::clone(&validator))),
        }
    }

    pub fn matches(&self, request: &HttpRequest) -> bool {
        let method = self.method.matches(request.method.value());
        let path = self.path.matches(request.path.value());
        let query = self
            .query_string_parameters
            .iter()
            .all(|m| m.matches(&request.query_string_parameters));
        let headers = self.headers.iter().all(|m| m.matches(&request.headers));
        let cookies = self.cookies.iter().all(|m| m.matches(&request.cookies));
        let body = self
            .body
            .as_ref()
            .map_or(true, |m| m.matches(request.body.as_ref()));
        let secure = flag_matches(self.pattern.secure, request.secure);
        let keep_alive = flag_matches(self.pattern.keep_alive, request.keep_alive);

        let result = method && path && query && headers && cookies && body && secure && keep_alive;
        if !result {
            trace!(
                "Request {} {} did not match: method={} path={} query={} headers={} cookies={} body={} secure={} keepAlive={}",
                request.method,
                request.path,
                method,
                path,
                query,
                headers,
                cookies,
                body,
                secure,
                keep_alive
            );
        }
        result
    }
}

fn flag_matches(expected: Option<bool>, actual: Option<bool>) -> bool {
    expected.map_or(true, |expected| actual.unwrap_or(false) == expected)
}

/// One expected header or query parameter.
///
/// A negated name requires that no entry with that name exists. Otherwise
/// an entry with a matching name must carry a match for every expected value.
#[derive(Debug, Clone)]
struct MultiValueMatcher {
    name: RegexStringMatcher,
    name_not: bool,
    values: Vec<RegexStringMatcher>,
}

impl MultiValueMatcher {
    fn compile(entry: &KeyToMultiValue, ignore_case: bool) -> Self {
        let name = NottableString::from(entry.name.value().map(str::to_string));
        let name = if ignore_case {
            RegexStringMatcher::case_insensitive(name)
        } else {
            RegexStringMatcher::new(name)
        };
        Self {
            name,
            name_not: entry.name.is_not(),
            values: entry.values.iter().cloned().map(RegexStringMatcher::new).collect(),
        }
    }

    fn matches(&self, actual: &[KeyToMultiValue]) -> bool {
        let mut candidates = actual
            .iter()
            .filter(|candidate| self.name.matches(candidate.name.value()));
        let raw = candidates.any(|candidate| {
            self.values
                .iter()
                .all(|value| self.value_matches(value, &candidate.values))
        });
        apply_not(raw, self.name_not)
    }

    /// A plain expected value needs one matching actual value; a negated one
    /// needs every actual value to stay clear of it.
    fn value_matches(&self, expected: &RegexStringMatcher, actual: &[NottableString]) -> bool {
        if expected.is_not() {
            actual.iter().all(|value| expected.matches(value.value()))
        } else {
            actual.iter().any(|value| expected.matches(value.value()))
        }
    }
}

#[derive(Debug, Clone)]
struct CookieMatcher {
    name: RegexStringMatcher,
    value: RegexStringMatcher,
}

impl CookieMatcher {
    fn compile(cookie: &Cookie) -> Self {
        Self {
            name: RegexStringMatcher::new(cookie.name.clone()),
            value: RegexStringMatcher::new(cookie.value.clone()),
        }
    }

    fn matches(&self, actual: &[Cookie]) -> bool {
        actual.iter().any(|cookie| {
            self.name.matches(cookie.name.value()) && self.value.matches(cookie.value.value())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Body;

    fn request() -> HttpRequest {
        HttpRequest::new()
            .with_method("POST")
            .with_path("/api/users/42")
            .with_query_parameter("page", "1")
            .with_query_parameter("page", "2")
            .with_header("Host", "localhost:8080")
            .with_header("Accept", "application/json")
            .with_cookie("session", "abc123")
            .with_body(Body::string(r#"{"name": "x", "age": 3}"#))
            .with_secure(false)
            .with_keep_alive(true)
    }

    fn matches(pattern: HttpRequest) -> bool {
        HttpRequestMatcher::new(&pattern).matches(&request())
    }

    #[test]
    fn test_empty_pattern_matches_everything() {
        assert!(matches(HttpRequest::new()));
        assert!(HttpRequestMatcher::new(&HttpRequest::new()).matches(&HttpRequest::new()));
    }

    #[test]
    fn test_method_and_path() {
        assert!(matches(HttpRequest::new().with_method("POST").with_path("/api/users/42")));
        assert!(matches(HttpRequest::new().with_path("/api/users/\\d+")));
        assert!(!matches(HttpRequest::new().with_method("GET")));
        assert!(matches(HttpRequest::new().with_method(NottableString::not("GET"))));
        assert!(!matches(HttpRequest::new().with_path("/api/users")));
    }

    #[test]
    fn test_headers_are_case_insensitive_subset() {
        assert!(matches(HttpRequest::new().with_header("host", "localhost:8080")));
        assert!(matches(HttpRequest::new().with_header("ACCEPT", "application/.*")));
        assert!(!matches(HttpRequest::new().with_header("Accept", "text/html")));
        assert!(!matches(HttpRequest::new().with_header("X-Missing", "x")));
    }

    #[test]
    fn test_negated_header_name_requires_absence() {
        let absent = KeyToMultiValue::new(NottableString::not("X-Debug"), Vec::<&str>::new());
        assert!(matches(HttpRequest::new().with_header_entry(absent)));
        let present = KeyToMultiValue::new(NottableString::not("Accept"), Vec::<&str>::new());
        assert!(!matches(HttpRequest::new().with_header_entry(present)));
    }

    #[test]
    fn test_negated_header_value() {
        let entry = KeyToMultiValue::new("Accept", [NottableString::not("text/html")]);
        assert!(matches(HttpRequest::new().with_header_entry(entry)));
        let entry = KeyToMultiValue::new("Accept", [NottableString::not("application/json")]);
        assert!(!matches(HttpRequest::new().with_header_entry(entry)));
    }

    #[test]
    fn test_query_parameters() {
        assert!(matches(HttpRequest::new().with_query_parameter("page", "2")));
        assert!(!matches(HttpRequest::new().with_query_parameter("page", "3")));
        assert!(!matches(HttpRequest::new().with_query_parameter("PAGE", "1")));
    }

    #[test]
    fn test_cookies() {
        assert!(matches(HttpRequest::new().with_cookie("session", "abc.*")));
        assert!(!matches(HttpRequest::new().with_cookie("session", "other")));
        assert!(matches(HttpRequest::new().with_cookie("session", NottableString::not("other"))));
    }

    #[test]
    fn test_body() {
        assert!(matches(HttpRequest::new().with_body(Body::json(r#"{"name": "x"}"#))));
        assert!(!matches(HttpRequest::new().with_body(Body::json(r#"{"name": "y"}"#))));
    }

    #[test]
    fn test_flags() {
        assert!(matches(HttpRequest::new().with_secure(false)));
        assert!(!matches(HttpRequest::new().with_secure(true)));
        assert!(matches(HttpRequest::new().with_keep_alive(true)));
        let secure_only = HttpRequestMatcher::new(&HttpRequest::new().with_secure(true));
        assert!(!secure_only.matches(&HttpRequest::new()));
    }
}
