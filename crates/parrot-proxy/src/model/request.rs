//! HTTP request model.
//!
//! The same struct is used for concrete requests (decoded off the wire) and
//! for request patterns (filter registrations, log queries, verifications).
//! In a pattern, every unset field is a wildcard.

use super::body::Body;
use super::key_values::{self, Cookie, Header, KeyToMultiValue, Parameter};
use super::nottable::NottableString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    #[serde(default, skip_serializing_if = "NottableString::is_unset")]
    pub method: NottableString,
    #[serde(default, skip_serializing_if = "NottableString::is_unset")]
    pub path: NottableString,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_string_parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<Cookie>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<bool>,
}

impl HttpRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a request from JSON, accepting an `{"httpRequest": {...}}` wrapper.
    ///
    /// Blank input yields `None`, meaning "no pattern".
    pub fn from_json(json: &str) -> Result<Option<Self>, serde_json::Error> {
        if json.trim().is_empty() {
            return Ok(None);
        }
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(inner) = value.get_mut("httpRequest") {
            value = inner.take();
        }
        serde_json::from_value(value).map(Some)
    }

    pub fn with_method(mut self, method: impl Into<NottableString>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<NottableString>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_query_parameter(mut self, name: &str, value: &str) -> Self {
        key_values::add_value(&mut self.query_string_parameters, name, value, false);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        key_values::add_value(&mut self.headers, name, value, true);
        self
    }

    /// Add a header entry as-is, keeping negation on name and values.
    pub fn with_header_entry(mut self, header: KeyToMultiValue) -> Self {
        self.headers.push(header);
        self
    }

    pub fn with_cookie(
        mut self,
        name: impl Into<NottableString>,
        value: impl Into<NottableString>,
    ) -> Self {
        self.cookies.push(Cookie::new(name, value));
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    pub fn method_str(&self) -> &str {
        self.method.value().unwrap_or("GET")
    }

    pub fn path_str(&self) -> &str {
        self.path.value().unwrap_or("/")
    }

    /// First value of a header, by case-insensitive name.
    pub fn first_header(&self, name: &str) -> Option<&str> {
        key_values::first_value(&self.headers, name, true)
    }

    pub fn remove_header(&mut self, name: &str) {
        key_values::remove(&mut self.headers, name, true);
    }

    pub fn is_secure(&self) -> bool {
        self.secure.unwrap_or(false)
    }

    /// The decoded path with each segment percent-encoded again.
    pub fn encoded_path(&self) -> String {
        self.path_str()
            .split('/')
            .map(urlencoding::encode)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// `path?query` as written onto the wire.
    pub fn path_and_query(&self) -> String {
        if self.query_string_parameters.is_empty() {
            self.encoded_path()
        } else {
            format!(
                "{}?{}",
                self.encoded_path(),
                key_values::to_form_urlencoded(&self.query_string_parameters)
            )
        }
    }
}
