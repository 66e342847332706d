//! HTTP response model.

use super::body::Body;
use super::key_values::{self, Cookie, Header};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<Cookie>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

impl HttpResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty 404, used when the pipeline produces no response.
    pub fn not_found() -> Self {
        Self::new().with_status_code(404)
    }

    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        key_values::add_value(&mut self.headers, name, value, true);
        self
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push(Cookie::new(name, value));
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn status(&self) -> u16 {
        self.status_code.unwrap_or(200)
    }

    pub fn first_header(&self, name: &str) -> Option<&str> {
        key_values::first_value(&self.headers, name, true)
    }

    pub fn remove_header(&mut self, name: &str) {
        key_values::remove(&mut self.headers, name, true);
    }
}
