//! Requests addressed to an upstream host.

use super::request::HttpRequest;
use crate::error::{ProxyError, Result};

/// A request plus the upstream it is sent to.
///
/// The target comes from the `Host` header; without an explicit port it is
/// 443 for secure requests and 80 otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundHttpRequest {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub request: HttpRequest,
}

impl OutboundHttpRequest {
    pub fn new(host: impl Into<String>, port: u16, secure: bool, request: HttpRequest) -> Self {
        Self {
            host: host.into(),
            port,
            secure,
            request,
        }
    }

    /// Address `request` using its `Host` header.
    pub fn from_request(request: HttpRequest) -> Result<Self> {
        let host_header = request
            .first_header("host")
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(ProxyError::MissingHost)?;
        let secure = request.is_secure();
        let default_port = if secure { 443 } else { 80 };
        let (host, port) = split_host_port(host_header, default_port)?;
        Ok(Self::new(host, port, secure, request))
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    pub fn uri(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.scheme(),
            self.host,
            self.port,
            self.request.path_and_query()
        )
    }
}

fn split_host_port(value: &str, default_port: u16) -> Result<(String, u16)> {
    let invalid = || ProxyError::InvalidHost(value.to_string());

    // [::1]:8080
    if let Some(rest) = value.strip_prefix('[') {
        let (address, after) = rest.split_once(']').ok_or_else(invalid)?;
        let host = format!("[{address}]");
        return match after.strip_prefix(':') {
            Some(port) => Ok((host, port.parse().map_err(|_| invalid())?)),
            None if after.is_empty() => Ok((host, default_port)),
            None => Err(invalid()),
        };
    }

    match value.split_once(':') {
        Some((host, port)) if !host.is_empty() => {
            Ok((host.to_string(), port.parse().map_err(|_| invalid())?))
        }
        Some(_) => Err(invalid()),
        None => Ok((value.to_string(), default_port)),
    }
}
