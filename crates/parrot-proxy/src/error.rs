//! Errors surfaced by a single proxy cycle or control request.
//!
//! None of these abort the server: each is turned into a response for the
//! request that caused it and logged at the boundary.

use hyper::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Host header is required to forward a request")]
    MissingHost,
    #[error("Invalid Host header: {0}")]
    InvalidHost(String),
    #[error("Invalid request payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("Invalid outbound request: {0}")]
    InvalidOutbound(String),
    #[error("Upstream request failed: {0}")]
    Upstream(String),
    #[error("Failed to read body: {0}")]
    Body(#[from] hyper::Error),
}

impl ProxyError {
    /// Status returned to the caller. Every variant is scoped to the one
    /// request that caused it, so all of them are a 400.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_errors_are_bad_request() {
        assert_eq!(ProxyError::MissingHost.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ProxyError::Upstream("connection refused".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        let payload = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(ProxyError::from(payload).status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ProxyError::InvalidHost("a:b".into()).to_string(),
            "Invalid Host header: a:b"
        );
    }
}
