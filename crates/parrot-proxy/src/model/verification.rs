//! Verification requests accepted by `/verify` and `/verifySequence`.

use super::request::HttpRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many times a request must appear: `at_least..=at_most`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationTimes {
    #[serde(default)]
    pub at_least: u32,
    /// `None` means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_most: Option<u32>,
}

impl VerificationTimes {
    pub fn once() -> Self {
        Self::exactly(1)
    }

    pub fn exactly(count: u32) -> Self {
        Self {
            at_least: count,
            at_most: Some(count),
        }
    }

    pub fn at_least(count: u32) -> Self {
        Self {
            at_least: count,
            at_most: None,
        }
    }

    pub fn at_most(count: u32) -> Self {
        Self {
            at_least: 0,
            at_most: Some(count),
        }
    }

    pub fn matches(&self, count: usize) -> bool {
        let count = u64::try_from(count).unwrap_or(u64::MAX);
        count >= u64::from(self.at_least)
            && self.at_most.map_or(true, |at_most| count <= u64::from(at_most))
    }
}

impl Default for VerificationTimes {
    fn default() -> Self {
        Self::once()
    }
}

impl fmt::Display for VerificationTimes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.at_least, self.at_most) {
            (1, Some(1)) => write!(f, "exactly once"),
            (n, Some(m)) if n == m => write!(f, "exactly {n} times"),
            (0, Some(m)) => write!(f, "at most {m} times"),
            (1, None) => write!(f, "at least once"),
            (n, None) => write!(f, "at least {n} times"),
            (n, Some(m)) => write!(f, "between {n} and {m} times"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    #[serde(default)]
    pub http_request: HttpRequest,
    #[serde(default)]
    pub times: VerificationTimes,
}

impl Verification {
    pub fn new(http_request: HttpRequest, times: VerificationTimes) -> Self {
        Self { http_request, times }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSequence {
    #[serde(default)]
    pub http_requests: Vec<HttpRequest>,
}

impl VerificationSequence {
    pub fn new(http_requests: Vec<HttpRequest>) -> Self {
        Self { http_requests }
    }
}
