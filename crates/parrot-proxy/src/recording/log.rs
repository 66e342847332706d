//! The request log: every completed proxy cycle, in arrival order.

use super::dump::{self, DumpFormat};
use crate::metrics;
use crate::model::{HttpRequest, HttpResponse, Verification, VerificationSequence};
use crate::predicate::HttpRequestMatcher;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

/// One proxied request and the response returned to the caller.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub request: HttpRequest,
    pub response: HttpResponse,
    pub timestamp: DateTime<Utc>,
}

/// Append-only log of proxied exchanges.
///
/// Appends and clears take the write lock; every reader works on a snapshot
/// taken under the read lock, so matching never holds the lock and never
/// observes a half-applied mutation.
#[derive(Debug, Default)]
pub struct RequestLog {
    entries: RwLock<Vec<LogEntry>>,
}

impl RequestLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, request: HttpRequest, response: HttpResponse) {
        let mut entries = self.entries.write();
        entries.push(LogEntry {
            request,
            response,
            timestamp: Utc::now(),
        });
        metrics::set_log_entries(entries.len());
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of the log at this instant.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.read().clone()
    }

    /// Logged requests matching `pattern` (all of them for `None`), oldest first.
    pub fn retrieve(&self, pattern: Option<&HttpRequest>) -> Vec<HttpRequest> {
        let matcher = pattern.map(HttpRequestMatcher::new);
        self.snapshot()
            .into_iter()
            .filter(|entry| matcher.as_ref().map_or(true, |m| m.matches(&entry.request)))
            .map(|entry| entry.request)
            .collect()
    }

    /// Remove every entry whose request matches `pattern`; `None` removes all.
    pub fn clear(&self, pattern: Option<&HttpRequest>) {
        let Some(pattern) = pattern else {
            self.reset();
            return;
        };
        let matcher = HttpRequestMatcher::new(pattern);
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|entry| !matcher.matches(&entry.request));
        info!("Cleared {} of {} logged requests", before - entries.len(), before);
        metrics::set_log_entries(entries.len());
    }

    pub fn reset(&self) {
        let mut entries = self.entries.write();
        info!("Reset request log ({} entries)", entries.len());
        entries.clear();
        metrics::set_log_entries(0);
    }

    /// Check how many logged requests match. Returns an empty string when the
    /// count is within bounds, otherwise a description of the mismatch.
    pub fn verify(&self, verification: &Verification) -> String {
        let requests: Vec<HttpRequest> = self
            .snapshot()
            .into_iter()
            .map(|entry| entry.request)
            .collect();
        let matcher = HttpRequestMatcher::new(&verification.http_request);
        let count = requests.iter().filter(|request| matcher.matches(request)).count();

        let passed = verification.times.matches(count);
        metrics::record_verification("count", passed);
        if passed {
            debug!("Verification passed: {} matching requests", count);
            return String::new();
        }
        format!(
            "Request not found {}, found {} {}, expected:<{}> but was:<{}>",
            verification.times,
            count,
            if count == 1 { "time" } else { "times" },
            to_json(&verification.http_request),
            to_json(&requests)
        )
    }

    /// Check that the requests appear in this order, not necessarily
    /// adjacent. Each logged request satisfies at most one element and the
    /// scan only moves forward. Returns an empty string on success.
    pub fn verify_sequence(&self, sequence: &VerificationSequence) -> String {
        let requests: Vec<HttpRequest> = self
            .snapshot()
            .into_iter()
            .map(|entry| entry.request)
            .collect();
        let mut next = 0;
        for (position, expected) in sequence.http_requests.iter().enumerate() {
            let matcher = HttpRequestMatcher::new(expected);
            match requests[next..].iter().position(|request| matcher.matches(request)) {
                Some(offset) => next += offset + 1,
                None => {
                    metrics::record_verification("sequence", false);
                    return format!(
                        "Request sequence not found, first unmatched request at position {}, expected:<{}> but was:<{}>",
                        position,
                        to_json(expected),
                        to_json(&requests)
                    );
                }
            }
        }
        metrics::record_verification("sequence", true);
        String::new()
    }

    /// Write each matching exchange to the log at info level.
    pub fn dump_to_log(&self, pattern: Option<&HttpRequest>, format: DumpFormat) -> usize {
        let matcher = pattern.map(HttpRequestMatcher::new);
        let mut dumped = 0;
        for entry in self.snapshot() {
            if matcher.as_ref().map_or(true, |m| m.matches(&entry.request)) {
                info!("{}", dump::render(format, &entry.request, &entry.response));
                dumped += 1;
            }
        }
        dumped
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}
