//! Outbound call contract for refresh fetches.

use std::time::Duration;

use async_trait::async_trait;
use http::header::HeaderMap;

use crate::error::FetchError;

/// Options for one outbound refresh call.
///
/// Immutable once built; the cache constructs a fresh set per refresh
/// attempt so the credential header tracks the triggering request.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Headers sent on the refresh call, in insertion order.
    pub headers: Vec<(String, String)>,
    /// Upper bound on the whole call.
    pub timeout: Duration,
}

impl FetchOptions {
    /// Create options with the given timeout and no headers.
    pub fn new(timeout: Duration) -> Self {
        Self {
            headers: Vec::new(),
            timeout,
        }
    }

    /// Append a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Render headers as `name=value` pairs for log fields.
    pub fn describe_headers(&self) -> String {
        self.headers
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Response to an outbound refresh call.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    status: u16,
    headers: HeaderMap,
}

impl FetchResponse {
    /// Create a response from a status code and header map.
    pub fn new(status: u16, headers: HeaderMap) -> Self {
        Self { status, headers }
    }

    /// The HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Whether the status is in the 2xx range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// All values of a header, in wire order, or `None` when absent.
    pub fn header(&self, name: &str) -> Option<Vec<String>> {
        let values: Vec<String> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }
}

/// Capability to perform an outbound HTTP call.
///
/// Implemented by the platform integration (Spin on WASM) and by test
/// doubles. `?Send` because the WASM host is single-threaded.
#[async_trait(?Send)]
pub trait OutboundClient {
    /// Issue one call to `url` with the given options.
    async fn send(&self, url: &str, options: &FetchOptions) -> Result<FetchResponse, FetchError>;
}
