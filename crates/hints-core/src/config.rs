//! Deployment configuration for the hint fetch.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the refresh call is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "url", rename_all = "lowercase")]
pub enum UpstreamMode {
    /// A fixed origin URL, the same for every inbound request.
    Fixed(String),
    /// The inbound request's own URL (the delivery layer distinguishes the
    /// refresh call by its marker header).
    RequestUrl,
}

/// Configuration for the link-header cache and its refresh calls.
///
/// One instance per execution context, created alongside the cache. The
/// variable name must match the one configured in the delivery layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintsConfig {
    /// Name of the output variable set on the inbound request.
    pub variable_name: String,
    /// Header name used to tag internal refresh calls.
    pub marker_name: String,
    /// Header value used to tag internal refresh calls.
    pub marker_value: String,
    /// How long a fetched link header stays fresh.
    pub ttl: Duration,
    /// Upper bound on the refresh call.
    pub fetch_timeout: Duration,
    /// Target of the refresh call.
    pub upstream: UpstreamMode,
}

impl Default for HintsConfig {
    fn default() -> Self {
        Self {
            variable_name: "PMUSER_PAGE_TYPE".to_string(),
            marker_name: "earlyhints".to_string(),
            marker_value: "get_my_link_header".to_string(),
            ttl: Duration::from_millis(30_000),
            fetch_timeout: Duration::from_millis(500),
            upstream: UpstreamMode::RequestUrl,
        }
    }
}

impl HintsConfig {
    /// Create a configuration targeting a fixed upstream URL.
    pub fn fixed_upstream(url: impl Into<String>) -> Self {
        Self {
            upstream: UpstreamMode::Fixed(url.into()),
            ..Default::default()
        }
    }

    /// Create a configuration targeting the inbound request's own URL.
    pub fn request_url() -> Self {
        Self::default()
    }

    /// Set the output variable name.
    pub fn with_variable_name(mut self, name: impl Into<String>) -> Self {
        self.variable_name = name.into();
        self
    }

    /// Set the marker header used to tag refresh calls.
    pub fn with_marker(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.marker_name = name.into();
        self.marker_value = value.into();
        self
    }

    /// Set the cache TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the refresh call timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// TTL in milliseconds, the unit the cache compares timestamps in.
    pub fn ttl_ms(&self) -> u64 {
        self.ttl.as_millis() as u64
    }

    /// Resolve the refresh target for a given inbound request URL.
    pub fn resolve_target<'a>(&'a self, request_url: &'a str) -> &'a str {
        match &self.upstream {
            UpstreamMode::Fixed(url) => url,
            UpstreamMode::RequestUrl => request_url,
        }
    }
}
