//! TTL-gated refresh around the single cache entry.

use std::cell::RefCell;

use hints_core::{header, FetchOptions, HintsConfig, OutboundClient};
use hints_observability::{LogLevel, StructuredLogger};

use crate::entry::CacheEntry;

/// Single-entry link header cache with refresh-on-expiry.
///
/// `get_link_header` may be called many times per second; it issues at most
/// one outbound call per caller that observes an expired entry, and none at
/// all while the entry is fresh.
///
/// Intentionally unsynchronized: concurrent requests that all observe an
/// expired entry each issue their own refresh, and the last completed
/// response wins. All responses come from the same logical source and go
/// stale together, so any of them is acceptable. The `RefCell` borrow is
/// never held across the outbound await.
pub struct LinkHeaderCache {
    entry: RefCell<CacheEntry>,
    config: HintsConfig,
    logger: StructuredLogger,
}

impl LinkHeaderCache {
    /// Create a cache with an expired, empty entry.
    pub fn new(config: HintsConfig) -> Self {
        Self {
            entry: RefCell::new(CacheEntry::new()),
            config,
            logger: StructuredLogger::new()
                .with_component("hints-cache")
                .with_min_level(LogLevel::Debug),
        }
    }

    /// Replace the logger (for alternate formats or levels).
    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    /// The deployment configuration this cache was built with.
    pub fn config(&self) -> &HintsConfig {
        &self.config
    }

    /// A copy of the current entry, for inspection.
    pub fn snapshot(&self) -> CacheEntry {
        self.entry.borrow().clone()
    }

    /// Return the best available link header at `now` (ms), refreshing from
    /// `target` first when the entry has expired.
    ///
    /// `forwarded_auth` is the credential header of the triggering request;
    /// when present it is forwarded on the refresh call, when absent the
    /// refresh call carries no credential header at all.
    ///
    /// Returns `None` only when no value was ever successfully fetched. A
    /// failed refresh leaves the entry untouched and serves the stale value.
    pub async fn get_link_header<C: OutboundClient + ?Sized>(
        &self,
        client: &C,
        now: u64,
        target: &str,
        forwarded_auth: Option<&str>,
    ) -> Option<String> {
        let expired = !self.entry.borrow().is_fresh(now);
        if expired {
            self.refresh(client, now, target, forwarded_auth).await;
        }

        let entry = self.entry.borrow();
        if entry.is_populated() {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// Issue exactly one outbound call and update the entry on success.
    ///
    /// Any failure leaves the entry untouched; the next expired request is
    /// the retry.
    async fn refresh<C: OutboundClient + ?Sized>(
        &self,
        client: &C,
        now: u64,
        target: &str,
        forwarded_auth: Option<&str>,
    ) {
        let mut options = FetchOptions::new(self.config.fetch_timeout)
            .with_header(&self.config.marker_name, &self.config.marker_value);
        if let Some(auth) = forwarded_auth {
            options = options.with_header(header::AUTHORIZATION, auth);
        }

        match client.send(target, &options).await {
            Ok(response) => {
                let link = response.header(header::LINK).map(|values| values.join(","));

                match link {
                    Some(link) if response.ok() && !link.is_empty() => {
                        let mut entry = self.entry.borrow_mut();
                        entry.store(link, now + self.config.ttl_ms());
                        self.logger
                            .debug_builder("fetched link header from origin and updated cache")
                            .field("cache", describe(&entry))
                            .emit();
                    }
                    link => {
                        self.logger
                            .error_builder("failed to fetch link header from origin")
                            .field_u64("status", u64::from(response.status()))
                            .field("options", options.describe_headers())
                            .field("link", link.unwrap_or_default())
                            .field("cache", describe(&self.entry.borrow()))
                            .emit();
                    }
                }
            }
            Err(err) => {
                self.logger
                    .error_builder("error fetching link header from origin")
                    .field("error", err.to_string())
                    .field("target", target)
                    .emit();
            }
        }
    }
}

fn describe(entry: &CacheEntry) -> String {
    serde_json::to_string(entry).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    use async_trait::async_trait;
    use futures::executor::block_on;
    use http::header::{HeaderMap, HeaderValue};

    use hints_core::{FetchError, FetchResponse, UpstreamMode};

    const TARGET: &str = "https://origin.example/";

    /// Scripted outbound client recording every call it receives.
    struct MockClient {
        responses: RefCell<VecDeque<Result<FetchResponse, FetchError>>>,
        calls: RefCell<Vec<(String, FetchOptions)>>,
    }

    impl MockClient {
        fn new() -> Self {
            Self {
                responses: RefCell::new(VecDeque::new()),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn push_response(&self, status: u16, link_values: &[&str]) {
            let mut headers = HeaderMap::new();
            for value in link_values {
                headers.append(
                    "link",
                    HeaderValue::from_str(value).expect("valid header value"),
                );
            }
            self.responses
                .borrow_mut()
                .push_back(Ok(FetchResponse::new(status, headers)));
        }

        fn push_error(&self, err: FetchError) {
            self.responses.borrow_mut().push_back(Err(err));
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        fn last_options(&self) -> FetchOptions {
            self.calls
                .borrow()
                .last()
                .expect("at least one call")
                .1
                .clone()
        }
    }

    #[async_trait(?Send)]
    impl OutboundClient for MockClient {
        async fn send(
            &self,
            url: &str,
            options: &FetchOptions,
        ) -> Result<FetchResponse, FetchError> {
            self.calls
                .borrow_mut()
                .push((url.to_string(), options.clone()));
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Request("no scripted response".to_string())))
        }
    }

    fn cache() -> LinkHeaderCache {
        LinkHeaderCache::new(HintsConfig::fixed_upstream(TARGET))
    }

    #[test]
    fn test_first_call_fetches_and_populates() {
        let client = MockClient::new();
        client.push_response(200, &["</a>; rel=preload"]);
        let cache = cache();

        let link = block_on(cache.get_link_header(&client, 0, TARGET, None));

        assert_eq!(link.as_deref(), Some("</a>; rel=preload"));
        assert_eq!(client.call_count(), 1);
        let entry = cache.snapshot();
        assert_eq!(entry.value, "</a>; rel=preload");
        assert_eq!(entry.expires_at, 30_000);
    }

    #[test]
    fn test_fresh_entry_skips_fetch() {
        let client = MockClient::new();
        client.push_response(200, &["</a>; rel=preload"]);
        let cache = cache();

        block_on(cache.get_link_header(&client, 0, TARGET, None));
        let link = block_on(cache.get_link_header(&client, 29_999, TARGET, None));

        assert_eq!(link.as_deref(), Some("</a>; rel=preload"));
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_expired_entry_triggers_fetch() {
        let client = MockClient::new();
        client.push_response(200, &["</a>; rel=preload"]);
        client.push_response(200, &["</b>; rel=preload"]);
        let cache = cache();

        block_on(cache.get_link_header(&client, 0, TARGET, None));
        let link = block_on(cache.get_link_header(&client, 30_001, TARGET, None));

        assert_eq!(link.as_deref(), Some("</b>; rel=preload"));
        assert_eq!(client.call_count(), 2);
        assert_eq!(cache.snapshot().expires_at, 60_001);
    }

    #[test]
    fn test_stale_value_served_on_transport_failure() {
        let client = MockClient::new();
        client.push_response(200, &["</a>; rel=preload"]);
        client.push_error(FetchError::Timeout(Duration::from_millis(500)));
        let cache = cache();

        block_on(cache.get_link_header(&client, 0, TARGET, None));
        let before = cache.snapshot();
        let link = block_on(cache.get_link_header(&client, 31_000, TARGET, None));

        assert_eq!(link.as_deref(), Some("</a>; rel=preload"));
        assert_eq!(cache.snapshot(), before);
    }

    #[test]
    fn test_stale_value_served_on_error_status() {
        let client = MockClient::new();
        client.push_response(200, &["</a>; rel=preload"]);
        client.push_response(502, &[]);
        let cache = cache();

        block_on(cache.get_link_header(&client, 0, TARGET, None));
        let link = block_on(cache.get_link_header(&client, 31_000, TARGET, None));

        assert_eq!(link.as_deref(), Some("</a>; rel=preload"));
        assert_eq!(cache.snapshot().expires_at, 30_000);
    }

    #[test]
    fn test_ok_response_without_link_header_keeps_entry() {
        let client = MockClient::new();
        client.push_response(200, &["</a>; rel=preload"]);
        client.push_response(200, &[]);
        let cache = cache();

        block_on(cache.get_link_header(&client, 0, TARGET, None));
        let link = block_on(cache.get_link_header(&client, 31_000, TARGET, None));

        assert_eq!(link.as_deref(), Some("</a>; rel=preload"));
        assert_eq!(cache.snapshot().expires_at, 30_000);
    }

    #[test]
    fn test_multi_value_link_header_joined_in_order() {
        let client = MockClient::new();
        client.push_response(200, &["</a>; rel=preload", "</b>; rel=preload"]);
        let cache = cache();

        let link = block_on(cache.get_link_header(&client, 0, TARGET, None));

        assert_eq!(
            link.as_deref(),
            Some("</a>; rel=preload,</b>; rel=preload")
        );
    }

    #[test]
    fn test_empty_before_first_successful_fetch() {
        let client = MockClient::new();
        client.push_error(FetchError::Connection("refused".to_string()));
        let cache = cache();

        let link = block_on(cache.get_link_header(&client, 0, TARGET, None));

        assert_eq!(link, None);
        assert!(!cache.snapshot().is_populated());
    }

    #[test]
    fn test_marker_header_always_sent() {
        let client = MockClient::new();
        client.push_response(200, &["</a>; rel=preload"]);
        let cache = cache();

        block_on(cache.get_link_header(&client, 0, TARGET, None));

        let options = client.last_options();
        assert_eq!(options.header("earlyhints"), Some("get_my_link_header"));
        assert_eq!(options.timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_credential_forwarded_when_present() {
        let client = MockClient::new();
        client.push_response(200, &["</a>; rel=preload"]);
        let cache = cache();

        block_on(cache.get_link_header(&client, 0, TARGET, Some("Bearer abc")));

        assert_eq!(
            client.last_options().header("authorization"),
            Some("Bearer abc")
        );
    }

    #[test]
    fn test_credential_omitted_when_absent() {
        let client = MockClient::new();
        client.push_response(200, &["</a>; rel=preload"]);
        let cache = cache();

        block_on(cache.get_link_header(&client, 0, TARGET, None));

        assert_eq!(client.last_options().header("authorization"), None);
    }

    #[test]
    fn test_custom_ttl_and_marker() {
        let config = HintsConfig::fixed_upstream(TARGET)
            .with_ttl(Duration::from_secs(60))
            .with_marker("x-hint-fetch", "1");
        let client = MockClient::new();
        client.push_response(200, &["</a>; rel=preload"]);
        let cache = LinkHeaderCache::new(config);

        block_on(cache.get_link_header(&client, 1_000, TARGET, None));

        assert_eq!(cache.snapshot().expires_at, 61_000);
        assert_eq!(client.last_options().header("x-hint-fetch"), Some("1"));
    }

    #[test]
    fn test_request_url_mode_resolves_to_caller_url() {
        let config = HintsConfig::request_url();
        assert!(matches!(config.upstream, UpstreamMode::RequestUrl));
        assert_eq!(
            config.resolve_target("https://edge.example/page"),
            "https://edge.example/page"
        );
    }

    // Populate at t=0, serve from cache at t=1000, survive a failing
    // refresh at t=31000.
    #[test]
    fn test_populate_then_cache_then_stale_on_failure() {
        let client = MockClient::new();
        client.push_response(200, &["</a>; rel=preload"]);
        client.push_error(FetchError::Timeout(Duration::from_millis(500)));
        let cache = cache();

        let first = block_on(cache.get_link_header(&client, 0, TARGET, None));
        assert_eq!(first.as_deref(), Some("</a>; rel=preload"));
        assert_eq!(cache.snapshot().expires_at, 30_000);

        let second = block_on(cache.get_link_header(&client, 1_000, TARGET, None));
        assert_eq!(second.as_deref(), Some("</a>; rel=preload"));
        assert_eq!(client.call_count(), 1);

        let third = block_on(cache.get_link_header(&client, 31_000, TARGET, None));
        assert_eq!(third.as_deref(), Some("</a>; rel=preload"));
        assert_eq!(client.call_count(), 2);
        assert_eq!(cache.snapshot().expires_at, 30_000);
    }
}
