//! Per-request hook serving a cached origin link header for early hints.
//!
//! The early hints behavior runs at the client-request stage, so the link
//! header has to be known before the origin response exists. The hook keeps
//! one [`LinkHeaderCache`] per worker instance and refreshes it from the
//! origin on a TTL basis instead of on every request.
//!
//! `on_client_request` is the whole inbound surface: read the credential
//! header, resolve the refresh target, ask the cache, and publish the result
//! as a request variable for the delivery layer. An outbound failure never
//! fails the client request; the variable just stays unset until a fetch
//! succeeds.

use hints_cache::LinkHeaderCache;
use hints_core::{header, ClientRequest, OutboundClient};

#[cfg(target_arch = "wasm32")]
mod spin;

/// Handle one inbound client request.
///
/// Sets the configured output variable on `request` when a link header is
/// available (fresh or stale); leaves it unset otherwise, so the delivery
/// layer falls back to its own default.
pub async fn on_client_request<R, C>(
    request: &R,
    client: &C,
    cache: &LinkHeaderCache,
    now: u64,
) where
    R: ClientRequest + ?Sized,
    C: OutboundClient + ?Sized,
{
    // First value of the credential header, forwarded as-is.
    let auth = request
        .header(header::AUTHORIZATION)
        .and_then(|values| values.into_iter().next());

    let target = cache.config().resolve_target(request.url());

    if let Some(link) = cache
        .get_link_header(client, now, target, auth.as_deref())
        .await
    {
        request.set_variable(&cache.config().variable_name, &link);
    }
}
