//! TTL-gated single-entry cache for the origin's link header.
//!
//! This crate provides:
//! - `CacheEntry` - The sole stateful entity: last fetched value + expiry
//! - `LinkHeaderCache` - Refresh-on-expiry cache around one entry
//!
//! One `LinkHeaderCache` lives per execution context. It is not shared
//! across contexts or persisted; a fresh context starts with an expired,
//! empty entry so the first request always attempts a fetch.
//!
//! # Example
//!
//! ```ignore
//! use hints_cache::LinkHeaderCache;
//! use hints_core::HintsConfig;
//!
//! let cache = LinkHeaderCache::new(HintsConfig::fixed_upstream("https://origin.example/"));
//! let link = cache.get_link_header(&client, now_ms, "https://origin.example/", None).await;
//! ```

mod cache;
mod entry;

pub use cache::*;
pub use entry::*;
