//! Core abstractions for the early hints edge worker.
//!
//! This crate provides the fundamental types and traits:
//! - `HintsConfig` - Deployment configuration for the hint fetch
//! - `ClientRequest` trait - Inbound request interface
//! - `OutboundClient` trait - Outbound call capability
//! - `FetchOptions` / `FetchResponse` - Outbound call contract
//! - `FetchError` - Outbound failure taxonomy
//! - `bounded` - Deadline bound for the refresh call

mod config;
mod error;
mod outbound;
mod request;
mod timeout;

pub use config::*;
pub use error::*;
pub use outbound::*;
pub use request::*;
pub use timeout::*;
