//! Structured logging for the early hints edge worker.
//!
//! This crate provides:
//! - `StructuredLogger` - Level-filtered logger with JSON/human output
//! - `LogEntry` - Structured log record
//! - `LogBuilder` - Fluent API for entries with fields

mod logging;

pub use logging::*;
