//! # End-to-End Scenarios
//!
//! Each module drives the full router (tracing, timeout, handler,
//! aggregator, assembler) with scripted backends and paused time, so
//! elapsed-time assertions are exact.

pub mod concurrency;
pub mod validation;
