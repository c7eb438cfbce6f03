//! # Chat Summary Gateway Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Gateway harness over scripted backends
//! └── integration/      # End-to-end HTTP scenarios
//!     ├── summary.rs    # Full, degraded and failed aggregations
//!     ├── validation.rs # Request validation and method handling
//!     └── concurrency.rs # Parallel runs and cross-run isolation
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p gateway-tests
//! cargo test -p gateway-tests integration::summary
//!
//! # Benchmarks
//! cargo bench -p gateway-tests
//! ```

pub mod fixtures;
pub mod integration;
