//! Enrich Testing Infrastructure
//!
//! Shared fixtures for pipeline tests: feeds and comment threads built on
//! [`enrich_core::MemoryTree`], page markup builders, a scripted
//! [`PageSource`](enrich_pipeline::PageSource), modules that count, fail or
//! over-hide, and proptest strategies.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! enrich-testkit = { path = "../enrich-testkit" }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod mocks;
pub mod strategies;

pub use fixtures::*;
pub use mocks::*;

/// Install a test subscriber honouring `RUST_LOG`; repeated calls are no-ops
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
