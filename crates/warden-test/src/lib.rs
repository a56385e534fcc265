//! Warden Test - Shared test utilities.
//!
//! Mock engines, failure-injecting storage, and fixtures for building
//! engine events and ready-to-use runtimes.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! warden-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use warden_test::{ActionBuilder, test_agent, test_warden};
//!
//! #[tokio::test]
//! async fn test_approve() {
//!     let (warden, engine) = test_warden().await;
//!     let event = ActionBuilder::new("t-1", "a-1").write("knowledge/x.md", "hello").event();
//!     warden.observe(event).await.unwrap();
//!     assert_eq!(engine.call_count(), 0);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;

/// Install a test-friendly subscriber honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
