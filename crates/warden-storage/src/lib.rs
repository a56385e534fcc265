//! Warden Storage - Namespaced key-value persistence.
//!
//! Both durable Warden stores (the approval ledger and the per-agent memory
//! store) sit on top of the [`KvStore`] trait defined here:
//!
//! - [`MemoryKvStore`]: always available, for tests and ephemeral runs
//! - `SurrealKvStore`: persistent embedded store (requires the `kv` feature)
//!
//! Consumers normally hold a [`ScopedKvStore`], which pre-binds a namespace
//! and adds JSON helpers.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
pub mod kv;

pub use error::{StorageError, StorageResult};
#[cfg(feature = "kv")]
pub use kv::SurrealKvStore;
pub use kv::{KvStore, MemoryKvStore, ScopedKvStore};
