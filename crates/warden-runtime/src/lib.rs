//! Warden Runtime - Builds and runs the approval machinery from configuration.
//!
//! This crate provides:
//! - [`Warden`]: one detector, decision handler, ledger, and memory store
//!   sharing a storage backend
//! - [`config_bridge`]: conversion from `warden_config` sections to domain types
//! - Startup recovery: pending requests found in storage pause their threads
//!   again before any new event is observed
//!
//! # Example
//!
//! ```rust,no_run
//! use warden_config::Config;
//! use warden_runtime::{Warden, init_logging};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolved = Config::load(None)?;
//! init_logging(&resolved.config)?;
//!
//! let warden = Warden::from_config(&resolved.config).await?;
//! let _events = warden.subscribe();
//!
//! for request in warden.pending_requests(None).await? {
//!     println!("{} waits on {}", request.id, request.target_path);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config_bridge;
pub mod prelude;

mod error;
mod warden;

pub use error::{RuntimeError, RuntimeResult};
pub use warden::{Warden, init_logging, open_store};
