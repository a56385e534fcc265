//! Warden Core - Shared types for the Warden approval runtime.
//!
//! This crate provides the identifiers and value types every other Warden
//! crate speaks in:
//!
//! - [`AgentId`] and [`ThreadId`] scope every request to one conversation
//! - [`ActionId`] names the paused action inside the external engine
//! - [`RequestId`] correlates an approval request with its decision
//! - [`MemoryOperation`] describes what a proposed mutation does
//! - [`Timestamp`] wraps `chrono` for consistent formatting
//!
//! # Example
//!
//! ```
//! use warden_core::{AgentId, MemoryOperation, RequestId};
//!
//! let agent = AgentId::new("support-bot").unwrap();
//! assert_eq!(agent.as_str(), "support-bot");
//!
//! let id = RequestId::new();
//! assert!(id.to_string().starts_with("req:"));
//!
//! assert_eq!(MemoryOperation::Append.to_string(), "append");
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use types::{ActionId, AgentId, MemoryOperation, RequestId, ThreadId, Timestamp};
